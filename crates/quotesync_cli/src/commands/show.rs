//! Random quote display.

use super::list::format_quote;
use super::Context;
use quotesync_core::{CategoryFilter, QuoteRepository};
use rand::Rng;

/// Resolves the filter to show from: an explicit category is remembered,
/// otherwise the remembered one is used if it still applies.
fn select_filter(
    repo: &QuoteRepository,
    category: Option<&str>,
) -> Result<CategoryFilter, Box<dyn std::error::Error>> {
    match category {
        Some(name) => {
            let filter = CategoryFilter::from_name(name);
            repo.set_last_filter(&filter)?;
            Ok(filter)
        }
        None => Ok(repo.last_filter()?.unwrap_or_default()),
    }
}

fn pick<R: Rng + ?Sized>(
    repo: &QuoteRepository,
    category: Option<&str>,
    rng: &mut R,
) -> Result<String, Box<dyn std::error::Error>> {
    let filter = select_filter(repo, category)?;
    Ok(match repo.random_quote(&filter, rng)? {
        Some(quote) => format_quote(&quote),
        None => format!("No quotes in category: {filter}"),
    })
}

/// Prints a random quote.
pub fn random(ctx: &Context, category: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let repo = ctx.repository().read();
    println!("{}", pick(&repo, category, &mut rand::thread_rng())?);
    Ok(())
}

/// Prints the last viewed quote.
pub fn last(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    match ctx.repository().read().last_viewed()? {
        Some(quote) => println!("{}", format_quote(&quote)),
        None => println!("No quote viewed yet"),
    }
    Ok(())
}
