//! Listing commands.

use super::Context;
use quotesync_core::{CategoryFilter, Quote};

/// Renders one quote the way every command prints it.
pub fn format_quote(quote: &Quote) -> String {
    match &quote.server_id {
        Some(id) => format!("\"{}\" ({}, #{})", quote.text, quote.category, id),
        None => format!("\"{}\" ({})", quote.text, quote.category),
    }
}

/// Prints the quotes passing the category filter.
pub fn run(
    ctx: &Context,
    category: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = category.map(CategoryFilter::from_name).unwrap_or_default();
    let repo = ctx.repository().read();
    let quotes = repo.filter(&filter);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&quotes)?),
        "text" => {
            for quote in &quotes {
                println!("{}", format_quote(quote));
            }
            println!();
            println!("{} quote(s), filter: {}", quotes.len(), filter);
        }
        other => return Err(format!("Unknown format: {other}").into()),
    }
    Ok(())
}

/// Prints the distinct categories in first-seen order.
pub fn categories(ctx: &Context) {
    for category in ctx.repository().read().categories() {
        println!("{category}");
    }
}
