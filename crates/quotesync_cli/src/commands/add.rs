//! Quote creation.

use super::list::format_quote;
use super::Context;
use quotesync_core::Quote;
use tracing::info;

fn add_local(
    ctx: &Context,
    text: &str,
    category: &str,
) -> Result<Quote, Box<dyn std::error::Error>> {
    let mut repo = ctx.repository().write();
    let quote = repo.add(text, category)?;
    Ok(quote.clone())
}

/// Adds a quote.
///
/// The quote is submitted to the server first and stored once accepted,
/// unless `local_only` is set.
pub async fn run(
    ctx: &Context,
    text: &str,
    category: &str,
    local_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let quote = if local_only {
        add_local(ctx, text, category)?
    } else {
        info!(url = %ctx.sync_config().server_url, "submitting quote");
        ctx.engine()?.publish(text, category).await?
    };

    println!("✓ Added {}", format_quote(&quote));
    Ok(())
}
