//! JSON export and import.

use super::Context;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Writes every quote as a pretty-printed JSON array, to `output` or stdout.
pub fn export(ctx: &Context, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let repo = ctx.repository().read();
    let json = repo.export_json()?;

    match output {
        Some(path) => {
            let mut file = fs::File::create(path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            println!("✓ Exported {} quote(s) to {}", repo.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Appends the quotes of a JSON file. The whole file is rejected if any
/// record is invalid.
pub fn import(ctx: &Context, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!("Importing quotes from {:?}", path);
    let raw = fs::read_to_string(path)?;
    let count = ctx.repository().write().import_json(&raw)?;
    println!("✓ Imported {count} quote(s)");
    Ok(())
}
