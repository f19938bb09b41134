//! QuoteSync CLI
//!
//! Command-line quote manager that keeps a local quote list in sync with a
//! remote collection.
//!
//! # Commands
//!
//! - `list` - Print quotes, optionally for one category
//! - `categories` - Print the distinct categories
//! - `show` - Print a random quote
//! - `add` - Add a quote and submit it to the server
//! - `export` / `import` - Move quotes in and out as JSON
//! - `sync` - Run one sync cycle and resolve conflicts
//! - `watch` - Sync periodically until interrupted

mod commands;

use clap::{Parser, Subcommand};
use commands::Context;
use quotesync_sync_engine::{ConflictChoice, SyncConfig, DEFAULT_SERVER_URL};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Quote manager with server sync.
#[derive(Parser)]
#[command(name = "quotesync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the quote store
    #[arg(global = true, short, long, default_value = ".quotesync")]
    data_dir: PathBuf,

    /// Remote collection URL
    #[arg(global = true, long, default_value = DEFAULT_SERVER_URL)]
    server_url: String,

    /// Seconds between sync cycles in `watch`
    #[arg(global = true, long, default_value = "300")]
    interval_secs: u64,

    /// Seconds before a request to the server is abandoned
    #[arg(global = true, long, default_value = "30")]
    timeout_secs: u64,

    /// Forget the last viewed quote before running the command
    #[arg(global = true, long)]
    fresh_session: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print quotes
    List {
        /// Only quotes of this category ("all" for every quote)
        #[arg(short, long)]
        category: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the distinct categories in first-seen order
    Categories,

    /// Print a random quote
    Show {
        /// Pick from this category and remember it as the filter
        #[arg(short, long)]
        category: Option<String>,

        /// Print the last viewed quote instead
        #[arg(short, long, conflicts_with = "category")]
        last: bool,
    },

    /// Add a quote
    Add {
        /// Quote text
        text: String,

        /// Quote category
        category: String,

        /// Store locally without submitting to the server
        #[arg(long)]
        local_only: bool,
    },

    /// Write all quotes as JSON
    Export {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Append quotes from a JSON file
    Import {
        /// JSON file holding an array of quotes
        file: PathBuf,
    },

    /// Run one sync cycle
    Sync {
        /// Resolve every conflict the same way (local, server)
        #[arg(short, long)]
        keep: Option<ConflictChoice>,
    },

    /// Sync periodically until interrupted
    Watch,

    /// Show version information
    Version,
}

impl Cli {
    fn sync_config(&self) -> SyncConfig {
        SyncConfig::new(self.server_url.clone())
            .with_sync_interval(Duration::from_secs(self.interval_secs))
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("QuoteSync CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("QuoteSync Core v{}", quotesync_core::VERSION);
        return Ok(());
    }

    let ctx = Context::open(&cli.data_dir, cli.sync_config(), cli.fresh_session)?;

    match cli.command {
        Commands::List { category, format } => {
            commands::list::run(&ctx, category.as_deref(), &format)?;
        }
        Commands::Categories => commands::list::categories(&ctx),
        Commands::Show { category, last } => {
            if last {
                commands::show::last(&ctx)?;
            } else {
                commands::show::random(&ctx, category.as_deref())?;
            }
        }
        Commands::Add {
            text,
            category,
            local_only,
        } => commands::add::run(&ctx, &text, &category, local_only).await?,
        Commands::Export { output } => commands::transfer::export(&ctx, output.as_deref())?,
        Commands::Import { file } => commands::transfer::import(&ctx, &file)?,
        Commands::Sync { keep } => commands::sync::run(&ctx, keep).await?,
        Commands::Watch => commands::sync::watch(&ctx).await?,
        Commands::Version => {}
    }

    Ok(())
}
