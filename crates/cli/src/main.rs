//! QKart CLI - Database migrations and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! qkart-cli migrate
//!
//! # Load a product catalog into PostgreSQL
//! qkart-cli seed-catalog --file crates/storefront/data/products.json
//!
//! # Check a catalog file without touching the database
//! qkart-cli seed-catalog --file products.json --dry-run
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed-catalog` - Insert or update products from a JSON catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "qkart-cli")]
#[command(author, version, about = "QKart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Insert or update products from a JSON catalog
    SeedCatalog {
        /// Catalog file (JSON array of products)
        #[arg(short, long, default_value = "crates/storefront/data/products.json")]
        file: PathBuf,

        /// Validate the file and report, without writing
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::SeedCatalog { file, dry_run } => {
            commands::seed::catalog(&file, dry_run).await?;
        }
    }
    Ok(())
}
