//! Vapeshop CLI - Catalog management tools.
//!
//! # Usage
//!
//! ```bash
//! # Check a catalog file without touching the database
//! vs-cli catalog validate crates/storefront/data/catalog.json
//!
//! # Replace the catalog in the Realtime Database with a file
//! vs-cli catalog import crates/storefront/data/catalog.json
//!
//! # Save the live catalog, e.g. to refresh the storefront fallback file
//! vs-cli catalog export crates/storefront/data/catalog.json
//! ```
//!
//! # Environment Variables
//!
//! - `FIREBASE_DATABASE_URL` - Realtime Database root URL (import/export)
//! - `FIREBASE_DATABASE_SECRET` - Database secret, if rules require one

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vs-cli")]
#[command(author, version, about = "Vape shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import, export or validate the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Replace the database catalog with the contents of a JSON file
    Import {
        /// Catalog JSON file
        file: PathBuf,
    },
    /// Write the database catalog to a JSON file
    Export {
        /// Destination file (overwritten)
        file: PathBuf,
    },
    /// Check a catalog JSON file for structural problems
    Validate {
        /// Catalog JSON file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::Import { file } => {
                let db = commands::database_from_env()?;
                commands::catalog::import(&db, &file).await?;
            }
            CatalogAction::Export { file } => {
                let db = commands::database_from_env()?;
                commands::catalog::export(&db, &file).await?;
            }
            CatalogAction::Validate { file } => {
                commands::catalog::validate_file(&file).await?;
            }
        },
    }
    Ok(())
}
