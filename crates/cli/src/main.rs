//! PideAI CLI - Database migrations and cart maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the cart_snapshot table
//! pideai-cli migrate
//!
//! # Print a persisted cart
//! pideai-cli cart show --store store-1 3f0c9a2e-7d1b-4c55-9d8e-1b2a3c4d5e6f
//!
//! # Delete a persisted cart
//! pideai-cli cart clear --store store-1 3f0c9a2e-7d1b-4c55-9d8e-1b2a3c4d5e6f
//!
//! # Check a catalog file for contradictory modifier groups
//! pideai-cli catalog check data/catalog.json
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `cart show` / `cart clear` - Inspect or remove persisted carts
//! - `catalog check` - Validate a JSON catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pideai-cli")]
#[command(author, version, about = "PideAI cart service tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Inspect persisted carts
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Work with catalog files
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the line items stored for a cart
    Show {
        /// Store the cart belongs to
        #[arg(short, long)]
        store: String,

        /// Cart token
        token: String,
    },
    /// Delete the stored cart
    Clear {
        /// Store the cart belongs to
        #[arg(short, long)]
        store: String,

        /// Cart token
        token: String,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Report modifier groups whose bounds cannot be satisfied
    Check {
        /// Path to the catalog JSON file
        path: PathBuf,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Cart { action } => match action {
            CartAction::Show { store, token } => commands::cart::show(&store, &token).await?,
            CartAction::Clear { store, token } => commands::cart::clear(&store, &token).await?,
        },
        Commands::Catalog { action } => match action {
            CatalogAction::Check { path } => commands::catalog::check(&path).await?,
        },
    }
    Ok(())
}
