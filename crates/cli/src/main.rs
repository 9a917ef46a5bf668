//! Mercadito CLI - catalog checks and delivery quoting from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Price a delivery to an address, quoted at the current hour
//! mercadito-cli quote "Av. Los Incas 456, Nasca"
//!
//! # Price the same delivery as if it were 2am (night surcharge)
//! mercadito-cli quote "Av. Los Incas 456, Nasca" --at 2
//!
//! # List stores with their open-now state
//! mercadito-cli stores
//!
//! # Browse the catalog the way the storefront does
//! mercadito-cli products --category 2 --term pan
//! ```
//!
//! All commands talk to the live services using the same configuration
//! the storefront reads (`CATALOG_API_URL`, `MAPS_API_KEY`, ...).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use mercadito_storefront::backend::DEFAULT_PAGE_SIZE;

mod commands;

#[derive(Parser)]
#[command(name = "mercadito-cli")]
#[command(author, version, about = "Mercadito CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a delivery to a free-text address
    Quote {
        /// Destination address, geocoded within the service region
        address: String,

        /// Local hour (0-23) to quote at; defaults to the current hour
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=23))]
        at: Option<u32>,
    },
    /// List stores with their open-now state
    Stores,
    /// List products, with the storefront's filters
    Products {
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Page size
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u32,

        /// Filter by category id
        #[arg(long)]
        category: Option<i64>,

        /// Filter by search term
        #[arg(long)]
        term: Option<String>,

        /// Filter by store id
        #[arg(long)]
        store: Option<i64>,
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
        Commands::Quote { address, at } => commands::quote::run(&address, at).await?,
        Commands::Stores => commands::stores::run().await?,
        Commands::Products {
            page,
            limit,
            category,
            term,
            store,
        } => commands::products::run(page, limit, category, term, store).await?,
    }
    Ok(())
}
