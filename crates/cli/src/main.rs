//! Clementine CLI - drive the commerce SDK from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (persists the session when CLEMENTINE_CREDENTIALS_PATH is set)
//! clementine login -e user@example.com -p 'hunter2!'
//!
//! # Browse the catalog
//! clementine products
//! clementine products --id 42
//!
//! # Cart
//! clementine cart add --product 42 --quantity 2
//! clementine cart show
//!
//! # Checkout
//! clementine checkout --address 7 --card 3
//!
//! # Orders
//! clementine orders list
//! clementine orders cancel --id 15
//! ```
//!
//! # Environment Variables
//!
//! - `CLEMENTINE_API_BASE_URL` - Backend base URL (required)
//! - `CLEMENTINE_CREDENTIALS_PATH` - Session file location (optional)

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};

use clementine_client::{ApiConfig, CommerceClient};

mod commands;

#[derive(Parser)]
#[command(name = "clementine")]
#[command(author, version, about = "Clementine commerce CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Revoke the session and clear stored credentials
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List products, or show one by ID
    Products {
        /// Product ID to show
        #[arg(long)]
        id: Option<i64>,
    },
    /// Cart operations
    Cart {
        #[command(subcommand)]
        action: commands::shop::CartAction,
    },
    /// Saved address operations
    Address {
        #[command(subcommand)]
        action: commands::shop::AddressAction,
    },
    /// Saved card operations
    Card {
        #[command(subcommand)]
        action: commands::shop::CardAction,
    },
    /// Place an order from the current cart
    Checkout {
        /// Shipping address ID
        #[arg(long)]
        address: String,

        /// Payment card ID
        #[arg(long)]
        card: String,

        /// Free-form order notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Order operations
    Orders {
        #[command(subcommand)]
        action: commands::orders::OrdersAction,
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
    let client = CommerceClient::new(ApiConfig::from_env()?)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&client, &email, &password).await?;
        }
        Commands::Logout => commands::auth::logout(&client).await?,
        Commands::Whoami => commands::auth::whoami(&client).await?,
        Commands::Products { id } => commands::shop::products(&client, id).await?,
        Commands::Cart { action } => commands::shop::cart(&client, action).await?,
        Commands::Address { action } => commands::shop::address(&client, action).await?,
        Commands::Card { action } => commands::shop::card(&client, action).await?,
        Commands::Checkout {
            address,
            card,
            notes,
        } => commands::orders::checkout(&client, &address, &card, notes).await?,
        Commands::Orders { action } => commands::orders::orders(&client, action).await?,
    }
    Ok(())
}
