//! Bazaar CLI - shop the marketplace from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (merges the guest cart into the server cart)
//! bz login -e asha@example.com -p secret1
//!
//! # Browse
//! bz categories
//! bz products --category Clothing --query shirt --page 2
//!
//! # Cart (guest cart when signed out, server cart when signed in)
//! bz cart add <product-id> --size M --color Red -q 2
//! bz cart list
//!
//! # Follow notifications until Ctrl+C
//! bz notifications watch --interval 15
//! ```
//!
//! # Environment
//!
//! - `BAZAAR_API_URL` - Base URL of the marketplace backend (required)
//! - `BAZAAR_STATE_FILE` - Where the token and guest cart are kept
//!   (default: `.bazaar-state.json`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;
mod error;
mod output;
mod state;

use commands::Context;
use error::CliError;

#[derive(Parser)]
#[command(name = "bz")]
#[command(author, version, about = "Bazaar marketplace CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and merge the guest cart
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Forget the stored sign-in
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Print the category tree
    Categories,
    /// List products
    Products {
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        subcategory: Option<String>,

        #[arg(long = "third")]
        third_category: Option<String>,

        /// Free-text search
        #[arg(short, long)]
        query: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// List your orders
    Orders,
    /// Read notifications
    Notifications {
        #[command(subcommand)]
        action: NotificationAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and subtotal
    List,
    /// Add a product variant
    Add {
        product_id: String,

        #[arg(short, long, default_value = "")]
        size: String,

        #[arg(short, long, default_value = "")]
        color: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a line
    Remove {
        product_id: String,

        #[arg(short, long, default_value = "")]
        size: String,

        #[arg(short, long, default_value = "")]
        color: String,
    },
    /// Set a line's quantity
    Set {
        product_id: String,

        quantity: u32,

        #[arg(short, long, default_value = "")]
        size: String,

        #[arg(short, long, default_value = "")]
        color: String,
    },
}

#[derive(Subcommand)]
enum NotificationAction {
    /// List notifications, newest first
    List,
    /// Poll for new notifications until Ctrl+C
    Watch {
        /// Seconds between polls
        #[arg(short, long, default_value_t = 30)]
        interval: u64,
    },
    /// Mark every notification read
    ReadAll,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bazaar_cli=info,bazaar_storefront=warn".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut ctx = Context::from_env()?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&mut ctx, &email, &password).await?;
        }
        Commands::Logout => commands::auth::logout(&mut ctx)?,
        Commands::Whoami => commands::auth::whoami(&mut ctx).await?,
        Commands::Categories => commands::catalog::categories(&ctx).await?,
        Commands::Products {
            category,
            subcategory,
            third_category,
            query,
            page,
        } => {
            let filter = commands::catalog::product_filter(
                category,
                subcategory,
                third_category,
                query,
                page,
            );
            commands::catalog::products(&ctx, &filter).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::List => commands::cart::list(&mut ctx).await?,
            CartAction::Add {
                product_id,
                size,
                color,
                quantity,
            } => commands::cart::add(&mut ctx, &product_id, &size, &color, quantity).await?,
            CartAction::Remove {
                product_id,
                size,
                color,
            } => commands::cart::remove(&mut ctx, &product_id, &size, &color).await?,
            CartAction::Set {
                product_id,
                quantity,
                size,
                color,
            } => commands::cart::set(&mut ctx, &product_id, &size, &color, quantity).await?,
        },
        Commands::Orders => commands::orders::list(&mut ctx).await?,
        Commands::Notifications { action } => match action {
            NotificationAction::List => commands::notifications::list(&mut ctx).await?,
            NotificationAction::Watch { interval } => {
                commands::notifications::watch(&mut ctx, interval).await?;
            }
            NotificationAction::ReadAll => commands::notifications::read_all(&mut ctx).await?,
        },
    }
    Ok(())
}
