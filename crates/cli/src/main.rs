//! Shopfront CLI - storefront client for the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in; the token is persisted for later commands
//! shop login alice --password correctpw
//!
//! # Browse and fill the cart
//! shop products --search laptop --max 1500
//! shop cart add 7 --quantity 2
//! shop cart show
//!
//! # Place the order
//! shop checkout --shipping "1 Main St" --billing "1 Main St"
//!
//! # Staff tools
//! shop admin status 42 shipped
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` / `register` - Session
//! - `products` / `product` - Catalog
//! - `cart` - Cart contents
//! - `checkout` - Turn the cart into an order
//! - `orders` - Order history
//! - `admin` - Staff tools (administrator role required)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopfront_client::{ClientConfig, Storefront};
use shopfront_core::{OrderId, OrderStatus, ProductCategory, ProductId, UserId};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "shop")]
#[command(author, version, about = "Shopfront storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        username: String,

        #[arg(short, long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Create a customer account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Repeat of the password; defaults to `--password`
        #[arg(long)]
        confirm_password: Option<String>,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,
    },
    /// List products
    Products {
        /// Match against name and description
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        category: Option<ProductCategory>,

        /// Minimum price (inclusive)
        #[arg(long)]
        min: Option<Decimal>,

        /// Maximum price (inclusive)
        #[arg(long)]
        max: Option<Decimal>,
    },
    /// Show one product
    Product { id: ProductId },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for everything in the cart
    Checkout {
        #[arg(long)]
        shipping: String,

        /// Defaults to the shipping address
        #[arg(long)]
        billing: Option<String>,
    },
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Staff tools
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and subtotal
    Show,
    /// Add a product
    Add {
        product: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity; 0 or less removes it
    Update {
        product: ProductId,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove { product: ProductId },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List your orders
    List,
    /// Cancel a pending order
    Cancel { id: OrderId },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List every order
    Orders,
    /// Move an order to a new status
    Status { id: OrderId, status: OrderStatus },
    /// List every account
    Users,
    /// Delete a customer account
    DeleteUser { id: UserId },
    /// Delete a product
    DeleteProduct { id: ProductId },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // No subscriber yet, so this goes through the default fmt layer.
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let _sentry_guard = init_sentry(&config);

    // Quiet by default; notifications are printed, not logged.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopfront_client=warn,shopfront_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let shop = Storefront::new(config, Arc::new(output::ConsoleNotifier))?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::session::login(&shop, &username, &password).await?;
        }
        Commands::Logout => commands::session::logout(&shop),
        Commands::Whoami => commands::session::whoami(&shop),
        Commands::Register {
            username,
            email,
            password,
            confirm_password,
            first_name,
            last_name,
        } => {
            let form = shopfront_client::RegistrationForm {
                username,
                email,
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
                first_name,
                last_name,
            };
            commands::session::register(&shop, &form).await?;
        }
        Commands::Products {
            search,
            category,
            min,
            max,
        } => {
            let filter = shopfront_client::catalog::ProductFilter {
                search,
                category,
                min_price: min,
                max_price: max,
            };
            commands::catalog::list(&shop, &filter).await?;
        }
        Commands::Product { id } => commands::catalog::show(&shop, id).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&shop).await?,
            CartAction::Add { product, quantity } => {
                commands::cart::add(&shop, product, quantity).await?;
            }
            CartAction::Update { product, quantity } => {
                commands::cart::update(&shop, product, quantity).await?;
            }
            CartAction::Remove { product } => commands::cart::remove(&shop, product).await?,
            CartAction::Clear => commands::cart::clear(&shop).await?,
        },
        Commands::Checkout { shipping, billing } => {
            let billing = billing.unwrap_or_else(|| shipping.clone());
            commands::cart::checkout(&shop, &shipping, &billing).await?;
        }
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&shop).await?,
            OrdersAction::Cancel { id } => commands::orders::cancel(&shop, id).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Orders => commands::admin::orders(&shop).await?,
            AdminAction::Status { id, status } => {
                commands::admin::update_status(&shop, id, status).await?;
            }
            AdminAction::Users => commands::admin::users(&shop).await?,
            AdminAction::DeleteUser { id } => commands::admin::delete_user(&shop, id).await?,
            AdminAction::DeleteProduct { id } => {
                commands::admin::delete_product(&shop, id).await?;
            }
        },
    }
    Ok(())
}
