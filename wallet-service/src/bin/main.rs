use clap::{Parser, Subcommand};
use common::decimal::{self, Quantity};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wallet_service::{WalletService, WalletServiceConfig};

/// Wallet Service CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Set the log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Database URL (defaults to DATABASE_URL)
    #[arg(short, long, global = true)]
    database_url: Option<String>,

    /// Database pool size
    #[arg(short, long, global = true)]
    pool_size: Option<u32>,

    /// Work against a throwaway in-memory store instead of the database
    #[arg(long, global = true)]
    in_memory: bool,

    /// Commands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the balances of a client
    Balances {
        /// Client ID
        client_id: String,
    },
    /// Adjust a balance by the given amounts
    Add {
        /// Client ID
        client_id: String,
        /// Asset ID
        asset: String,
        /// Change of the available amount
        #[arg(allow_hyphen_values = true)]
        amount: Decimal,
        /// Change of the reserved amount
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        reserved: Decimal,
        /// Round both amounts to this many fractional digits first
        #[arg(long)]
        accuracy: Option<u32>,
        /// Round away from zero instead of toward zero
        #[arg(long)]
        round_up: bool,
    },
    /// Overwrite a balance
    Set {
        /// Client ID
        client_id: String,
        /// Asset ID
        asset: String,
        /// Available amount
        #[arg(allow_hyphen_values = true)]
        amount: Decimal,
        /// Reserved amount
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        reserved: Decimal,
    },
    /// Create or upgrade the database schema
    Migrate,
}

fn print_balances(balances: &common::ClientBalanceSet) {
    let mut entries: Vec<_> = balances.iter().collect();
    entries.sort_by(|a, b| a.asset.cmp(&b.asset));

    println!("client {}", balances.client_id());
    for entry in entries {
        println!(
            "  {:<8} available {:>20}  reserved {:>20}",
            entry.asset,
            decimal::round_for_print(entry.available),
            decimal::round_for_print(entry.reserved)
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "wallet_service={level},common={level}",
            level = cli.log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Config from env, overridden by flags
    let mut config = WalletServiceConfig::from_env();
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    if let Some(pool_size) = cli.pool_size {
        config.db_pool_size = pool_size;
    }

    if let Commands::Migrate = cli.command {
        let pool = common::db::init_db_pool(&config.database_url, config.db_pool_size).await?;
        common::db::run_migrations(&pool).await?;
        return Ok(());
    }

    let service = if cli.in_memory {
        info!("Using in-memory balance store");
        WalletService::new()
    } else {
        WalletService::with_config(&config).await?
    };

    match cli.command {
        Commands::Balances { client_id } => {
            print_balances(&service.get_balances(&client_id).await?);
        }
        Commands::Add { client_id, asset, amount, reserved, accuracy, round_up } => {
            let (amount, reserved): (Quantity, Quantity) = match accuracy {
                Some(accuracy) => (
                    decimal::set_scale(amount, accuracy, round_up),
                    decimal::set_scale(reserved, accuracy, round_up),
                ),
                None => (amount, reserved),
            };
            print_balances(&service.add_balance(&client_id, &asset, amount, reserved).await?);
        }
        Commands::Set { client_id, asset, amount, reserved } => {
            print_balances(&service.set_balance(&client_id, &asset, amount, reserved).await?);
        }
        Commands::Migrate => {}
    }

    Ok(())
}
