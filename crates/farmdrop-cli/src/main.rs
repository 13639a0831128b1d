mod admin;
mod quote;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "farmdrop-cli")]
#[command(about = "Farm delivery operator tooling")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Account administration
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Quote delivery to a point or address without touching the database
    Quote {
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        address: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
    /// Upsert the food catalog from the foods YAML file
    Seed,
}

#[derive(Debug, Subcommand)]
enum UserCommands {
    /// Grant (or with --revoke, remove) owner access
    Promote {
        #[arg(long)]
        email: String,
        #[arg(long)]
        revoke: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Quote { lat, lon, address }) => {
            let config = farmdrop_core::load_quote_config()?;
            let target = match (lat, lon, address) {
                (Some(lat), Some(lon), _) => quote::QuoteTarget::Point { lat, lon },
                (_, _, Some(address)) => quote::QuoteTarget::Address(address),
                _ => anyhow::bail!("provide --lat and --lon, or --address"),
            };
            quote::run_quote(&config, target).await?;
        }
        Some(Commands::Db { command }) => {
            let config = farmdrop_core::load_app_config()?;
            let pool = connect(&config).await?;
            match command {
                DbCommands::Ping => admin::run_db_ping(&pool).await?,
                DbCommands::Migrate => admin::run_db_migrate(&pool).await?,
                DbCommands::Seed => admin::run_db_seed(&pool, &config).await?,
            }
        }
        Some(Commands::Users {
            command: UserCommands::Promote { email, revoke },
        }) => {
            let config = farmdrop_core::load_app_config()?;
            let pool = connect(&config).await?;
            admin::run_promote(&pool, &email, !revoke).await?;
        }
        None => println!("farmdrop-cli: see --help for available commands"),
    }

    Ok(())
}

async fn connect(config: &farmdrop_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = farmdrop_db::PoolConfig::from_app_config(config);
    Ok(farmdrop_db::connect_pool(&config.database_url, pool_config).await?)
}
