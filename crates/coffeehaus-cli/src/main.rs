mod commands;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "coffeehaus-cli")]
#[command(about = "Coffeehaus search and sync command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database operations
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run one search through the full pipeline and print the response as JSON
    Search {
        /// Free-text query, e.g. "coffee near me"
        query: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,
        /// Search radius in meters
        #[arg(long)]
        radius: Option<u32>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Fetch one place from the directory and reconcile it into the store
    SyncPlace {
        /// Directory place id
        place_id: String,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("coffeehaus-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = coffeehaus_core::load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let pool_config = coffeehaus_db::PoolConfig::from_app_config(&config);
    let pool = coffeehaus_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            coffeehaus_db::health_check(&pool).await?;
            println!("database ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            coffeehaus_db::run_migrations(&pool).await?;
            println!("migrations applied");
        }
        Commands::Search {
            query,
            lat,
            lng,
            radius,
            limit,
            offset,
        } => {
            let request = commands::search_request(query, lat, lng, radius, limit, offset);
            commands::run_search(&pool, &config, request).await?;
        }
        Commands::SyncPlace { place_id } => {
            commands::run_sync_place(&pool, &config, &place_id).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
