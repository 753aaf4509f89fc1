mod db;
mod lookup;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clinnect_core::Coordinate;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "clinnect-cli")]
#[command(about = "Find nearby hospitals and clinics that accept an insurance")]
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
    /// Search providers by insurance name
    Search {
        /// Insurance name, or part of one (case-insensitive)
        query: String,
        /// Origin latitude; requires --lon
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Origin longitude; requires --lat
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
        /// Override the configured search radius
        #[arg(long)]
        radius_km: Option<f64>,
        /// Search a providers YAML file instead of the database
        #[arg(long)]
        providers_file: Option<PathBuf>,
    },
    /// Fetch a route and label each segment with simulated congestion
    Route {
        /// Start point as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        from: Coordinate,
        /// End point as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        to: Coordinate,
        /// Seed for reproducible congestion labels
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Resolve free text to places
    Geocode {
        text: String,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Load the providers file into the database
    Seed {
        /// Providers YAML file (defaults to CLINNECT_PROVIDERS_PATH)
        #[arg(long)]
        providers_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Db { command }) => {
            let config = clinnect_core::load_app_config()?;
            let pool_config = clinnect_db::PoolConfig::from_app_config(&config);
            let pool = clinnect_db::connect_pool(&config.database_url, pool_config).await?;
            match command {
                DbCommands::Ping => db::run_ping(&pool).await?,
                DbCommands::Migrate => db::run_migrate(&pool).await?,
                DbCommands::Seed { providers_file } => {
                    let path = providers_file.unwrap_or_else(|| config.providers_path.clone());
                    db::run_seed(&pool, &path).await?;
                }
            }
        }
        Some(Commands::Search {
            query,
            lat,
            lon,
            radius_km,
            providers_file,
        }) => {
            let origin = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)?),
                _ => None,
            };
            lookup::run_search(&query, origin, radius_km, providers_file.as_deref()).await?;
        }
        Some(Commands::Route { from, to, seed }) => {
            let config = clinnect_core::load_app_config()?;
            lookup::run_route(&config, from, to, seed).await?;
        }
        Some(Commands::Geocode { text }) => {
            let config = clinnect_core::load_app_config()?;
            lookup::run_geocode(&config, &text).await?;
        }
        None => println!("clinnect-cli ready; see --help"),
    }

    Ok(())
}
