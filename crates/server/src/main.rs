use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod api;
mod config;

use config::{AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "salesdesk")]
#[command(about = "Sales assistant tool server", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "salesdesk.toml", global = true)]
    config: PathBuf,

    /// Data directory for storage
    #[arg(short, long, env = "SALESDESK_DATA_DIR", default_value = "./data", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the tools over HTTP (REST and JSON-RPC)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Populate an empty store with demo data
    Seed {
        /// RNG seed for a reproducible data set (overrides the config file)
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "salesdesk=info,tower_http=debug".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    tracing::info!("Data directory: {}", args.data_dir.display());

    // Load configuration
    let mut config = ServerConfig::load(&args.config, args.data_dir)?;

    match args.command {
        Command::Serve { port, host } => {
            tracing::info!("Starting salesdesk server");
            let state = AppState::new(&config)?;
            if state.store.shop_count()? == 0 {
                tracing::warn!("Sales store is empty; run `salesdesk seed` to populate it");
            }

            let addr = format!("{}:{}", host, port);
            tracing::info!("Starting API server on {}", addr);
            api::serve(&addr, state).await?;
        }
        Command::Seed { seed } => {
            if seed.is_some() {
                config.seed.seed = seed;
            }

            let store = config.open_store()?;
            let today = chrono::Local::now().date_naive();
            let summary = salesdesk_core::seed::seed(&store, &config.seed, today)
                .context("Failed to seed sales store")?;

            tracing::info!(
                shops = summary.shops,
                customers = summary.customers,
                products = summary.products,
                orders = summary.orders,
                path = %config.store_path().display(),
                "Seeded sales store"
            );
        }
    }

    Ok(())
}
