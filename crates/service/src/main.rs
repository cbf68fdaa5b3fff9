//! winerate prediction service
//!
//! Loads the trained artifact once and serves `POST /predict`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use winerate_model::CalibratedModel;
use winerate_service::{start_server, AppState, ServiceConfig, ServiceError};

#[derive(Parser, Debug)]
#[command(name = "winerate-service")]
#[command(author = "winerate Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Wine quality prediction service", long_about = None)]
struct Args {
    /// TOML configuration file (default: config/service.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(short, long)]
    listen: Option<String>,

    /// Model artifact path
    #[arg(short, long)]
    model: Option<PathBuf>,
}

fn init_logging(config: &ServiceConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to set tracing subscriber")?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        ServiceConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(model) = args.model {
        config.model_path = model;
    }

    init_logging(&config)?;
    info!("winerate service v{}", env!("CARGO_PKG_VERSION"));

    let (model, model_hash) =
        CalibratedModel::load(&config.model_path).map_err(|source| ServiceError::ModelLoad {
            path: config.model_path.clone(),
            source,
        })?;
    info!(
        "Loaded model from {} ({} trees, blake3 {})",
        config.model_path.display(),
        model.forest.num_trees(),
        model_hash
    );

    start_server(AppState::new(model), &config.listen_addr).await?;
    Ok(())
}
