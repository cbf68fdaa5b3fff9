//! winerate trainer CLI
//!
//! Trains the calibrated wine quality classifier and writes the artifact,
//! its hash and a training report.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use winerate_trainer::{report_path, TrainerConfig, TrainingPipeline};

#[derive(Parser, Debug)]
#[command(name = "winerate-train")]
#[command(author = "winerate Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reproducible wine quality classifier trainer", long_about = None)]
struct Args {
    /// TOML configuration file (default: config/trainer.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Red wine CSV path
    #[arg(long)]
    red: Option<PathBuf>,

    /// White wine CSV path
    #[arg(long)]
    white: Option<PathBuf>,

    /// Output artifact path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seed for splits and tree fitting
    #[arg(long)]
    seed: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        TrainerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(red) = args.red {
        config.red_path = red;
    }
    if let Some(white) = args.white {
        config.white_path = white;
    }
    if let Some(output) = args.output {
        config.output_path = output;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.verbose {
        config.log_level = "debug".to_string();
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))?;

    info!("winerate trainer v{}", env!("CARGO_PKG_VERSION"));
    info!("═══════════════════════════════════════════");

    let pipeline = TrainingPipeline::new(config);
    let outcome = pipeline.run().context("Training failed")?;

    info!("═══════════════════════════════════════════");
    info!("✓ Training completed successfully");
    info!("  Model: {}", pipeline.config().output_path.display());
    info!(
        "  Report: {}",
        report_path(&pipeline.config().output_path).display()
    );
    info!(
        "  Threshold (F1-optimal, not served): {:.2}",
        outcome.report.best_threshold.threshold
    );

    Ok(())
}
