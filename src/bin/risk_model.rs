//! Model lifecycle CLI: train raw artifacts, then promote them for serving.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wallet_risk::scoring::artifacts;
use wallet_risk::scoring::train::{run_training, TrainingConfig};
use wallet_risk::scoring::ForestConfig;

#[derive(Parser)]
#[command(name = "risk_model")]
#[command(about = "Train and export the wallet risk model")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model over the synthetic population and write raw artifacts
    Train {
        /// Working directory for raw (pre-export) artifacts
        #[arg(long, default_value = "models")]
        out_dir: PathBuf,

        /// Normal-cluster sample count
        #[arg(long, default_value_t = 2000)]
        samples: usize,

        #[arg(long, default_value_t = 300)]
        estimators: usize,

        #[arg(long, default_value_t = 0.05)]
        contamination: f64,

        /// Training seed; identical data and seed reproduce the model
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Version tag written into the bundle metadata
        #[arg(long, default_value = "1.0")]
        model_version: String,
    },
    /// Validate raw artifacts and promote them into the serving directory
    Export {
        #[arg(long, default_value = "models")]
        model_dir: PathBuf,

        #[arg(long, default_value = "exported_model")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match Args::parse().command {
        Commands::Train {
            out_dir,
            samples,
            estimators,
            contamination,
            seed,
            model_version,
        } => {
            let config = TrainingConfig {
                n_samples: samples,
                version: model_version,
                forest: ForestConfig {
                    n_estimators: estimators,
                    contamination,
                    seed,
                    ..ForestConfig::default()
                },
            };
            let meta = run_training(&config, &out_dir)?;
            info!(version = %meta.version, dir = %out_dir.display(), "training complete");
        }
        Commands::Export { model_dir, out_dir } => {
            let meta = artifacts::export(&model_dir, &out_dir)?;
            info!(version = %meta.version, dir = %out_dir.display(), "export complete");
        }
    }

    Ok(())
}
