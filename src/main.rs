// src/main.rs
//! Risk scoring API server entry point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use wallet_risk::api::RiskServer;
use wallet_risk::core::{ScoringError, ServiceConfig};
use wallet_risk::scoring::{ArtifactBundle, ScoringService};
use wallet_risk::storage::TransactionStore;

#[derive(Parser)]
#[command(name = "risk_server")]
#[command(about = "Wallet fraud risk scoring server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Override the configured bind port
    #[arg(long)]
    port: Option<u16>,

    /// Path to config.toml (defaults to CONFIG_PATH or ./config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging()?;
    info!("starting wallet-risk v{}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(args.config.as_deref())?.apply_env();
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let store = Arc::new(TransactionStore::connect(&config.storage).await?);

    // The bundle loads exactly once per process. A missing or corrupt
    // bundle degrades the service to fallback scoring for its whole
    // lifetime; a schema mismatch is fatal, since scoring through
    // misaligned features would corrupt every result.
    let bundle = match ArtifactBundle::load(&config.artifacts.export_dir) {
        Ok(bundle) => {
            info!(version = %bundle.meta.version, "model + scaler loaded");
            Some(bundle)
        }
        Err(err @ ScoringError::SchemaMismatch { .. }) => return Err(err.into()),
        Err(err) => {
            warn!(error = %err, "model not loaded, fallback scoring mode");
            None
        }
    };

    let service = Arc::new(ScoringService::new(store.clone(), bundle));
    let server = RiskServer::new(service, store, &config.server);
    server.start().await
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=info,sqlx=warn"));

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string()),
        ),
    };

    if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&content)?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    } else {
        Ok(ServiceConfig::default())
    }
}
