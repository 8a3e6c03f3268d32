//! Stars Wallet service
//!
//! Serves the wallet's HTTP messaging surface on top of the configured
//! ledger and session backends.

use anyhow::Result;
use clap::Parser;
use stars_wallet::{api, ServiceContainer, WalletConfig};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stars-wallet")]
#[command(about = "Stars wallet backend")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "wallet.toml")]
    config: String,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,

    /// Dry run mode (validate config and exit)
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_missing = !std::path::Path::new(&cli.config).exists();
    let mut config = if config_missing {
        WalletConfig::default()
    } else {
        WalletConfig::from_file(&cli.config)?
    };

    if let Some(log_level) = cli.log_level {
        config.monitoring.log_level = log_level;
    }

    init_logging(&config);

    if config_missing {
        warn!("Config file not found, using defaults: {}", cli.config);
    }

    info!("Starting Stars Wallet");
    info!("Storage backend: {:?}", config.storage.backend);
    info!("Session backend: {:?}", config.session.backend);
    info!(
        "Commission rate: {}, amount scale: {}",
        config.deposit.commission_rate, config.deposit.amount_scale
    );

    config.check()?;
    config.ensure_directories()?;
    info!("Configuration validated successfully");

    if cli.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        return Ok(());
    }

    let services = Arc::new(ServiceContainer::new(config.clone()).await?);
    if let Err(e) = services.health_check().await {
        warn!("Starting with unhealthy backends: {}", e);
    }

    info!("Starting API server on {}", config.api.bind_address);
    let api_server = api::start_server(services.clone(), &config.api).await?;

    info!("Wallet started successfully. Press Ctrl+C to shutdown.");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = api_server => {
            if let Err(e) = result {
                error!("API server task error: {}", e);
            }
        }
    }

    info!("Shutting down Stars Wallet");
    Ok(())
}

fn init_logging(config: &WalletConfig) {
    let log_level = config
        .monitoring
        .log_level
        .parse()
        .unwrap_or(tracing::Level::INFO);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("stars_wallet={},tower_http=info", log_level).into());

    if config.monitoring.structured_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
