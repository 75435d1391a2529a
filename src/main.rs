//! Swarm proxy configuration sync daemon.
//!
//! Watches the orchestrator for service, container and config changes,
//! regenerates the proxy configuration and pushes every new version to each
//! proxy instance's management API.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐  events   ┌──────────┐  debounce/poll  ┌───────────┐
//!   │ orchestrator │──────────▶│ listener │────────────────▶│ scheduler │
//!   └──────────────┘           └──────────┘                 └─────┬─────┘
//!                                                                 │ fire
//!                                                                 ▼
//!   ┌───────────┐  generate   ┌────────────────────────────────────────┐
//!   │ generator │◀────────────│ engine: diff → adapt → version + 1     │
//!   └───────────┘             └───────────────────┬────────────────────┘
//!                                                 │ one task per server
//!                                                 ▼
//!                             ┌────────────────────────────────────────┐
//!                             │ distributor: busy? up to date? → POST  │──▶ :2019/load
//!                             └────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use swarm_proxy_sync::config::{read_config, validation::validate_config, ConfigError, SyncConfig};
use swarm_proxy_sync::lifecycle::{signals, startup, Shutdown};
use swarm_proxy_sync::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "swarm-proxy-sync")]
#[command(about = "Keep a fleet of proxies in sync with orchestrator state", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the polling interval in seconds.
    #[arg(long)]
    polling_interval: Option<u64>,

    /// Override the log level.
    #[arg(long)]
    log_level: Option<String>,
}

fn resolve_config(cli: &Cli) -> Result<SyncConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => SyncConfig::default(),
    };

    config.orchestrator.apply_env();

    if let Some(secs) = cli.polling_interval {
        config.sync.polling_interval_secs = secs;
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    logging::init_logging(&config.observability);
    tracing::info!("swarm-proxy-sync v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let tasks = startup::start(&config, &shutdown).await?;

    signals::shutdown_signal().await;
    shutdown.drain(tasks).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
