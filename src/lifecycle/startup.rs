//! Startup orchestration.
//!
//! # Responsibilities
//! - Log the effective options
//! - Connect to the orchestrator and verify it answers
//! - Build the sync engine from configuration and start its loops

use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::adapter::JsonAdapter;
use crate::config::SyncConfig;
use crate::error::{OrchestratorError, PushError};
use crate::generator::FileGenerator;
use crate::lifecycle::Shutdown;
use crate::orchestrator::{DockerClient, Orchestrator};
use crate::sync::{HttpTransport, SyncService};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("orchestrator connection failed: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("HTTP client initialisation failed: {0}")]
    Transport(#[from] PushError),
}

pub fn log_options(config: &SyncConfig) {
    tracing::info!(
        docker_host = %config.orchestrator.docker_host,
        rendered_config_path = %config.generator.rendered_config_path,
        servers = ?config.generator.servers,
        polling_interval_secs = config.sync.polling_interval_secs,
        debounce_ms = config.sync.debounce_ms,
        reconnect_cooldown_secs = config.sync.reconnect_cooldown_secs,
        admin_port = config.sync.admin_port,
        "Start"
    );
}

/// Connect to the orchestrator and spawn the sync loops.
pub async fn start(
    config: &SyncConfig,
    shutdown: &Shutdown,
) -> Result<Vec<JoinHandle<()>>, StartupError> {
    log_options(config);

    let orchestrator = DockerClient::new(&config.orchestrator)?;
    if let Err(e) = orchestrator.ping().await {
        tracing::error!(error = %e, "Orchestrator ping failed");
        return Err(e.into());
    }
    tracing::info!(
        api_version = orchestrator.api_version().as_deref().unwrap_or("unversioned"),
        "Orchestrator reachable"
    );

    let service = SyncService::new(
        &config.sync,
        Arc::new(orchestrator),
        Arc::new(FileGenerator::from_config(&config.generator)),
        Arc::new(JsonAdapter),
        Arc::new(HttpTransport::new(config.sync.admin_port)?),
    );

    Ok(service.start(shutdown))
}
