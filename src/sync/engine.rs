//! Rebuild & diff engine.
//!
//! # Data Flow
//! ```text
//! generate() → (rendered, servers)
//!     → byte-compare with previous rendered
//!         changed:   adapt → publish (version + 1)
//!         unchanged: keep version
//!     → push_to_server for every server (concurrent, joined)
//! ```
//!
//! # Design Decisions
//! - The whole sequence holds one async mutex, so rebuilds never overlap
//! - The rendered text is remembered before adaptation, so byte-identical
//!   broken output is not adapted again and later cycles keep distributing
//!   the last good version
//! - Generator failures abort the attempt without distributing

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::adapter::Adapter;
use crate::generator::Generator;
use crate::observability::metrics;
use crate::state::ConfigStore;
use crate::sync::distributor::{FleetDistributor, PushOutcome};
use crate::sync::scheduler::Rebuilder;

pub struct RebuildEngine {
    generator: Arc<dyn Generator>,
    adapter: Arc<dyn Adapter>,
    store: ConfigStore,
    distributor: Arc<FleetDistributor>,
    last_rendered: Mutex<Vec<u8>>,
}

impl RebuildEngine {
    pub fn new(
        generator: Arc<dyn Generator>,
        adapter: Arc<dyn Adapter>,
        store: ConfigStore,
        distributor: Arc<FleetDistributor>,
    ) -> Self {
        Self {
            generator,
            adapter,
            store,
            distributor,
            last_rendered: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn distributor(&self) -> &Arc<FleetDistributor> {
        &self.distributor
    }

    /// Run one generate → diff → adapt → distribute cycle.
    ///
    /// Returns false if generation or adaptation failed.
    pub async fn rebuild(&self) -> bool {
        let mut last_rendered = self.last_rendered.lock().await;

        let generated = match self.generator.generate().await {
            Ok(generated) => generated,
            Err(e) => {
                tracing::error!(error = %e, "Failed to generate configuration");
                metrics::record_rebuild("generate_failed");
                return false;
            }
        };

        if *last_rendered != generated.rendered {
            tracing::info!(
                rendered = %String::from_utf8_lossy(&generated.rendered),
                "New rendered configuration"
            );

            *last_rendered = generated.rendered.clone();

            let output = match self.adapter.adapt(&generated.rendered) {
                Ok(output) => output,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to adapt rendered configuration");
                    metrics::record_rebuild("adapt_failed");
                    return false;
                }
            };

            for warning in &output.warnings {
                tracing::warn!(warning = %warning, "Adaptation warning");
            }

            tracing::debug!(
                json = %String::from_utf8_lossy(output.config.as_bytes()),
                "New structured configuration"
            );

            let version = self.store.publish(output.config);
            metrics::record_config_version(version);
            tracing::info!(version, "Configuration version advanced");
        }

        let outcomes = self.distribute(generated.servers).await;
        let applied = outcomes
            .iter()
            .filter(|o| matches!(o, PushOutcome::Applied(_)))
            .count();
        let failed = outcomes.iter().filter(|o| **o == PushOutcome::Failed).count();
        tracing::debug!(
            servers = outcomes.len(),
            applied,
            failed,
            version = self.store.version(),
            "Rebuild finished"
        );

        metrics::record_rebuild("completed");
        true
    }

    async fn distribute(&self, servers: Vec<String>) -> Vec<PushOutcome> {
        let mut tasks = JoinSet::new();
        for server in servers {
            let distributor = Arc::clone(&self.distributor);
            tasks.spawn(async move { distributor.push_to_server(&server).await });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!(error = %e, "Push task panicked"),
            }
        }
        outcomes
    }
}

#[async_trait]
impl Rebuilder for RebuildEngine {
    async fn rebuild(&self) -> bool {
        RebuildEngine::rebuild(self).await
    }
}
