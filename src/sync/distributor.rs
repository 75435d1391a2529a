//! Fleet distribution.
//!
//! # Responsibilities
//! - Decide per server whether a push is needed
//! - Specialise the payload so each proxy exposes its admin endpoint on itself
//! - Record the applied version only after a confirmed success
//!
//! # Skip Rules (checked in order)
//! ```text
//! push already in flight for server  → SkippedBusy
//! last applied >= current version    → UpToDate
//! ```

use std::sync::Arc;

use crate::observability::metrics;
use crate::state::{BusyMap, ConfigStore, VersionMap};
use crate::sync::transport::ConfigTransport;

/// What a single `push_to_server` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Another push to the same server was still running.
    SkippedBusy,
    /// The server already had this version or a newer one.
    UpToDate,
    /// The server accepted the given version.
    Applied(u64),
    /// The attempt failed; the server stays at its previous version.
    Failed,
}

impl PushOutcome {
    fn label(&self) -> &'static str {
        match self {
            PushOutcome::SkippedBusy => "skipped_busy",
            PushOutcome::UpToDate => "up_to_date",
            PushOutcome::Applied(_) => "applied",
            PushOutcome::Failed => "failed",
        }
    }
}

/// Pushes the current configuration to individual servers.
pub struct FleetDistributor {
    store: ConfigStore,
    versions: VersionMap,
    busy: BusyMap,
    transport: Arc<dyn ConfigTransport>,
    admin_port: u16,
}

impl FleetDistributor {
    pub fn new(store: ConfigStore, transport: Arc<dyn ConfigTransport>, admin_port: u16) -> Self {
        Self {
            store,
            versions: VersionMap::new(),
            busy: BusyMap::new(),
            transport,
            admin_port,
        }
    }

    pub fn versions(&self) -> &VersionMap {
        &self.versions
    }

    pub fn busy(&self) -> &BusyMap {
        &self.busy
    }

    /// Bring one server up to the current version if it is behind.
    ///
    /// Safe to call while a previous call for the same server is running.
    pub async fn push_to_server(&self, server: &str) -> PushOutcome {
        let outcome = self.try_push(server).await;
        metrics::record_push(outcome.label());
        outcome
    }

    async fn try_push(&self, server: &str) -> PushOutcome {
        let Some(_guard) = self.busy.try_acquire(server) else {
            tracing::debug!(server = %server, "Push already in flight, skipping");
            return PushOutcome::SkippedBusy;
        };

        let target = self.store.current();
        let applied = self.versions.get(server);
        if applied >= target.version {
            tracing::debug!(server = %server, version = applied, "Server is up to date");
            return PushOutcome::UpToDate;
        }

        tracing::info!(server = %server, version = target.version, "Sending configuration");

        let listen = format!("tcp/{}:{}", server, self.admin_port);
        let result = match target.config.with_admin_listen(&listen) {
            Ok(payload) => self.transport.load(server, payload).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.versions.advance(server, target.version);
                tracing::info!(
                    server = %server,
                    version = target.version,
                    "Successfully configured"
                );
                PushOutcome::Applied(target.version)
            }
            Err(e) => {
                tracing::error!(server = %server, error = %e, "Failed to configure server");
                PushOutcome::Failed
            }
        }
    }
}

impl std::fmt::Debug for FleetDistributor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetDistributor")
            .field("version", &self.store.version())
            .field("known_servers", &self.versions.len())
            .field("admin_port", &self.admin_port)
            .finish()
    }
}
