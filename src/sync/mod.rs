//! Synchronization engine.
//!
//! # Data Flow
//! ```text
//! orchestrator events
//!     → listener.rs (filter, debounce trigger, reconnect)
//!     → scheduler.rs (single deadline: debounce or poll)
//!     → engine.rs (generate → diff → adapt → version + 1)
//!     → distributor.rs (one task per server, version skip, busy skip)
//!     → transport.rs (POST /load)
//! ```
//!
//! # Design Decisions
//! - No error in here terminates the process; everything retries next cycle
//! - Rebuilds are serialized; pushes within a rebuild are concurrent
//! - The poll deadline guarantees convergence even without events

pub mod distributor;
pub mod engine;
pub mod listener;
pub mod scheduler;
pub mod transport;

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::adapter::Adapter;
use crate::config::TimingConfig;
use crate::generator::Generator;
use crate::lifecycle::Shutdown;
use crate::orchestrator::Orchestrator;
use crate::state::ConfigStore;

pub use distributor::{FleetDistributor, PushOutcome};
pub use engine::RebuildEngine;
pub use listener::EventListener;
pub use scheduler::{Rebuilder, UpdateScheduler};
pub use transport::{ConfigTransport, HttpTransport};

/// The wired-up sync engine, ready to be started once.
pub struct SyncService {
    scheduler: Arc<UpdateScheduler>,
    listener: EventListener,
    engine: Arc<RebuildEngine>,
}

impl SyncService {
    pub fn new(
        timing: &TimingConfig,
        orchestrator: Arc<dyn Orchestrator>,
        generator: Arc<dyn Generator>,
        adapter: Arc<dyn Adapter>,
        transport: Arc<dyn ConfigTransport>,
    ) -> Self {
        let store = ConfigStore::new();
        let distributor = Arc::new(FleetDistributor::new(
            store.clone(),
            transport,
            timing.admin_port,
        ));
        let engine = Arc::new(RebuildEngine::new(generator, adapter, store, distributor));
        let scheduler = Arc::new(UpdateScheduler::from_config(timing));
        let listener = EventListener::new(
            orchestrator,
            Arc::clone(&scheduler),
            timing.reconnect_cooldown(),
        );

        Self {
            scheduler,
            listener,
            engine,
        }
    }

    pub fn engine(&self) -> Arc<RebuildEngine> {
        Arc::clone(&self.engine)
    }

    /// Spawn the scheduler (first rebuild immediately) and the event listener.
    pub fn start(self, shutdown: &Shutdown) -> Vec<JoinHandle<()>> {
        let scheduler = self.scheduler;
        let rebuilder: Arc<dyn Rebuilder> = self.engine;
        let scheduler_shutdown = shutdown.subscribe();
        let scheduler_task = tokio::spawn(async move {
            scheduler.run(rebuilder, scheduler_shutdown).await;
        });

        let listener_task = tokio::spawn(self.listener.run(shutdown.subscribe()));

        vec![scheduler_task, listener_task]
    }
}
