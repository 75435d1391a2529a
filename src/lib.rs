//! Swarm proxy configuration sync library.

pub mod adapter;
pub mod config;
pub mod error;
pub mod generator;
pub mod lifecycle;
pub mod observability;
pub mod orchestrator;
pub mod state;
pub mod sync;

pub use config::SyncConfig;
pub use lifecycle::Shutdown;
pub use sync::SyncService;
