//! Shared synchronization state.
//!
//! # Data Flow
//! ```text
//! RebuildEngine (serialized)
//!     → store.rs (publish StructuredConfig + ConfigVersion)
//!
//! push tasks (concurrent, one per server)
//!     → busy.rs (claim server, released on drop)
//!     → store.rs (snapshot version + config)
//!     → versions.rs (raise last applied version on success)
//! ```
//!
//! # Design Decisions
//! - Per-server maps are DashMaps: independent per-shard locking, no global lock
//! - Entries are created lazily and never garbage-collected
//! - The version map only ever moves forward

pub mod busy;
pub mod store;
pub mod versions;

pub use busy::{BusyGuard, BusyMap};
pub use store::{ConfigStore, StructuredConfig, VersionedConfig};
pub use versions::VersionMap;
