//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Log options → Connect orchestrator (ping) → Wire sync engine → Spawn loops
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Loops exit → Join
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: an unreachable orchestrator at startup is fatal
//! - After startup nothing is fatal; loops only stop on shutdown

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
