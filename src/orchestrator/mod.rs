//! Orchestrator integration.
//!
//! # Data Flow
//! ```text
//! Orchestrator::events(filter)
//!     → EventStream (events and errors merged, Err/end = termination)
//!     → sync::listener (classify, debounce)
//! ```
//!
//! # Design Decisions
//! - The subscription is cancelled by dropping the stream
//! - Only the event surface lives here; inventory queries belong to generators

pub mod docker;
pub mod event;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::OrchestratorError;

pub use docker::DockerClient;
pub use event::{EntityType, EventFilter, OrchestratorEvent};

/// A live subscription. Dropping it cancels the subscription.
pub type EventStream = BoxStream<'static, Result<OrchestratorEvent, OrchestratorError>>;

/// Source of change events.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Check that the orchestrator is reachable.
    async fn ping(&self) -> Result<(), OrchestratorError>;

    /// Open a filtered event subscription.
    ///
    /// Connection failures surface as the first item of the stream.
    fn events(&self, filter: &EventFilter) -> EventStream;
}
