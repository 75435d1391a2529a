//! Error types shared by the sync subsystems.
//!
//! None of these terminate the process once it is running: the background
//! loops log them and try again on the next cycle.

use thiserror::Error;

/// Errors talking to the orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Connection or request failure over TCP.
    #[error("orchestrator request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The engine socket could not be opened.
    #[error("failed to connect to orchestrator socket: {0}")]
    Connect(#[from] std::io::Error),

    /// HTTP failure on a unix socket connection.
    #[error("orchestrator socket request failed: {0}")]
    Http(#[from] hyper::Error),

    /// The engine did not answer in time.
    #[error("orchestrator did not respond within {0:?}")]
    Timeout(std::time::Duration),

    /// The orchestrator answered with an unexpected status.
    #[error("orchestrator returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// An event could not be decoded.
    #[error("malformed event: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid endpoint configuration.
    #[error("invalid orchestrator endpoint: {0}")]
    Endpoint(String),
}

/// Errors producing the rendered configuration.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to read rendered configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors converting rendered text into structured configuration.
#[derive(Debug, Error)]
pub enum AdaptError {
    #[error("rendered configuration is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("rendered configuration root must be an object, found {0}")]
    NotAnObject(&'static str),
}

/// Errors delivering configuration to one server.
#[derive(Debug, Error)]
pub enum PushError {
    /// The stored configuration could not be specialised for the server.
    #[error("failed to build payload: {0}")]
    Payload(String),

    /// Transport-level failure (connect, send).
    #[error("failed to send configuration: {0}")]
    Transport(#[source] reqwest::Error),

    /// The response body could not be read.
    #[error("failed to read response: {0}")]
    Body(#[source] reqwest::Error),

    /// The server answered with anything but 200.
    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },
}
