//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → DOCKER_HOST / DOCKER_API_VERSION, then CLI overrides (main)
//!     → validation.rs (semantic checks, once)
//!     → SyncConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs (or none at all)
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::GeneratorConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::OrchestratorConfig;
pub use schema::SyncConfig;
pub use schema::TimingConfig;
