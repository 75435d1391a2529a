//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, port valid)
//! - Check the orchestrator endpoint is a usable URL or unix socket
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SyncConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::SyncConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("invalid docker_host '{value}': {reason}")]
    DockerHost { value: String, reason: String },

    #[error("generator.rendered_config_path must not be empty")]
    EmptyRenderedPath,

    #[error("generator.servers contains an empty address")]
    EmptyServer,
}

pub fn validate_config(config: &SyncConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.sync.polling_interval_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "sync.polling_interval_secs",
        });
    }
    if config.sync.debounce_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "sync.debounce_ms",
        });
    }
    if config.sync.admin_port == 0 {
        errors.push(ValidationError::Zero {
            field: "sync.admin_port",
        });
    }

    if let Err(reason) = check_docker_host(&config.orchestrator.docker_host) {
        errors.push(ValidationError::DockerHost {
            value: config.orchestrator.docker_host.clone(),
            reason,
        });
    }

    if config.generator.rendered_config_path.trim().is_empty() {
        errors.push(ValidationError::EmptyRenderedPath);
    }
    if config.generator.servers.iter().any(|s| s.trim().is_empty()) {
        errors.push(ValidationError::EmptyServer);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_docker_host(host: &str) -> Result<(), String> {
    let url = url::Url::parse(host).map_err(|e| e.to_string())?;
    match url.scheme() {
        "unix" if url.path().is_empty() || url.path() == "/" => {
            Err("missing socket path".to_string())
        }
        "unix" | "http" | "https" => Ok(()),
        "tcp" if url.host_str().is_none() => Err("missing host".to_string()),
        "tcp" => Ok(()),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}
