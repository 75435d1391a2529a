//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sync
//! daemon. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the sync daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Orchestrator connection settings.
    pub orchestrator: OrchestratorConfig,

    /// Scheduling and distribution timings.
    pub sync: TimingConfig,

    /// Where rendered configuration and target servers come from.
    pub generator: GeneratorConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Orchestrator (Docker Engine API) connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Engine endpoint: "unix:///path/to/docker.sock", "tcp://host:port"
    /// or an http(s) URL.
    pub docker_host: String,

    /// API version prefix (e.g., "1.43"). Negotiated on ping when unset.
    pub api_version: Option<String>,
}

/// Environment variable overriding `docker_host`.
pub const DOCKER_HOST_ENV: &str = "DOCKER_HOST";

/// Environment variable overriding `api_version`.
pub const DOCKER_API_VERSION_ENV: &str = "DOCKER_API_VERSION";

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            docker_host: "unix:///var/run/docker.sock".to_string(),
            api_version: None,
        }
    }
}

impl OrchestratorConfig {
    /// Apply `DOCKER_HOST` and `DOCKER_API_VERSION` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply the Docker environment overrides from an arbitrary lookup.
    /// Empty values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup(DOCKER_HOST_ENV).filter(|v| !v.trim().is_empty()) {
            self.docker_host = host;
        }
        if let Some(version) = lookup(DOCKER_API_VERSION_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_version = Some(version);
        }
    }
}

/// Scheduling, reconnection and management API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Fallback rebuild interval in seconds.
    pub polling_interval_secs: u64,

    /// Delay between the first relevant event and the rebuild, in milliseconds.
    pub debounce_ms: u64,

    /// Wait before resubscribing after the event stream ends, in seconds.
    pub reconnect_cooldown_secs: u64,

    /// Management API port on every target server.
    pub admin_port: u16,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            polling_interval_secs: 30,
            debounce_ms: 100,
            reconnect_cooldown_secs: 30,
            admin_port: 2019,
        }
    }
}

impl TimingConfig {
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn reconnect_cooldown(&self) -> Duration {
        Duration::from_secs(self.reconnect_cooldown_secs)
    }
}

/// File-backed generator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Path of the rendered configuration, re-read on every rebuild.
    pub rendered_config_path: String,

    /// Addresses of the proxy instances to keep in sync.
    pub servers: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rendered_config_path: "rendered.json".to_string(),
            servers: Vec::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_timings() {
        let timing = TimingConfig::default();
        assert_eq!(timing.debounce_delay(), Duration::from_millis(100));
        assert_eq!(timing.reconnect_cooldown(), Duration::from_secs(30));
        assert_eq!(timing.admin_port, 2019);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: SyncConfig = toml::from_str(
            r#"
            [sync]
            polling_interval_secs = 5

            [generator]
            servers = ["10.0.0.1"]

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.polling_interval_secs, 5);
        assert_eq!(config.sync.debounce_ms, 100);
        assert_eq!(config.generator.servers, vec!["10.0.0.1".to_string()]);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.orchestrator.docker_host, "unix:///var/run/docker.sock");
    }

    #[test]
    fn test_docker_env_overrides() {
        let mut orchestrator = OrchestratorConfig::default();
        orchestrator.apply_env_from(|key| match key {
            DOCKER_HOST_ENV => Some("tcp://10.0.0.9:2375".to_string()),
            DOCKER_API_VERSION_ENV => Some("1.41".to_string()),
            _ => None,
        });
        assert_eq!(orchestrator.docker_host, "tcp://10.0.0.9:2375");
        assert_eq!(orchestrator.api_version.as_deref(), Some("1.41"));

        let mut untouched = OrchestratorConfig {
            docker_host: "http://127.0.0.1:2375".to_string(),
            api_version: Some("1.43".to_string()),
        };
        untouched.apply_env_from(|_| Some(String::new()));
        assert_eq!(untouched.docker_host, "http://127.0.0.1:2375");
        assert_eq!(untouched.api_version.as_deref(), Some("1.43"));
    }
}
