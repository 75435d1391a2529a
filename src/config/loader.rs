//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::SyncConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read and deserialize a TOML file without semantic validation.
///
/// Callers that layer overrides on top validate the final result.
pub fn read_config(path: &Path) -> Result<SyncConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SyncConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[sync]
polling_interval_secs = 10

[generator]
servers = ["10.0.0.1", "10.0.0.2"]
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.sync.polling_interval_secs, 10);
        assert_eq!(config.generator.servers.len(), 2);
    }

    #[test]
    fn test_validation_failure_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sync]\ndebounce_ms = 0").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("sync.debounce_ms"));
    }

    #[test]
    fn test_read_skips_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sync]\npolling_interval_secs = 0").unwrap();

        let config = read_config(file.path()).unwrap();
        assert_eq!(config.sync.polling_interval_secs, 0);
        assert!(matches!(load_config(file.path()), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_read_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sync\npolling_interval_secs = 0").unwrap();

        assert!(matches!(read_config(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/sync.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
