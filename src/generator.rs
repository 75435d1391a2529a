//! Configuration generators.
//!
//! A generator turns the current orchestrator state into rendered proxy
//! configuration plus the list of servers that must receive it.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::config::GeneratorConfig;
use crate::error::GenerateError;

/// Output of one generation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedConfig {
    /// Rendered configuration text.
    pub rendered: Vec<u8>,
    /// Addresses of the proxy instances to configure.
    pub servers: Vec<String>,
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self) -> Result<GeneratedConfig, GenerateError>;
}

/// Generator that re-reads pre-rendered configuration from disk and targets
/// a fixed fleet.
#[derive(Debug, Clone)]
pub struct FileGenerator {
    path: PathBuf,
    servers: Vec<String>,
}

impl FileGenerator {
    pub fn new(path: impl Into<PathBuf>, servers: Vec<String>) -> Self {
        Self {
            path: path.into(),
            servers,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(&config.rendered_config_path, config.servers.clone())
    }
}

#[async_trait]
impl Generator for FileGenerator {
    async fn generate(&self) -> Result<GeneratedConfig, GenerateError> {
        let rendered = tokio::fs::read(&self.path).await?;
        Ok(GeneratedConfig {
            rendered,
            servers: self.servers.clone(),
        })
    }
}
