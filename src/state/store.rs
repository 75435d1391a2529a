//! Current structured configuration and its version.

use arc_swap::ArcSwap;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::PushError;

/// Adapted, machine-consumable configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredConfig {
    bytes: Vec<u8>,
}

impl StructuredConfig {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Build the payload for one server: the same document with
    /// `admin.listen` pointing at `listen`.
    ///
    /// Other `admin` fields are preserved.
    pub fn with_admin_listen(&self, listen: &str) -> Result<Vec<u8>, PushError> {
        let mut document: Value = serde_json::from_slice(&self.bytes)
            .map_err(|e| PushError::Payload(e.to_string()))?;

        let root = document
            .as_object_mut()
            .ok_or_else(|| PushError::Payload("configuration root is not an object".to_string()))?;

        let admin = root
            .entry("admin")
            .or_insert_with(|| Value::Object(Map::new()));
        if !admin.is_object() {
            *admin = Value::Object(Map::new());
        }
        if let Some(admin) = admin.as_object_mut() {
            admin.insert("listen".to_string(), Value::String(listen.to_string()));
        }

        serde_json::to_vec(&document).map_err(|e| PushError::Payload(e.to_string()))
    }
}

/// A structured configuration paired with the version it was published as.
#[derive(Debug, Clone, Default)]
pub struct VersionedConfig {
    pub version: u64,
    pub config: StructuredConfig,
}

/// Holder of the fleet's current truth.
///
/// Starts at version 0 with an empty config. Readers take consistent
/// snapshots of the pair; only the rebuild sequence publishes.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    current: Arc<ArcSwap<VersionedConfig>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Arc<VersionedConfig> {
        self.current.load_full()
    }

    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// Publish a new configuration as the next version and return it.
    ///
    /// Callers must serialize publishes (the rebuild engine does).
    pub fn publish(&self, config: StructuredConfig) -> u64 {
        let version = self.current.load().version + 1;
        self.current.store(Arc::new(VersionedConfig { version, config }));
        version
    }
}
