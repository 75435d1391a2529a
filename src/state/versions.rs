//! Last applied configuration version per server.

use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe mapping from server address to the last version it accepted.
///
/// Unknown servers read as version 0, lower than any published version.
#[derive(Debug, Clone, Default)]
pub struct VersionMap {
    inner: Arc<DashMap<String, u64>>,
}

impl VersionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, server: &str) -> u64 {
        self.inner.get(server).map(|r| *r.value()).unwrap_or(0)
    }

    pub fn set(&self, server: &str, version: u64) {
        self.inner.insert(server.to_string(), version);
    }

    pub fn delete(&self, server: &str) {
        self.inner.remove(server);
    }

    /// Raise the stored version to `version` if it is newer.
    ///
    /// Returns true if the entry changed. A late push carrying an older
    /// version leaves the entry untouched.
    pub fn advance(&self, server: &str, version: u64) -> bool {
        let mut entry = self.inner.entry(server.to_string()).or_insert(0);
        if version > *entry {
            *entry = version;
            true
        } else {
            false
        }
    }

    /// Number of servers seen so far.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
