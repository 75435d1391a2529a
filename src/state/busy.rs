//! In-flight push tracking per server.
//!
//! # Responsibilities
//! - Record which servers currently have a push executing
//! - Hand out at most one claim per server at a time
//! - Release the claim on every exit path (RAII guard)

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe mapping from server address to an in-flight flag.
#[derive(Debug, Clone, Default)]
pub struct BusyMap {
    inner: Arc<DashMap<String, bool>>,
}

impl BusyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, server: &str) -> bool {
        self.inner.get(server).map(|r| *r.value()).unwrap_or(false)
    }

    pub fn set(&self, server: &str, busy: bool) {
        self.inner.insert(server.to_string(), busy);
    }

    pub fn delete(&self, server: &str) {
        self.inner.remove(server);
    }

    /// Atomically check-and-set the flag for `server`.
    ///
    /// Returns `None` if a push is already in flight. The returned guard
    /// clears the flag when dropped.
    pub fn try_acquire(&self, server: &str) -> Option<BusyGuard> {
        match self.inner.entry(server.to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() {
                    return None;
                }
                entry.insert(true);
            }
            Entry::Vacant(entry) => {
                entry.insert(true);
            }
        }

        Some(BusyGuard {
            map: self.clone(),
            server: server.to_string(),
        })
    }
}

/// A RAII guard marking a server as in flight.
#[derive(Debug)]
pub struct BusyGuard {
    map: BusyMap,
    server: String,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.map.delete(&self.server);
    }
}
