//! Orchestrator event types and relevance rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of entity an event is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityType {
    Container,
    Service,
    Config,
    Other(String),
}

impl EntityType {
    pub fn as_str(&self) -> &str {
        match self {
            EntityType::Container => "container",
            EntityType::Service => "service",
            EntityType::Config => "config",
            EntityType::Other(other) => other.as_str(),
        }
    }
}

impl From<&str> for EntityType {
    fn from(value: &str) -> Self {
        match value {
            "container" => EntityType::Container,
            "service" => EntityType::Service,
            "config" => EntityType::Config,
            other => EntityType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorEvent {
    pub entity: EntityType,
    pub action: String,
    /// Identifier of the affected object, if the orchestrator sent one.
    pub actor_id: Option<String>,
}

impl OrchestratorEvent {
    pub fn new(entity: EntityType, action: impl Into<String>) -> Self {
        Self {
            entity,
            action: action.into(),
            actor_id: None,
        }
    }

    /// Whether this event can change the generated configuration.
    pub fn is_update_worthy(&self) -> bool {
        match self.entity {
            EntityType::Container => matches!(
                self.action.as_str(),
                "create" | "start" | "stop" | "die" | "destroy"
            ),
            EntityType::Service => matches!(self.action.as_str(), "create" | "update" | "remove"),
            EntityType::Config => matches!(self.action.as_str(), "create" | "remove"),
            EntityType::Other(_) => false,
        }
    }
}

/// Subscription filter, serialised in the Engine API's `filters` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter(BTreeMap<String, Vec<String>>);

impl EventFilter {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn add(mut self, key: &str, value: &str) -> Self {
        self.0.entry(key.to_string()).or_default().push(value.to_string());
        self
    }

    pub fn values(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Service, container and config events from both swarm and local scope.
    pub fn lifecycle() -> Self {
        Self::new()
            .add("scope", "swarm")
            .add("scope", "local")
            .add("type", "service")
            .add("type", "container")
            .add("type", "config")
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(entity: &str, action: &str) -> OrchestratorEvent {
        OrchestratorEvent::new(EntityType::from(entity), action)
    }

    #[test]
    fn test_update_worthy_events() {
        for action in ["create", "start", "stop", "die", "destroy"] {
            assert!(event("container", action).is_update_worthy(), "container {action}");
        }
        for action in ["create", "update", "remove"] {
            assert!(event("service", action).is_update_worthy(), "service {action}");
        }
        for action in ["create", "remove"] {
            assert!(event("config", action).is_update_worthy(), "config {action}");
        }
    }

    #[test]
    fn test_irrelevant_events() {
        assert!(!event("container", "exec_start: sh").is_update_worthy());
        assert!(!event("container", "health_status: healthy").is_update_worthy());
        assert!(!event("service", "start").is_update_worthy());
        assert!(!event("config", "update").is_update_worthy());
        assert!(!event("network", "create").is_update_worthy());
    }

    #[test]
    fn test_lifecycle_filter() {
        let filter = EventFilter::lifecycle();
        assert_eq!(filter.values("scope"), ["swarm", "local"]);
        assert_eq!(filter.values("type"), ["service", "container", "config"]);
        assert!(filter.values("label").is_empty());

        let json = serde_json::to_string(&filter).unwrap();
        assert_eq!(
            json,
            r#"{"scope":["swarm","local"],"type":["service","container","config"]}"#
        );
    }
}
