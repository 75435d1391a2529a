//! Rendered text → structured configuration adapters.

use serde_json::Value;

use crate::error::AdaptError;
use crate::state::StructuredConfig;

/// Result of a successful adaptation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptOutput {
    pub config: StructuredConfig,
    /// Non-fatal remarks about the input.
    pub warnings: Vec<String>,
}

/// Pure conversion from rendered text to the structured document proxies load.
pub trait Adapter: Send + Sync {
    fn adapt(&self, rendered: &[u8]) -> Result<AdaptOutput, AdaptError>;
}

/// Adapter for generators that already render JSON.
///
/// Validates the document and re-serialises it compactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAdapter;

impl Adapter for JsonAdapter {
    fn adapt(&self, rendered: &[u8]) -> Result<AdaptOutput, AdaptError> {
        let document: Value = serde_json::from_slice(rendered)?;

        let root = match &document {
            Value::Object(map) => map,
            Value::Array(_) => return Err(AdaptError::NotAnObject("array")),
            Value::String(_) => return Err(AdaptError::NotAnObject("string")),
            Value::Number(_) => return Err(AdaptError::NotAnObject("number")),
            Value::Bool(_) => return Err(AdaptError::NotAnObject("boolean")),
            Value::Null => return Err(AdaptError::NotAnObject("null")),
        };

        let mut warnings = Vec::new();
        if !root.contains_key("apps") {
            warnings.push("configuration defines no apps".to_string());
        }

        Ok(AdaptOutput {
            config: StructuredConfig::new(serde_json::to_vec(&document)?),
            warnings,
        })
    }
}
