//! Tool definitions
//!
//! A ToolSpec describes one tool of a contract version: its name, what it does,
//! and the JSON shapes it accepts and emits.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool declared by a contract version. Immutable once the version is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name (e.g., "add", "get-weather")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON schema of the tool's arguments
    #[serde(default = "empty_object_schema")]
    pub accepts: Value,
    /// JSON schema of the tool's output
    #[serde(default = "empty_object_schema")]
    pub emits: Value,
}

fn empty_object_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}

impl ToolSpec {
    /// Create a new tool definition with open object shapes
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            accepts: empty_object_schema(),
            emits: empty_object_schema(),
        }
    }

    /// Set input shape
    pub fn with_accepts(mut self, schema: Value) -> Self {
        self.accepts = schema;
        self
    }

    /// Set output shape
    pub fn with_emits(mut self, schema: Value) -> Self {
        self.emits = schema;
        self
    }

    /// Property names of the input shape, if it declares any
    pub fn argument_names(&self) -> Vec<&str> {
        self.accepts
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().map(|k| k.as_str()).collect())
            .unwrap_or_default()
    }
}
