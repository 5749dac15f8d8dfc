//! Tool registry
//!
//! Read-only view of the tools one contract version declares. Cloning is cheap,
//! so the same registry can be shared by every concurrent batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Result, ToolsetError};

use super::definition::ToolSpec;

/// Tool name -> ToolSpec for a single contract version
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Arc<BTreeMap<String, ToolSpec>>,
}

impl ToolRegistry {
    /// Build a registry, rejecting empty and duplicate names
    pub fn from_specs(specs: impl IntoIterator<Item = ToolSpec>) -> Result<Self> {
        let mut tools = BTreeMap::new();
        for spec in specs {
            if spec.name.trim().is_empty() {
                return Err(ToolsetError::Contract("Tool name cannot be empty".to_string()));
            }
            if tools.contains_key(&spec.name) {
                return Err(ToolsetError::Contract(format!("Duplicate tool '{}'", spec.name)));
            }
            tools.insert(spec.name.clone(), spec);
        }

        Ok(Self { tools: Arc::new(tools) })
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name)
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Tool names joined for error messages
    pub fn available_tools(&self) -> String {
        self.names().join(", ")
    }

    /// Get all tools
    pub fn all(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.values()
    }

    /// Get number of tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
