//! Composite request events
//!
//! A request is a sparse mapping from tool name to arguments. A tool can be
//! absent from it, present with `null`, or present with a value, and those
//! three states mean different things to the dispatcher.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Violation;

/// The full inbound event, as handed to tools and raw handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsetEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    /// Contract version the event was built against
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// `<uri>/<version>` of the contract the data conforms to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataschema: Option<String>,
    pub data: Value,
}

impl ToolsetEvent {
    pub fn new(event_type: impl Into<String>, version: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            version: version.into(),
            source: None,
            dataschema: None,
            data,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_dataschema(mut self, dataschema: impl Into<String>) -> Self {
        self.dataschema = Some(dataschema.into());
        self
    }
}

/// JavaScript-style truthiness: `null`, `false`, `0` and `""` are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// How a tool appears in a request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolArgument<'a> {
    /// Not named by the request at all
    Absent,
    /// Named, with an explicit `null`
    Null,
    /// Named, with a value (which may still be falsy)
    Present(&'a Value),
}

impl<'a> ToolArgument<'a> {
    /// The arguments to run the tool with, or `None` when it should be skipped
    pub fn runnable(&self) -> Option<&'a Value> {
        match *self {
            Self::Present(value) if is_truthy(value) => Some(value),
            _ => None,
        }
    }
}

/// Tool name -> arguments, only for the tools the caller named
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchRequest {
    tools: BTreeMap<String, Value>,
}

impl DispatchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool to the request (builder style)
    pub fn with_tool(mut self, name: impl Into<String>, arguments: Value) -> Self {
        self.tools.insert(name.into(), arguments);
        self
    }

    /// Read a request from event data, which must be a JSON object
    pub fn from_value(data: &Value) -> Result<Self, Violation> {
        let map = data.as_object().ok_or_else(|| {
            Violation::contract(format!(
                "Toolset event data must be an object, got {}",
                type_name(data)
            ))
        })?;

        Ok(Self {
            tools: map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        })
    }

    pub fn argument(&self, name: &str) -> ToolArgument<'_> {
        match self.tools.get(name) {
            None => ToolArgument::Absent,
            Some(Value::Null) => ToolArgument::Null,
            Some(value) => ToolArgument::Present(value),
        }
    }

    /// Named tools in name order
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
