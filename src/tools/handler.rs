//! Handler traits implemented by integrators
//!
//! A toolset version is implemented either by one [`EventHandler`] that sees the
//! whole composite event, or by a [`ToolMap`] with one [`ToolHandler`] per tool.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dispatch::{DispatchOutcome, ToolsetEvent};
use crate::error::ToolError;
use crate::trace::TraceScope;

/// Reserved output field carrying a tool's own execution cost
pub const EXECUTION_UNITS_FIELD: &str = "__executionunits";

/// What a tool implementation is called with
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// This tool's arguments, taken from the composite request
    pub arguments: Value,
    /// The complete request event
    pub event: Arc<ToolsetEvent>,
    /// Caller's trace scope, passed through untouched
    pub trace: TraceScope,
}

impl ToolInvocation {
    /// Deserialize the arguments into a typed struct
    pub fn arguments_as<T: DeserializeOwned>(&self) -> Result<T, ToolError> {
        Ok(serde_json::from_value(self.arguments.clone())?)
    }
}

/// What a raw event handler is called with
#[derive(Debug, Clone)]
pub struct EventInvocation {
    pub event: Arc<ToolsetEvent>,
    pub trace: TraceScope,
}

/// Payload returned by a tool, with its optional cost split out
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub data: Value,
    pub execution_units: Option<f64>,
}

impl ToolOutput {
    /// Wrap a payload, lifting a numeric `__executionunits` field out of it
    pub fn new(mut data: Value) -> Self {
        let execution_units = match data.as_object_mut() {
            Some(map) => map.remove(EXECUTION_UNITS_FIELD).and_then(|v| v.as_f64()),
            None => None,
        };
        Self { data, execution_units }
    }

    /// Set an explicit execution cost for this invocation
    pub fn with_execution_units(mut self, units: f64) -> Self {
        self.execution_units = Some(units);
        self
    }
}

impl From<Value> for ToolOutput {
    fn from(data: Value) -> Self {
        Self::new(data)
    }
}

/// One tool's implementation
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, invocation: ToolInvocation) -> Result<ToolOutput, ToolError>;
}

#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Fn(ToolInvocation) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ToolOutput, ToolError>> + Send + 'static,
{
    async fn call(&self, invocation: ToolInvocation) -> Result<ToolOutput, ToolError> {
        (self)(invocation).await
    }
}

/// Full control over a composite event: no per-tool routing is applied
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, invocation: EventInvocation) -> Result<DispatchOutcome, ToolError>;
}

#[async_trait]
impl<F, Fut> EventHandler for F
where
    F: Fn(EventInvocation) -> Fut + Send + Sync,
    Fut: Future<Output = Result<DispatchOutcome, ToolError>> + Send + 'static,
{
    async fn handle(&self, invocation: EventInvocation) -> Result<DispatchOutcome, ToolError> {
        (self)(invocation).await
    }
}

/// Tool name -> implementation for one version
#[derive(Clone, Default)]
pub struct ToolMap {
    tools: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl ToolMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool implementation (builder style)
    pub fn tool(mut self, name: impl Into<String>, handler: impl ToolHandler + 'static) -> Self {
        self.insert(name, Arc::new(handler));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, handler: Arc<dyn ToolHandler>) {
        self.tools.insert(name.into(), handler);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl fmt::Debug for ToolMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tools.keys()).finish()
    }
}
