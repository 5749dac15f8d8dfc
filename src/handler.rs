//! Toolset - binds a contract, a base cost and an implementation
//!
//! Built once per contract; `execute` can then be called concurrently from any
//! number of tasks. Nothing is shared between invocations except the
//! read-only contract and the resolved handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contract::{SemanticVersion, ToolsetContract};
use crate::dispatch::{
    ConcurrentDispatcher, DispatchOutcome, DispatchRequest, HandlerResolver, HandlerStrategy,
    ResultAggregator, ToolsetEvent, VersionImplementation,
};
use crate::error::{Result, ToolError, ToolsetError, Violation};
use crate::tools::{EventHandler, EventInvocation};
use crate::trace::TraceScope;

/// Reply handed back for envelope construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsetReply {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
    #[serde(rename = "executionunits")]
    pub execution_units: f64,
}

enum Execution {
    Raw(BTreeMap<SemanticVersion, Arc<dyn EventHandler>>),
    ToolMap(BTreeMap<SemanticVersion, ConcurrentDispatcher>),
}

/// A contract together with its resolved implementation
pub struct Toolset {
    contract: Arc<ToolsetContract>,
    aggregator: ResultAggregator,
    strategy: HandlerStrategy,
    execution: Execution,
}

impl Toolset {
    pub fn builder(contract: ToolsetContract) -> ToolsetBuilder {
        ToolsetBuilder {
            contract,
            execution_units: 0.0,
            default_tool_units: 0.0,
            implementations: Vec::new(),
        }
    }

    pub fn contract(&self) -> &ToolsetContract {
        &self.contract
    }

    /// Base cost charged for every invocation
    pub fn execution_units(&self) -> f64 {
        self.aggregator.base_units()
    }

    pub fn strategy(&self) -> &HandlerStrategy {
        &self.strategy
    }

    /// Run one composite request and wrap the outcome into a reply.
    ///
    /// Violations are returned as `Err`; they are never turned into replies.
    pub async fn execute(&self, event: ToolsetEvent, trace: TraceScope) -> Result<ToolsetReply> {
        let outcome = self.dispatch(event, trace).await?;
        Ok(self.reply(outcome))
    }

    /// Run one composite request, returning the bare outcome
    pub async fn dispatch(
        &self,
        event: ToolsetEvent,
        trace: TraceScope,
    ) -> Result<DispatchOutcome> {
        let accepts = self.contract.accepts_event_type();
        if event.event_type != accepts {
            return Err(Violation::contract(format!(
                "Event type '{}' does not match contract type '{}'",
                event.event_type, accepts
            ))
            .into());
        }

        let version: SemanticVersion = event
            .version
            .parse()
            .map_err(|_| ToolsetError::UnsupportedVersion(event.version.clone()))?;
        let event = Arc::new(event);

        match &self.execution {
            Execution::Raw(handlers) => {
                let handler = handlers
                    .get(&version)
                    .ok_or_else(|| ToolsetError::UnsupportedVersion(version.to_string()))?;

                log::debug!("Handing {} v{} to raw handler", self.contract.name(), version);
                let invocation = EventInvocation { event, trace };
                match handler.handle(invocation).await {
                    Ok(outcome) => Ok(outcome),
                    Err(ToolError::Violation(violation)) => Err(violation.into()),
                    Err(ToolError::Failed(message)) => {
                        log::warn!("Raw handler for {} failed: {}", self.contract.name(), message);
                        Ok(DispatchOutcome::BatchFailed {
                            error_message: message,
                            execution_units: self.aggregator.base_units(),
                        })
                    }
                }
            }
            Execution::ToolMap(dispatchers) => {
                let dispatcher = dispatchers
                    .get(&version)
                    .ok_or_else(|| ToolsetError::UnsupportedVersion(version.to_string()))?;

                let request = DispatchRequest::from_value(&event.data)?;
                log::debug!(
                    "Dispatching {} tool(s) for {} v{}: {:?}",
                    request.len(),
                    self.contract.name(),
                    version,
                    request.tool_names()
                );

                let outcomes = dispatcher.dispatch(&request, Arc::clone(&event), &trace).await;
                let outcome = self.aggregator.aggregate(outcomes).inspect_err(|violation| {
                    log::error!("Aborting {} batch: {}", self.contract.name(), violation);
                })?;
                Ok(outcome)
            }
        }
    }

    /// Wrap an outcome in the contract's complete or system-error type
    pub fn reply(&self, outcome: DispatchOutcome) -> ToolsetReply {
        match outcome {
            DispatchOutcome::Completed { data, execution_units } => ToolsetReply {
                event_type: self.contract.complete_event_type(),
                data: Value::Object(data),
                execution_units,
            },
            DispatchOutcome::BatchFailed {
                error_message,
                execution_units,
            } => ToolsetReply {
                event_type: self.contract.system_error_event_type(),
                data: serde_json::json!({ "errorMessage": error_message }),
                execution_units,
            },
        }
    }
}

/// Collects the implementation for each version before resolving it
pub struct ToolsetBuilder {
    contract: ToolsetContract,
    execution_units: f64,
    default_tool_units: f64,
    implementations: Vec<(String, VersionImplementation)>,
}

impl ToolsetBuilder {
    /// Base cost charged for every invocation
    pub fn execution_units(mut self, units: f64) -> Self {
        self.execution_units = units;
        self
    }

    /// Cost of a successful tool that does not report its own
    pub fn default_tool_units(mut self, units: f64) -> Self {
        self.default_tool_units = units;
        self
    }

    /// Register the implementation of one contract version
    pub fn version(
        mut self,
        version: impl Into<String>,
        implementation: impl Into<VersionImplementation>,
    ) -> Self {
        self.implementations.push((version.into(), implementation.into()));
        self
    }

    /// Register a raw event handler for one contract version
    pub fn handler(self, version: impl Into<String>, handler: impl EventHandler + 'static) -> Self {
        self.version(version, VersionImplementation::handler(handler))
    }

    pub fn build(self) -> Result<Toolset> {
        for (label, units) in [
            ("execution units", self.execution_units),
            ("default tool units", self.default_tool_units),
        ] {
            if !units.is_finite() || units < 0.0 {
                return Err(ToolsetError::Configuration(format!(
                    "{} must be a non-negative number, got {}",
                    label, units
                )));
            }
        }

        let strategy = HandlerResolver::new(&self.contract).resolve(self.implementations)?;

        let execution = match &strategy {
            HandlerStrategy::Raw(handlers) => Execution::Raw(handlers.clone()),
            HandlerStrategy::ToolMap(maps) => {
                let mut dispatchers = BTreeMap::new();
                for (version, tools) in maps {
                    let registry = self
                        .contract
                        .version(version)
                        .map(|v| v.registry().clone())
                        .ok_or_else(|| {
                            ToolsetError::Configuration(format!("Unknown version {}", version))
                        })?;
                    let dispatcher = ConcurrentDispatcher::new(registry, tools.clone())
                        .with_default_tool_units(self.default_tool_units);
                    dispatchers.insert(*version, dispatcher);
                }
                Execution::ToolMap(dispatchers)
            }
        };

        log::info!(
            "Built toolset {} ({}, versions: {:?})",
            self.contract.name(),
            strategy.kind(),
            strategy.versions()
        );

        Ok(Toolset {
            contract: Arc::new(self.contract),
            aggregator: ResultAggregator::new(self.execution_units),
            strategy,
            execution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolInvocation, ToolMap, ToolOutput, ToolSpec};
    use serde_json::json;

    fn contract() -> ToolsetContract {
        ToolsetContract::builder("#/agent/test/contract", "test.tools")
            .version(
                "1.0.0",
                vec![
                    ToolSpec::new("add", "Adds two numbers"),
                    ToolSpec::new("multiply", "Multiplies"),
                ],
            )
            .build()
            .unwrap()
    }

    async fn add(inv: ToolInvocation) -> std::result::Result<ToolOutput, ToolError> {
        let a = inv.arguments["a"].as_i64().unwrap_or_default();
        let b = inv.arguments["b"].as_i64().unwrap_or_default();
        Ok(ToolOutput::new(json!({"sum": a + b})))
    }

    async fn multiply(inv: ToolInvocation) -> std::result::Result<ToolOutput, ToolError> {
        let a = inv.arguments["a"].as_i64().unwrap_or_default();
        let b = inv.arguments["b"].as_i64().unwrap_or_default();
        Ok(ToolOutput::new(json!({"product": a * b})).with_execution_units(2.0))
    }

    fn toolset() -> Toolset {
        Toolset::builder(contract())
            .execution_units(1.0)
            .version("1.0.0", ToolMap::new().tool("add", add).tool("multiply", multiply))
            .build()
            .unwrap()
    }

    fn event(data: Value) -> ToolsetEvent {
        ToolsetEvent::new("arvo.agent.toolset.test.tools", "1.0.0", data)
    }

    #[tokio::test]
    async fn test_execute_completed_reply() {
        let reply = toolset()
            .execute(event(json!({"add": {"a": 2, "b": 3}})), TraceScope::none())
            .await
            .unwrap();

        assert_eq!(reply.event_type, "arvo.agent.toolset.test.tools.done");
        assert_eq!(reply.data, json!({"add": {"sum": 5}}));
        assert_eq!(reply.execution_units, 1.0);
    }

    #[tokio::test]
    async fn test_execute_system_error_reply() {
        let reply = toolset()
            .execute(event(json!({"divide": {"a": 1, "b": 0}})), TraceScope::none())
            .await
            .unwrap();

        assert_eq!(reply.event_type, "sys.arvo.agent.toolset.test.tools.error");
        assert_eq!(
            reply.data,
            json!({"errorMessage": "Tool 'divide' not found. Available tools: add, multiply"})
        );
        assert_eq!(reply.execution_units, 1.0);
    }

    #[tokio::test]
    async fn test_reply_serializes_wire_field_names() {
        let reply = toolset().execute(event(json!({})), TraceScope::none()).await.unwrap();
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "arvo.agent.toolset.test.tools.done",
                "data": {},
                "executionunits": 1.0
            })
        );
    }

    #[tokio::test]
    async fn test_wrong_event_type_is_contract_violation() {
        let bad = ToolsetEvent::new("arvo.agent.toolset.other", "1.0.0", json!({}));
        let err = toolset().execute(bad, TraceScope::none()).await.unwrap_err();
        assert!(matches!(
            err,
            ToolsetError::Violation(Violation {
                kind: crate::error::ViolationKind::Contract,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_non_object_data_is_contract_violation() {
        let err = toolset().execute(event(json!("add")), TraceScope::none()).await.unwrap_err();
        assert!(matches!(err, ToolsetError::Violation(_)));
    }

    #[tokio::test]
    async fn test_unsupported_version() {
        let unknown = ToolsetEvent::new("arvo.agent.toolset.test.tools", "2.0.0", json!({}));
        let err = toolset().execute(unknown, TraceScope::none()).await.unwrap_err();
        assert!(matches!(err, ToolsetError::UnsupportedVersion(v) if v == "2.0.0"));

        let garbage = ToolsetEvent::new("arvo.agent.toolset.test.tools", "one", json!({}));
        let err = toolset().execute(garbage, TraceScope::none()).await.unwrap_err();
        assert!(matches!(err, ToolsetError::UnsupportedVersion(_)));
    }

    #[tokio::test]
    async fn test_raw_handler_outcome_is_returned_unchanged() {
        async fn raw(inv: EventInvocation) -> std::result::Result<DispatchOutcome, ToolError> {
            let mut data = serde_json::Map::new();
            data.insert("echo".to_string(), inv.event.data.clone());
            Ok(DispatchOutcome::Completed {
                data,
                execution_units: 7.0,
            })
        }

        let toolset = Toolset::builder(contract())
            .execution_units(1.0)
            .handler("1.0.0", raw)
            .build()
            .unwrap();
        assert_eq!(toolset.strategy().kind(), "raw handler");

        let outcome = toolset
            .dispatch(event(json!({"anything": true})), TraceScope::none())
            .await
            .unwrap();
        assert_eq!(outcome.execution_units(), 7.0);

        let reply = toolset.reply(outcome);
        assert_eq!(reply.data, json!({"echo": {"anything": true}}));
    }

    #[tokio::test]
    async fn test_raw_handler_failures() {
        async fn failing(_: EventInvocation) -> std::result::Result<DispatchOutcome, ToolError> {
            Err(ToolError::failed("backend down"))
        }
        async fn violating(_: EventInvocation) -> std::result::Result<DispatchOutcome, ToolError> {
            Err(Violation::execution("corrupt state").into())
        }

        let toolset = Toolset::builder(contract())
            .execution_units(3.0)
            .handler("1.0.0", failing)
            .build()
            .unwrap();
        let reply = toolset.execute(event(json!({})), TraceScope::none()).await.unwrap();
        assert_eq!(reply.data, json!({"errorMessage": "backend down"}));
        assert_eq!(reply.execution_units, 3.0);

        let toolset = Toolset::builder(contract())
            .handler("1.0.0", violating)
            .build()
            .unwrap();
        let err = toolset.execute(event(json!({})), TraceScope::none()).await.unwrap_err();
        assert_eq!(err.to_string(), "ViolationError<Execution> corrupt state");
    }

    #[test]
    fn test_build_without_versions_fails() {
        let result = Toolset::builder(contract()).execution_units(1.0).build();
        assert!(matches!(result, Err(ToolsetError::Configuration(_))));
    }

    #[test]
    fn test_build_rejects_negative_units() {
        let result = Toolset::builder(contract())
            .execution_units(-1.0)
            .version("1.0.0", ToolMap::new().tool("add", add).tool("multiply", multiply))
            .build();
        assert!(matches!(result, Err(ToolsetError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_concurrent_batches_share_toolset() {
        let toolset = Arc::new(toolset());

        let mut handles = Vec::new();
        for i in 0..8 {
            let toolset = Arc::clone(&toolset);
            handles.push(tokio::spawn(async move {
                toolset
                    .execute(event(json!({"add": {"a": i, "b": 1}})), TraceScope::none())
                    .await
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            let reply = handle.await.unwrap().unwrap();
            assert_eq!(reply.data, json!({"add": {"sum": i as i64 + 1}}));
            assert_eq!(reply.execution_units, 1.0);
        }
    }
}
