//! Concurrent fan-out of one composite request
//!
//! Every requested tool with a truthy argument runs on its own spawned task.
//! The dispatcher waits for all of them, except when one raises a violation:
//! then it returns at once. Siblings still in flight are detached, not aborted;
//! they run to completion and whatever they produce is dropped.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::task::JoinError;

use crate::error::ToolError;
use crate::tools::{ToolInvocation, ToolMap, ToolRegistry};
use crate::trace::TraceScope;

use super::outcome::{DispatchFailure, ToolOutcome};
use super::request::{DispatchRequest, ToolsetEvent};

/// Runs the tool map of one contract version
#[derive(Debug, Clone)]
pub struct ConcurrentDispatcher {
    registry: ToolRegistry,
    tools: ToolMap,
    default_tool_units: f64,
}

impl ConcurrentDispatcher {
    /// `tools` must implement exactly the tools `registry` declares, as
    /// checked by `HandlerResolver`
    pub(crate) fn new(registry: ToolRegistry, tools: ToolMap) -> Self {
        Self {
            registry,
            tools,
            default_tool_units: 0.0,
        }
    }

    /// Cost charged for a successful tool that reports none of its own
    pub fn with_default_tool_units(mut self, units: f64) -> Self {
        self.default_tool_units = units;
        self
    }

    /// Produce one outcome per requested tool name.
    ///
    /// On a fatal outcome the returned map holds it alongside whatever had
    /// already settled; outcomes still pending at that point are never seen.
    pub async fn dispatch(
        &self,
        request: &DispatchRequest,
        event: Arc<ToolsetEvent>,
        trace: &TraceScope,
    ) -> BTreeMap<String, ToolOutcome> {
        let mut outcomes = BTreeMap::new();
        let mut pending = FuturesUnordered::new();

        for name in request.tool_names() {
            // Tool maps implement exactly the declared tools, so a missing
            // handler means the name is not in the registry
            let Some(handler) = self.tools.get(name).cloned() else {
                let failure = DispatchFailure::UnknownTool {
                    tool: name.to_string(),
                    available: self.registry.available_tools(),
                };
                tracing::warn!(parent: trace.span(), tool = %name, "{}", failure);
                outcomes.insert(name.to_string(), failure.into());
                continue;
            };

            let Some(arguments) = request.argument(name).runnable() else {
                tracing::debug!(
                    parent: trace.span(),
                    tool = %name,
                    "Skipping tool with falsy arguments"
                );
                outcomes.insert(name.to_string(), ToolOutcome::Skipped);
                continue;
            };

            let invocation = ToolInvocation {
                arguments: arguments.clone(),
                event: Arc::clone(&event),
                trace: trace.clone(),
            };

            tracing::debug!(parent: trace.span(), tool = %name, "Dispatching tool");
            let handle = tokio::spawn(async move { handler.call(invocation).await });

            let tool_name = name.to_string();
            pending.push(async move { (tool_name, handle.await) });
        }

        while let Some((name, joined)) = pending.next().await {
            let outcome = match joined {
                Ok(Ok(output)) => ToolOutcome::Success {
                    data: output.data,
                    execution_units: output.execution_units.unwrap_or(self.default_tool_units),
                },
                Ok(Err(ToolError::Violation(cause))) => {
                    tracing::error!(
                        parent: trace.span(),
                        tool = %name,
                        error = %cause,
                        "Tool raised a violation"
                    );
                    if !pending.is_empty() {
                        tracing::warn!(
                            parent: trace.span(),
                            in_flight = pending.len(),
                            "Detaching in-flight tools; their results will be discarded"
                        );
                    }
                    outcomes.insert(
                        name.clone(),
                        ToolOutcome::FatalFailure {
                            tool_name: name,
                            cause,
                        },
                    );
                    return outcomes;
                }
                Ok(Err(ToolError::Failed(message))) => DispatchFailure::Execution {
                    tool: name.clone(),
                    message,
                }
                .into(),
                Err(join_error) => DispatchFailure::Execution {
                    tool: name.clone(),
                    message: join_failure_message(join_error),
                }
                .into(),
            };

            if let ToolOutcome::RecoverableFailure { message, .. } = &outcome {
                tracing::warn!(parent: trace.span(), tool = %name, "{}", message);
            }
            outcomes.insert(name, outcome);
        }

        outcomes
    }
}

fn join_failure_message(error: JoinError) -> String {
    if error.is_panic() {
        panic_message(error.into_panic())
    } else {
        "task was cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
