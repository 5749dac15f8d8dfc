//! Per-tool and per-batch outcomes

use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::Violation;

/// Recoverable reasons a single tool failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchFailure {
    #[error("Tool '{tool}' not found. Available tools: {available}")]
    UnknownTool { tool: String, available: String },

    #[error("Tool '{tool}' execution failure: {message}")]
    Execution { tool: String, message: String },
}

impl DispatchFailure {
    pub fn tool_name(&self) -> &str {
        match self {
            Self::UnknownTool { tool, .. } | Self::Execution { tool, .. } => tool,
        }
    }
}

/// What happened to one requested tool
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success { data: Value, execution_units: f64 },
    /// Requested with a falsy argument; contributes neither a key nor cost
    Skipped,
    RecoverableFailure { tool_name: String, message: String },
    FatalFailure { tool_name: String, cause: Violation },
}

impl From<DispatchFailure> for ToolOutcome {
    fn from(failure: DispatchFailure) -> Self {
        Self::RecoverableFailure {
            tool_name: failure.tool_name().to_string(),
            message: failure.to_string(),
        }
    }
}

/// Result of one batch, for the caller to wrap into a reply event
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Completed {
        data: Map<String, Value>,
        execution_units: f64,
    },
    BatchFailed {
        error_message: String,
        execution_units: f64,
    },
}

impl DispatchOutcome {
    pub fn execution_units(&self) -> f64 {
        match self {
            Self::Completed { execution_units, .. }
            | Self::BatchFailed { execution_units, .. } => *execution_units,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}
