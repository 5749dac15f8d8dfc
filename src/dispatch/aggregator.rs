//! Folding tool outcomes into one batch outcome

use std::collections::BTreeMap;

use serde_json::Map;

use crate::error::Violation;

use super::outcome::{DispatchOutcome, ToolOutcome};

/// Merges per-tool outcomes and accumulates execution cost
#[derive(Debug, Clone, Copy)]
pub struct ResultAggregator {
    base_units: f64,
}

impl ResultAggregator {
    pub fn new(base_units: f64) -> Self {
        Self { base_units }
    }

    pub fn base_units(&self) -> f64 {
        self.base_units
    }

    /// Precedence: a violation beats everything, then the first recoverable
    /// failure (by tool name), then the merged successes.
    pub fn aggregate(
        &self,
        outcomes: BTreeMap<String, ToolOutcome>,
    ) -> Result<DispatchOutcome, Violation> {
        if let Some(cause) = outcomes.values().find_map(|outcome| match outcome {
            ToolOutcome::FatalFailure { cause, .. } => Some(cause.clone()),
            _ => None,
        }) {
            return Err(cause);
        }

        if let Some(message) = outcomes.values().find_map(|outcome| match outcome {
            ToolOutcome::RecoverableFailure { message, .. } => Some(message.clone()),
            _ => None,
        }) {
            return Ok(DispatchOutcome::BatchFailed {
                error_message: message,
                execution_units: self.base_units,
            });
        }

        let mut data = Map::new();
        let mut execution_units = self.base_units;
        for (name, outcome) in outcomes {
            if let ToolOutcome::Success {
                data: payload,
                execution_units: units,
            } = outcome
            {
                // Negative or NaN costs must not pull the total below base
                execution_units += units.max(0.0);
                data.insert(name, payload);
            }
        }

        Ok(DispatchOutcome::Completed { data, execution_units })
    }
}
