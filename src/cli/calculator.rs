//! Built-in calculator toolset used by `toolset dispatch`

use serde::Deserialize;
use serde_json::json;

use toolset::{
    ToolError, ToolInvocation, ToolMap, ToolOutput, ToolSpec, Toolset, ToolsetContract, Violation,
};

use crate::config::ToolsetSettings;

const URI: &str = "#/toolset/calculator";
const NAME: &str = "calculator";

#[derive(Debug, Deserialize)]
struct Operands {
    a: f64,
    b: f64,
}

fn binary_spec(name: &str, description: &str, output: &str) -> ToolSpec {
    ToolSpec::new(name, description)
        .with_accepts(json!({
            "type": "object",
            "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
            "required": ["a", "b"]
        }))
        .with_emits(json!({
            "type": "object",
            "properties": {output: {"type": "number"}},
            "required": [output]
        }))
}

pub fn contract() -> toolset::Result<ToolsetContract> {
    ToolsetContract::builder(URI, NAME)
        .version(
            "1.0.0",
            vec![
                binary_spec("add", "Adds two numbers", "sum"),
                binary_spec("subtract", "Subtracts b from a", "difference"),
                binary_spec("multiply", "Multiplies two numbers", "product"),
                binary_spec("divide", "Divides a by b", "quotient"),
            ],
        )
        .build()
}

pub fn build(settings: &ToolsetSettings) -> toolset::Result<Toolset> {
    Toolset::builder(contract()?)
        .execution_units(settings.execution_units)
        .default_tool_units(settings.default_tool_units)
        .version(
            "1.0.0",
            ToolMap::new()
                .tool("add", add)
                .tool("subtract", subtract)
                .tool("multiply", multiply)
                .tool("divide", divide),
        )
        .build()
}

/// Overflowing to infinity means the inputs were out of range for f64
fn finite(value: f64) -> Result<f64, ToolError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Violation::execution(format!("Result {} is not a finite number", value)).into())
    }
}

async fn add(inv: ToolInvocation) -> Result<ToolOutput, ToolError> {
    let Operands { a, b } = inv.arguments_as()?;
    Ok(ToolOutput::new(json!({ "sum": finite(a + b)? })))
}

async fn subtract(inv: ToolInvocation) -> Result<ToolOutput, ToolError> {
    let Operands { a, b } = inv.arguments_as()?;
    Ok(ToolOutput::new(json!({ "difference": finite(a - b)? })))
}

async fn multiply(inv: ToolInvocation) -> Result<ToolOutput, ToolError> {
    let Operands { a, b } = inv.arguments_as()?;
    Ok(ToolOutput::new(json!({ "product": finite(a * b)? })).with_execution_units(2.0))
}

async fn divide(inv: ToolInvocation) -> Result<ToolOutput, ToolError> {
    let Operands { a, b } = inv.arguments_as()?;
    if b == 0.0 {
        return Err(ToolError::failed("Division by zero"));
    }
    Ok(ToolOutput::new(json!({ "quotient": finite(a / b)? })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolset::{ToolsetError, ToolsetEvent, TraceScope};

    fn event(data: serde_json::Value) -> ToolsetEvent {
        ToolsetEvent::new("arvo.agent.toolset.calculator", "1.0.0", data)
    }

    #[test]
    fn test_contract_declares_four_tools() {
        let contract = contract().unwrap();
        let latest = contract.latest().unwrap();
        assert_eq!(latest.registry().names(), vec!["add", "divide", "multiply", "subtract"]);
    }

    #[tokio::test]
    async fn test_dispatch_mixed_batch() {
        let toolset = build(&ToolsetSettings::default()).unwrap();
        let reply = toolset
            .execute(
                event(json!({
                    "add": {"a": 2, "b": 3},
                    "multiply": {"a": 4, "b": 5},
                    "divide": null
                })),
                TraceScope::none(),
            )
            .await
            .unwrap();

        assert_eq!(reply.event_type, "arvo.agent.toolset.calculator.done");
        assert_eq!(reply.data, json!({"add": {"sum": 5.0}, "multiply": {"product": 20.0}}));
        assert_eq!(reply.execution_units, 3.0);
    }

    #[tokio::test]
    async fn test_divide_by_zero_is_recoverable() {
        let toolset = build(&ToolsetSettings::default()).unwrap();
        let reply = toolset
            .execute(event(json!({"divide": {"a": 1, "b": 0}})), TraceScope::none())
            .await
            .unwrap();

        assert_eq!(reply.event_type, "sys.arvo.agent.toolset.calculator.error");
        assert_eq!(reply.data["errorMessage"], "Tool 'divide' execution failure: Division by zero");
    }

    #[tokio::test]
    async fn test_malformed_operands_are_recoverable() {
        let toolset = build(&ToolsetSettings::default()).unwrap();
        let reply = toolset
            .execute(event(json!({"subtract": {"a": "ten"}})), TraceScope::none())
            .await
            .unwrap();

        let message = reply.data["errorMessage"].as_str().unwrap();
        assert!(message.starts_with("Tool 'subtract' execution failure:"));
    }

    #[tokio::test]
    async fn test_overflow_is_a_violation() {
        let toolset = build(&ToolsetSettings::default()).unwrap();
        let err = toolset
            .execute(event(json!({"multiply": {"a": 1e308, "b": 10}})), TraceScope::none())
            .await
            .unwrap_err();

        assert!(matches!(err, ToolsetError::Violation(_)));
    }
}
