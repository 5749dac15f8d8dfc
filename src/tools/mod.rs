//! Tool System - tool definitions, the per-version registry, and handler traits

mod definition;
mod handler;
mod registry;

pub use definition::ToolSpec;
pub use handler::{
    EXECUTION_UNITS_FIELD, EventHandler, EventInvocation, ToolHandler, ToolInvocation, ToolMap,
    ToolOutput,
};
pub use registry::ToolRegistry;
