//! Toolset - versioned bundles of tools behind one composite event
//!
//! A caller sends one event naming any number of tools with their arguments.
//! The toolset runs the requested tools concurrently, merges their results
//! into one reply, and reports a single execution cost for the batch.

pub mod contract;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod tools;
pub mod trace;

pub use contract::{
    AgentContract, SemanticVersion, ToolsetContract, VersionedAgentContract,
    VersionedToolsetContract,
};
pub use dispatch::{
    DispatchOutcome, DispatchRequest, ToolOutcome, ToolsetEvent, VersionImplementation,
};
pub use error::{ErrorClass, Result, ToolError, ToolsetError, Violation, ViolationKind};
pub use handler::{Toolset, ToolsetBuilder, ToolsetReply};
pub use tools::{
    EventHandler, EventInvocation, ToolHandler, ToolInvocation, ToolMap, ToolOutput, ToolRegistry,
    ToolSpec,
};
pub use trace::TraceScope;
