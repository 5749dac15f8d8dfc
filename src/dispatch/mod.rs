//! Toolset dispatch engine
//!
//! Request -> strategy (resolved once) -> concurrent fan-out -> aggregation.

mod aggregator;
mod dispatcher;
mod outcome;
mod request;
mod resolver;

pub use aggregator::ResultAggregator;
pub use dispatcher::ConcurrentDispatcher;
pub use outcome::{DispatchFailure, DispatchOutcome, ToolOutcome};
pub use request::{DispatchRequest, ToolArgument, ToolsetEvent, is_truthy};
pub use resolver::{HandlerResolver, HandlerStrategy, VersionImplementation};
