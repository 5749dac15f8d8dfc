//! Event type names derived from an agent or toolset name

/// Prefix shared by every agent event type
pub const AGENT_PREFIX: &str = "arvo.agent";

/// Prefix shared by every toolset event type
pub const TOOLSET_PREFIX: &str = "arvo.agent.toolset";

/// Type of the event that starts an agent
pub fn agent_init_type(name: &str) -> String {
    format!("{}.{}", AGENT_PREFIX, name)
}

/// Type of the event an agent emits when it finishes
pub fn agent_complete_type(name: &str) -> String {
    format!("{}.done", agent_init_type(name))
}

/// Type of the composite request event
pub fn init_type(name: &str) -> String {
    format!("{}.{}", TOOLSET_PREFIX, name)
}

/// Type of the composite reply event
pub fn complete_type(name: &str) -> String {
    format!("{}.done", init_type(name))
}

/// Type of the reply emitted when a batch fails recoverably
pub fn system_error_type(name: &str) -> String {
    format!("sys.{}.error", init_type(name))
}
