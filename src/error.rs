//! Error types for toolsets
//!
//! Centralized error handling using thiserror. Tool implementations raise
//! [`ToolError`]; everything that can escape the crate is a [`ToolsetError`].

use std::fmt;

use thiserror::Error;

/// Which part of the system a violation was detected in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// A tool detected a condition it must not mask (e.g. a broken invariant)
    Execution,
    /// An event or payload breached the toolset contract
    Contract,
    /// The toolset was wired up against the wrong configuration
    Config,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Execution => "Execution",
            Self::Contract => "Contract",
            Self::Config => "Config",
        };
        f.write_str(label)
    }
}

/// A condition that must abort the whole batch instead of being reported per tool
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ViolationError<{kind}> {message}")]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn execution(message: impl Into<String>) -> Self {
        Self {
            kind: ViolationKind::Execution,
            message: message.into(),
        }
    }

    pub fn contract(message: impl Into<String>) -> Self {
        Self {
            kind: ViolationKind::Contract,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self {
            kind: ViolationKind::Config,
            message: message.into(),
        }
    }
}

/// Error raised by a tool or raw event handler implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// Fatal: propagates past the dispatcher unmodified
    #[error(transparent)]
    Violation(#[from] Violation),

    /// Ordinary failure: reported as a system error reply
    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    /// Ordinary, recoverable failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Failed(err.to_string())
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        Self::Failed(err.to_string())
    }
}

/// Closed set of error classes the toolset distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Aborts the whole handler invocation
    Fatal,
    /// The request was rejected; the toolset itself is sound
    Recoverable,
    /// Integrator misconfiguration, raised at construction time
    Configuration,
}

/// All error types that can escape a toolset
#[derive(Debug, Error)]
pub enum ToolsetError {
    /// Toolset wired up incorrectly
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Contract definition is invalid
    #[error("Contract error: {0}")]
    Contract(String),

    /// Request names a version that has no implementation
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    /// Fatal condition raised during dispatch
    #[error(transparent)]
    Violation(#[from] Violation),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ToolsetError {
    /// Violations abort the invocation; a request for an unimplemented
    /// version can be retried against another; everything else is a setup
    /// problem (including failures to load a contract file)
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Violation(_) => ErrorClass::Fatal,
            Self::UnsupportedVersion(_) => ErrorClass::Recoverable,
            Self::Configuration(_)
            | Self::Contract(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Yaml(_) => ErrorClass::Configuration,
        }
    }
}

/// Result type alias for toolset operations
pub type Result<T> = std::result::Result<T, ToolsetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_display() {
        let err = Violation::execution("Add failed");
        assert_eq!(err.to_string(), "ViolationError<Execution> Add failed");

        let err = Violation::contract("bad payload");
        assert_eq!(err.to_string(), "ViolationError<Contract> bad payload");
    }

    #[test]
    fn test_tool_error_is_transparent_over_violation() {
        let err: ToolError = Violation::config("missing key").into();
        assert!(matches!(err, ToolError::Violation(_)));
        assert_eq!(err.to_string(), "ViolationError<Config> missing key");
    }

    #[test]
    fn test_tool_error_failed() {
        let err = ToolError::failed("Add failed");
        assert!(matches!(err, ToolError::Failed(_)));
        assert_eq!(err.to_string(), "Add failed");
    }

    #[test]
    fn test_json_error_is_recoverable_for_tools() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: ToolError = json_err.into();
        assert!(matches!(err, ToolError::Failed(_)));
    }

    #[test]
    fn test_configuration_error() {
        let err = ToolsetError::Configuration("no versions".to_string());
        assert_eq!(err.to_string(), "Configuration error: no versions");
        assert_eq!(err.class(), ErrorClass::Configuration);
    }

    #[test]
    fn test_violation_conversion_keeps_message() {
        let err: ToolsetError = Violation::execution("boom").into();
        assert!(matches!(err, ToolsetError::Violation(_)));
        assert_eq!(err.class(), ErrorClass::Fatal);
        assert_eq!(err.to_string(), "ViolationError<Execution> boom");
    }

    #[test]
    fn test_unsupported_version_is_recoverable() {
        let err = ToolsetError::UnsupportedVersion("2.0.0".to_string());
        assert_eq!(err.class(), ErrorClass::Recoverable);
    }

    #[test]
    fn test_contract_loading_errors_are_configuration() {
        let yaml_err = serde_yaml::from_str::<Vec<u32>>("{not: a list}").unwrap_err();
        let err: ToolsetError = yaml_err.into();
        assert_eq!(err.class(), ErrorClass::Configuration);

        let err = ToolsetError::Contract("bad name".to_string());
        assert_eq!(err.class(), ErrorClass::Configuration);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ToolsetError = io_err.into();
        assert!(matches!(err, ToolsetError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(ToolsetError::UnsupportedVersion("9.9.9".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
