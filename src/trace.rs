//! Trace scope handed through to tool implementations
//!
//! The dispatcher never opens, closes or replaces the caller's span; it only
//! clones the handle so every tool sees the same scope.

use tracing::Span;

/// Opaque handle to the caller's tracing span
#[derive(Debug, Clone)]
pub struct TraceScope {
    span: Span,
}

impl TraceScope {
    pub fn new(span: Span) -> Self {
        Self { span }
    }

    /// A scope that records nothing
    pub fn none() -> Self {
        Self::new(Span::none())
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Default for TraceScope {
    fn default() -> Self {
        Self::none()
    }
}

impl From<Span> for TraceScope {
    fn from(span: Span) -> Self {
        Self::new(span)
    }
}
