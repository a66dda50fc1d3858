use nova_types::Span;
use thiserror::Error;

/// Contract violations by the caller. User mistakes are never reported this
/// way; they become [`crate::Diagnostic`]s.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("malformed input at {span:?}: {reason}")]
    MalformedInput { reason: &'static str, span: Span },
}

impl EngineError {
    pub(crate) fn malformed(reason: &'static str, span: Span) -> Self {
        EngineError::MalformedInput { reason, span }
    }
}
