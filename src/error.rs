//! Engine-level failures.
//!
//! These never cross the public boundary as `Err`: [`EngineError::into_result`] turns each one into the
//! fatal [`SuiteResult`] shape.

use crate::report::formatter::{self, RawSuite};
use crate::report::{FatalKind, SuiteResult};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// A source unit was rejected before anything ran.
    #[error("Code validation failed: {message}")]
    Policy { rule: String, message: String },
    #[error("{0}")]
    Compile(String),
    /// An exception escaped learner code or the test script outside any case.
    #[error("{0}")]
    Runtime(String),
    #[error("Test execution timeout")]
    Timeout,
    /// The host failed (thread spawn, heap exhausted, lost worker).
    #[error("{0}")]
    Internal(String),
}

impl EngineError {
    pub fn kind(&self) -> FatalKind {
        match self {
            EngineError::Policy { .. } => FatalKind::Policy,
            EngineError::Compile(_) => FatalKind::Compile,
            EngineError::Runtime(_) => FatalKind::Runtime,
            EngineError::Timeout => FatalKind::Timeout,
            EngineError::Internal(_) => FatalKind::Internal,
        }
    }

    pub fn into_result(self) -> SuiteResult {
        formatter::format(self.into())
    }
}

impl From<EngineError> for RawSuite {
    fn from(err: EngineError) -> Self {
        RawSuite::Fatal {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_message() {
        let err = EngineError::Policy {
            rule: "document-cookie".into(),
            message: "document.cookie is not allowed".into(),
        };
        let result = err.into_result();
        assert_eq!(result.fatal_error.as_deref(), Some("Code validation failed: document.cookie is not allowed"));
        assert_eq!(result.fatal_kind, Some(FatalKind::Policy));
    }

    #[test]
    fn test_timeout_message() {
        let result = EngineError::Timeout.into_result();
        assert_eq!(result.fatal_error.as_deref(), Some("Test execution timeout"));
        assert_eq!(result.outcomes[0].name, "Test timeout");
    }
}
