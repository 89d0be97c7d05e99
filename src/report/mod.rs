//! The public result shape and the code that produces it.
//!
//! ## Modules
//!
//! - `formatter` - harness output and legacy runner JSON to [`SuiteResult`]
//! - `sanitize` - escaping for engine text embedded in documents

pub mod formatter;
pub mod sanitize;

use serde::{Deserialize, Serialize};

/// Outcome of one `test`/`it` case, or of a `describe` block that threw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionOutcome {
    pub name: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssertionOutcome {
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            error: None,
        }
    }

    pub fn fail(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            error: Some(error.into()),
        }
    }
}

/// Which stage produced a fatal result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatalKind {
    Policy,
    Compile,
    Runtime,
    Timeout,
    Internal,
}

/// Canonical result of one evaluation.
///
/// Without a fatal error, `total` is the number of outcomes. With one, `outcomes` holds a single synthetic
/// failing entry and `total` is zero. `passed` holds only when at least one case ran and none failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteResult {
    pub passed: bool,
    pub total: usize,
    pub passed_count: usize,
    pub failed_count: usize,
    pub outcomes: Vec<AssertionOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatal_kind: Option<FatalKind>,
}

impl SuiteResult {
    /// A result from completed cases.
    pub fn from_outcomes(outcomes: Vec<AssertionOutcome>) -> Self {
        let passed_count = outcomes.iter().filter(|o| o.passed).count();
        let failed_count = outcomes.len() - passed_count;
        Self {
            passed: failed_count == 0 && !outcomes.is_empty(),
            total: outcomes.len(),
            passed_count,
            failed_count,
            outcomes,
            fatal_error: None,
            fatal_kind: None,
        }
    }

    /// A fatal result: no cases count, one synthetic failing entry carries the message.
    pub fn fatal(kind: FatalKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let name = match kind {
            FatalKind::Timeout => "Test timeout",
            FatalKind::Policy => "Code validation failed",
            FatalKind::Compile | FatalKind::Runtime | FatalKind::Internal => "Test execution error",
        };
        Self {
            passed: false,
            total: 0,
            passed_count: 0,
            failed_count: 0,
            outcomes: vec![AssertionOutcome::fail(name, message.clone())],
            fatal_error: Some(message),
            fatal_kind: Some(kind),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal_error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_cases_is_not_a_pass() {
        let result = SuiteResult::from_outcomes(Vec::new());
        assert_eq!(result.total, 0);
        assert!(!result.passed);
    }

    #[test]
    fn test_counts() {
        let result = SuiteResult::from_outcomes(vec![
            AssertionOutcome::pass("a"),
            AssertionOutcome::fail("b", "Expected 4 to be 5"),
        ]);
        assert_eq!((result.total, result.passed_count, result.failed_count), (2, 1, 1));
        assert!(!result.passed);
    }

    #[test]
    fn test_fatal_shape() {
        let result = SuiteResult::fatal(FatalKind::Timeout, "Test execution timeout");
        assert_eq!(result.total, 0);
        assert_eq!(result.outcomes.len(), 1);
        assert_eq!(result.outcomes[0].name, "Test timeout");
        assert!(result.is_fatal());
    }

    #[test]
    fn test_serialized_shape() {
        let result = SuiteResult::from_outcomes(vec![AssertionOutcome::pass("adds")]);
        insta::assert_json_snapshot!(result, @r#"
        {
          "passed": true,
          "total": 1,
          "passedCount": 1,
          "failedCount": 0,
          "outcomes": [
            {
              "name": "adds",
              "passed": true
            }
          ]
        }
        "#);
    }
}
