//! Normalization of raw runner output into [`SuiteResult`].
//!
//! Both entry points are total: whatever they are given, they return a well-formed result.

use serde::Deserialize;

use super::{AssertionOutcome, FatalKind, SuiteResult};

/// What the sandbox hands over after a run: the harness outcomes, or the reason the run ended early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSuite {
    Completed(Vec<AssertionOutcome>),
    Fatal { kind: FatalKind, message: String },
}

/// Map harness output to the public shape.
pub fn format(raw: RawSuite) -> SuiteResult {
    match raw {
        RawSuite::Completed(outcomes) => SuiteResult::from_outcomes(outcomes),
        RawSuite::Fatal { kind, message } => SuiteResult::fatal(kind, message),
    }
}

/// Output of the legacy in-page runner: `{ passed, results, totalTests, passedTests, error }`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyOutput {
    #[serde(default)]
    results: Vec<LegacyResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyResult {
    name: String,
    passed: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Map untyped legacy runner JSON to the public shape.
///
/// The counters in the input are ignored and recomputed from `results`, so a result whose counters
/// disagree with its outcomes cannot leak through. Anything that does not have the legacy shape becomes an
/// `internal` fatal result.
pub fn format_value(value: &serde_json::Value) -> SuiteResult {
    let output = match LegacyOutput::deserialize(value) {
        Ok(output) => output,
        Err(err) => {
            tracing::warn!(error = %err, "malformed runner output");
            return SuiteResult::fatal(FatalKind::Internal, format!("Malformed runner output: {err}"));
        }
    };

    if let Some(message) = output.error {
        let kind = if output.results.first().is_some_and(|r| r.name == "Test timeout") {
            FatalKind::Timeout
        } else {
            FatalKind::Runtime
        };
        return SuiteResult::fatal(kind, message);
    }

    SuiteResult::from_outcomes(
        output
            .results
            .into_iter()
            .map(|r| AssertionOutcome {
                name: r.name,
                passed: r.passed,
                error: if r.passed { None } else { r.error },
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_completed_run() {
        let result = format(RawSuite::Completed(vec![
            AssertionOutcome::pass("a"),
            AssertionOutcome::fail("b", "Expected 1 to be 2"),
        ]));
        assert_eq!(result.total, 2);
        assert_eq!(result.failed_count, 1);
        assert!(!result.passed);
        assert_eq!(result.fatal_error, None);
    }

    #[test]
    fn test_fatal_run() {
        let result = format(RawSuite::Fatal {
            kind: FatalKind::Compile,
            message: "Unexpected end of input".into(),
        });
        assert_eq!(result.total, 0);
        assert_eq!(result.fatal_kind, Some(FatalKind::Compile));
        assert_eq!(result.outcomes[0].name, "Test execution error");
    }

    #[test]
    fn test_legacy_success() {
        let result = format_value(&json!({
            "passed": true,
            "results": [{ "name": "adds", "passed": true }],
            "totalTests": 1,
            "passedTests": 1
        }));
        assert!(result.passed);
        assert_eq!((result.total, result.passed_count), (1, 1));
    }

    #[test]
    fn test_legacy_counters_are_recomputed() {
        let result = format_value(&json!({
            "passed": true,
            "results": [{ "name": "a", "passed": false, "error": "nope" }],
            "totalTests": 7,
            "passedTests": 7
        }));
        assert!(!result.passed);
        assert_eq!((result.total, result.passed_count, result.failed_count), (1, 0, 1));
    }

    #[test]
    fn test_legacy_timeout() {
        let result = format_value(&json!({
            "passed": false,
            "results": [{ "name": "Test timeout", "passed": false, "error": "Test execution timeout" }],
            "totalTests": 0,
            "passedTests": 0,
            "error": "Test execution timeout"
        }));
        assert_eq!(result.fatal_kind, Some(FatalKind::Timeout));
        assert_eq!(result.total, 0);
    }

    #[test]
    fn test_malformed_input() {
        for value in [json!(null), json!("text"), json!({ "results": 3 }), json!({ "results": [{ "name": 1 }] })] {
            let result = format_value(&value);
            assert_eq!(result.fatal_kind, Some(FatalKind::Internal), "input: {value}");
            assert_eq!(result.total, 0);
        }
    }
}
