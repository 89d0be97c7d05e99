//! End-to-end grading through the public entry points.

use std::time::{Duration, Instant};

use proctor::{Engine, EngineConfig, EvaluationRequest, FatalKind, SuiteResult, evaluate};

fn grade(learner: &str, tests: &str) -> SuiteResult {
    evaluate(learner, tests, 5000)
}

#[test]
fn test_passing_suite() {
    let result = grade(
        "exports.add = (a,b) => a+b",
        "test('adds', () => { expect(userCode.add(2,3)).toBe(5) })",
    );
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

#[test]
fn test_syntax_error_is_fatal() {
    let result = grade("exports.add = (a,b) =>", "test('adds', () => { expect(userCode.add(2,3)).toBe(5) })");
    assert_eq!(result.fatal_kind, Some(FatalKind::Compile));
    assert_eq!(result.total, 0);
    assert!(!result.passed);
    let message = result.fatal_error.as_deref().expect("fatal message");
    assert!(message.starts_with("SyntaxError:"), "{message}");
    assert!(message.ends_with(" in learner code"), "{message}");
    assert_eq!(result.outcomes.len(), 1);
    assert_eq!(result.outcomes[0].name, "Test execution error");
}

#[test]
fn test_syntax_error_in_test_script_is_fatal() {
    let result = grade("exports.x = 1", "test('broken', () => {");
    assert_eq!(result.fatal_kind, Some(FatalKind::Compile));
    assert!(result.fatal_error.as_deref().is_some_and(|m| m.ends_with(" in test code")));
}

#[test]
fn test_mixed_suite_names_both_operands() {
    let result = grade(
        "exports.add = (a,b) => a+b",
        r#"
        test('adds', () => { expect(userCode.add(2,3)).toBe(5) })
        test('adds wrong', () => { expect(userCode.add(2,2)).toBe(5) })
        "#,
    );
    assert_eq!(result.total, 2);
    assert_eq!(result.passed_count, 1);
    assert_eq!(result.failed_count, 1);
    assert!(!result.passed);
    assert!(result.fatal_error.is_none());

    let failing = &result.outcomes[1];
    assert_eq!(failing.name, "adds wrong");
    assert_eq!(failing.error.as_deref(), Some("Expected 4 to be 5"));
}

#[test]
fn test_cookie_access_is_rejected_before_running() {
    let result = grade(
        "exports.steal = () => document.cookie",
        "test('never runs', () => { expect(true).toBe(true) })",
    );
    assert_eq!(result.fatal_kind, Some(FatalKind::Policy));
    assert_eq!(result.total, 0);
    assert!(!result.passed);
    assert_eq!(
        result.fatal_error.as_deref(),
        Some("Code validation failed: document.cookie is not allowed")
    );
    assert_eq!(result.outcomes[0].name, "Code validation failed");
}

#[test]
fn test_empty_suite_never_passes() {
    let result = grade("exports.x = 1", "// nothing to check yet");
    assert_eq!(result.total, 0);
    assert!(!result.passed);
    assert!(result.fatal_error.is_none());
    assert!(result.outcomes.is_empty());
}

#[test]
fn test_failing_case_does_not_stop_siblings() {
    let result = grade(
        "exports.div = (a, b) => { if (b === 0) throw new Error('divide by zero'); return a / b }",
        r#"
        describe('division', () => {
            it('divides', () => expect(userCode.div(6, 3)).toBe(2));
            it('rejects zero', () => expect(userCode.div(1, 0)).toBe(Infinity));
            it('still runs', () => expect(userCode.div(1, 4)).toBe(0.25));
        });
        describe('broken group', () => { throw new Error('setup failed') });
        test('after groups', () => expect([1, 2, 3]).toContain(2));
        "#,
    );
    let names: Vec<_> = result.outcomes.iter().map(|o| (o.name.as_str(), o.passed)).collect();
    assert_eq!(
        names,
        [
            ("divides", true),
            ("rejects zero", false),
            ("still runs", true),
            ("describe: broken group", false),
            ("after groups", true),
        ]
    );
    assert_eq!(result.outcomes[1].error.as_deref(), Some("divide by zero"));
}

#[test]
fn test_top_level_learner_throw_is_fatal() {
    let result = grade("throw new Error('boom')", "test('x', () => {})");
    assert_eq!(result.fatal_kind, Some(FatalKind::Runtime));
    assert_eq!(result.total, 0);
    assert!(result.fatal_error.as_deref().is_some_and(|m| m.contains("boom")));
}

#[test]
fn test_to_equal_ignores_key_order() {
    let result = grade(
        "exports.point = () => ({ b: 2, a: 1 })",
        "test('shape', () => expect(userCode.point()).toEqual({ a: 1, b: 2 }))",
    );
    assert!(result.passed, "{result:?}");
}

#[test]
fn test_evaluation_is_idempotent() {
    let learner = "let calls = 0; exports.next = () => ++calls;";
    let tests = "test('first call', () => expect(userCode.next()).toBe(1))";
    let first = grade(learner, tests);
    let second = grade(learner, tests);
    assert_eq!(first, second);
    assert!(first.passed);
}

#[test]
fn test_globals_do_not_leak_between_runs() {
    let first = grade("Math.leaked = 42", "test('set', () => expect(Math.leaked).toBe(42))");
    assert!(first.passed, "{first:?}");
    let second = grade("exports.x = 1", "test('fresh', () => expect(Math.leaked).toBeUndefined())");
    assert!(second.passed, "{second:?}");
}

#[test]
fn test_infinite_loop_times_out_within_margin() {
    let started = Instant::now();
    let result = evaluate("while (true) {}", "test('never', () => {})", 2000);
    let elapsed = started.elapsed();

    assert_eq!(result.fatal_kind, Some(FatalKind::Timeout));
    assert_eq!(result.fatal_error.as_deref(), Some("Test execution timeout"));
    assert_eq!(result.outcomes[0].name, "Test timeout");
    assert!(elapsed < Duration::from_secs(4), "took {elapsed:?}");
}

#[test]
fn test_runaway_recursion_is_reported_not_crashed() {
    let result = grade(
        "exports.f = function f(n) { return f(n + 1) }",
        "test('recurses', () => userCode.f(0))",
    );
    assert_eq!(result.total, 1);
    assert!(!result.passed);
    assert!(result.outcomes[0].error.is_some());
}

#[test]
fn test_config_timeout_is_the_default_budget() {
    let engine = Engine::new(EngineConfig::default().with_timeout_ms(100)).expect("valid config");
    let result = engine.evaluate_blocking(&EvaluationRequest::new("for (;;) {}", ""));
    assert_eq!(result.fatal_kind, Some(FatalKind::Timeout));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_evaluations_are_independent() {
    let engine = Engine::default();
    let fast = EvaluationRequest::new("exports.v = 'fast'", "test('v', () => expect(userCode.v).toBe('fast'))");
    let slow = EvaluationRequest::new("while (true) {}", "").with_timeout(Duration::from_millis(200));
    let other = EvaluationRequest::new("exports.v = 'other'", "test('v', () => expect(userCode.v).toBe('other'))");

    let (fast, slow, other) = tokio::join!(engine.evaluate(&fast), engine.evaluate(&slow), engine.evaluate(&other));
    assert!(fast.passed);
    assert!(other.passed);
    assert_eq!(slow.fatal_kind, Some(FatalKind::Timeout));
}

#[tokio::test]
async fn test_one_call_form_inside_async_context() {
    let result = grade("exports.v = 2", "test('v', () => expect(userCode.v).toBe(2))");
    assert!(result.passed, "{result:?}");

    let result = evaluate("while (true) {}", "", 100);
    assert_eq!(result.fatal_kind, Some(FatalKind::Timeout));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_engine_inside_multi_thread_runtime() {
    let request = EvaluationRequest::new("exports.v = 3", "test('v', () => expect(userCode.v).toBe(3))");
    let result = Engine::default().evaluate_blocking(&request);
    assert!(result.passed, "{result:?}");
}

#[test]
fn test_long_flat_expression_is_a_compile_error() {
    let learner = format!("exports.x = {}1", "1+".repeat(15_000));
    let result = grade(&learner, "test('x', () => expect(userCode.x).toBe(15001))");
    assert_eq!(result.fatal_kind, Some(FatalKind::Compile));
    assert_eq!(result.total, 0);
    assert!(result.fatal_error.as_deref().is_some_and(|m| m.contains("nested too deeply")), "{result:?}");
}

#[test]
fn test_contains_matches_nan() {
    let result = grade("exports.values = [1, NaN]", "test('nan', () => expect(userCode.values).toContain(NaN))");
    assert!(result.passed, "{result:?}");
}
