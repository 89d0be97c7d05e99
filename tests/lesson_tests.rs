//! The "Build a Frontend Framework" course, graded end to end.
//!
//! Each step's reference solution must pass its own test script, and a few known-wrong submissions must
//! fail the way a learner would see them fail.

use std::fs;
use std::path::Path;

use proctor::{Capabilities, Engine, EvaluationRequest, SuiteResult};

fn fixture(name: &str) -> String {
    let path = Path::new("tests/fixtures/lessons").join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

fn grade(request: EvaluationRequest) -> SuiteResult {
    Engine::default().evaluate_blocking(&request.with_capabilities(Capabilities::with_document()))
}

fn assert_all_passed(step: &str, result: &SuiteResult, expected_total: usize) {
    assert!(result.fatal_error.is_none(), "{step}: fatal {:?}", result.fatal_error);
    let failures: Vec<_> = result.outcomes.iter().filter(|o| !o.passed).collect();
    assert!(failures.is_empty(), "{step}: failing cases {failures:#?}");
    assert_eq!(result.total, expected_total, "{step}");
    assert!(result.passed, "{step}");
}

#[test]
fn step1_captures_top_level_element() {
    let request = EvaluationRequest::new(fixture("step1.solution.js"), fixture("step1.test.js"))
        .with_prelude(fixture("step1.framework.js"))
        .with_capture(["element"]);
    assert_all_passed("step1", &grade(request), 1);
}

#[test]
fn step1_starter_reports_the_unchanged_text() {
    let request = EvaluationRequest::new(fixture("step1.starter.js"), fixture("step1.test.js"))
        .with_prelude(fixture("step1.framework.js"))
        .with_capture(["element"]);
    let result = grade(request);
    assert!(!result.passed);
    assert_eq!(result.failed_count, 1);
    assert_eq!(
        result.outcomes[0].error.as_deref(),
        Some("Expected \"Hello World\" to be \"Hello CIT84\"")
    );
}

#[test]
fn step1_without_capture_cannot_see_element() {
    let request = EvaluationRequest::new(fixture("step1.solution.js"), fixture("step1.test.js"))
        .with_prelude(fixture("step1.framework.js"));
    let result = grade(request);
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.outcomes[0].error.as_deref(), Some("Expected undefined to be defined"));
}

#[test]
fn step2_create_element() {
    let request = EvaluationRequest::new(fixture("step2.solution.js"), fixture("step2.test.js"));
    assert_all_passed("step2", &grade(request), 4);
}

#[test]
fn step3_class_name_and_props() {
    let request = EvaluationRequest::new(fixture("step2.solution.js"), fixture("step3.test.js"));
    assert_all_passed("step3", &grade(request), 3);
}

#[test]
fn step4_event_handlers() {
    let request = EvaluationRequest::new(fixture("step5.solution.js"), fixture("step4.test.js"));
    assert_all_passed("step4", &grade(request), 4);
}

#[test]
fn step4_with_attribute_only_render_fails_click_cases() {
    let request = EvaluationRequest::new(fixture("step2.solution.js"), fixture("step4.test.js"));
    let result = grade(request);
    assert!(result.fatal_error.is_none());
    assert_eq!(result.total, 4);
    assert!(!result.passed);

    let by_name = |name: &str| {
        result
            .outcomes
            .iter()
            .find(|o| o.name == name)
            .unwrap_or_else(|| panic!("missing outcome {name}"))
    };
    let click = by_name("onClick handler is attached");
    assert!(!click.passed);
    assert_eq!(click.error.as_deref(), Some("Expected false to be true"));
    assert!(by_name("regular props still work").passed);
}

#[test]
fn step6_complete_page_on_instructor_framework() {
    let request = EvaluationRequest::new(fixture("step6.solution.js"), fixture("step6.test.js"))
        .with_prelude(fixture("step5.solution.js"));
    assert_all_passed("step6", &grade(request), 5);
}

#[test]
fn dom_tests_without_capability_fail_per_case() {
    let request = EvaluationRequest::new(fixture("step2.solution.js"), fixture("step3.test.js"));
    let result = Engine::default().evaluate_blocking(&request);
    assert!(result.fatal_error.is_none());
    assert_eq!(result.total, 3);
    assert_eq!(result.failed_count, 3);
    for outcome in &result.outcomes {
        assert_eq!(outcome.error.as_deref(), Some("document is not defined"), "{}", outcome.name);
    }
}
