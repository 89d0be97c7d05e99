//! Screening through the engine: violations in any source unit stop the run before it starts.

use proctor::{Capabilities, Engine, EngineConfig, EvaluationRequest, FatalKind};

const PASSING_TEST: &str = "test('ok', () => expect(1).toBe(1))";

fn rejected_with(engine: &Engine, request: &EvaluationRequest) -> String {
    let result = engine.evaluate_blocking(request);
    assert_eq!(result.fatal_kind, Some(FatalKind::Policy), "{result:?}");
    assert_eq!(result.total, 0);
    assert_eq!(result.passed_count, 0);
    result.fatal_error.unwrap_or_default()
}

#[test]
fn test_violation_in_test_script_is_rejected() {
    let request = EvaluationRequest::new("exports.x = 1", "test('t', () => { setTimeout(() => {}, 0) })");
    assert_eq!(
        rejected_with(&Engine::default(), &request),
        "Code validation failed: setTimeout() is not allowed"
    );
}

#[test]
fn test_violation_in_prelude_is_rejected() {
    let request = EvaluationRequest::new("exports.x = 1", PASSING_TEST).with_prelude("const s = localStorage");
    assert_eq!(
        rejected_with(&Engine::default(), &request),
        "Code validation failed: localStorage is not allowed"
    );
}

#[test]
fn test_aliased_eval_is_rejected() {
    let request = EvaluationRequest::new("const run = eval; exports.x = run('1')", PASSING_TEST);
    assert_eq!(
        rejected_with(&Engine::default(), &request),
        "Code validation failed: eval() is not allowed"
    );
}

#[test]
fn test_root_container_lookup_is_rejected_even_with_dom() {
    let request = EvaluationRequest::new("document.getElementById('root').textContent = 'hi'", PASSING_TEST)
        .with_capabilities(Capabilities::with_document());
    let message = rejected_with(&Engine::default(), &request);
    assert!(message.contains("getElementById('root')"), "{message}");
}

#[test]
fn test_denylisted_words_in_strings_and_comments_run() {
    let learner = r#"
        // never call eval or fetch here
        exports.tip = "document.cookie is off limits";
    "#;
    let tests = "test('tip', () => expect(userCode.tip).toContain('cookie'))";
    let result = Engine::default().evaluate_blocking(&EvaluationRequest::new(learner, tests));
    assert!(result.passed, "{result:?}");
}

#[test]
fn test_configured_rules_replace_defaults() {
    let config = EngineConfig::from_json(
        r#"{
            "timeout_ms": 1000,
            "policy": {
                "rules": [
                    { "id": "no-math-random", "recognizer": { "kind": "deniedMember", "object": "Math", "property": "random" },
                      "message": "Math.random() makes grading flaky" }
                ]
            }
        }"#,
    )
    .expect("valid config");
    let engine = Engine::new(config).expect("valid policy");

    let random = EvaluationRequest::new("exports.roll = () => Math.random()", PASSING_TEST);
    assert_eq!(
        rejected_with(&engine, &random),
        "Code validation failed: Math.random() makes grading flaky"
    );

    // The default denylist no longer applies; setTimeout is simply undefined at run time.
    let timer = EvaluationRequest::new("exports.x = 1", "test('t', () => { setTimeout(() => {}, 0) })");
    let result = engine.evaluate_blocking(&timer);
    assert!(result.fatal_error.is_none());
    assert_eq!(result.outcomes[0].error.as_deref(), Some("setTimeout is not defined"));
}

#[test]
fn test_duplicate_rule_ids_are_a_config_error() {
    let config = EngineConfig::from_json(
        r#"{ "policy": { "rules": [
            { "id": "a", "recognizer": { "kind": "deniedGlobal", "name": "x" }, "message": "x" },
            { "id": "a", "recognizer": { "kind": "deniedGlobal", "name": "y" }, "message": "y" }
        ] } }"#,
    )
    .expect("valid JSON");
    assert!(Engine::new(config).is_err());
}

#[test]
fn test_declaration_inside_function_does_not_unlock_global() {
    let request = EvaluationRequest::new("", "function f() { var fetch = 0 } test('t', () => { fetch('/api') })");
    assert_eq!(
        rejected_with(&Engine::default(), &request),
        "Code validation failed: fetch() is not allowed"
    );

    let request = EvaluationRequest::new("function g() { let top = 1 } top.location = 'x'", PASSING_TEST);
    assert_eq!(
        rejected_with(&Engine::default(), &request),
        "Code validation failed: Access to top window is not allowed"
    );
}

#[test]
fn test_indirect_frame_and_cookie_access_is_rejected() {
    let cases = [
        ("(window).top.location = 'x'", "window.top"),
        ("exports.c = (document).cookie", "document.cookie"),
        ("const w = window; exports.f = w.frameElement", "window.frameElement"),
        ("const { cookie } = document", "document.cookie"),
    ];
    for (learner, mentions) in cases {
        let message = rejected_with(&Engine::default(), &EvaluationRequest::new(learner, PASSING_TEST));
        assert!(message.contains(mentions), "{learner}: {message}");
    }
}
