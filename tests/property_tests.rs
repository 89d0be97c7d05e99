//! Property-based tests for the grading engine
//!
//! Evaluation spins up a sandbox thread per call, so the engine-level properties run fewer cases than the
//! pure scanner ones.

use proctor::policy::Policy;
use proctor::{FatalKind, evaluate};
use proptest::prelude::*;

// =============================================================================
// Policy Properties
// =============================================================================

mod policy_tests {
    use super::*;

    proptest! {
        /// Property: scanning is total and only ever reports rules the policy has
        #[test]
        fn scan_never_panics(source in "\\PC{0,200}") {
            let policy = Policy::default();
            let verdict = policy.scan(&source);
            if let Some(rule) = &verdict.violated_rule {
                prop_assert!(!verdict.allowed);
                prop_assert!(policy.rules.iter().any(|r| &r.id == rule));
            } else {
                prop_assert!(verdict.allowed);
            }
        }

        /// Property: a denylisted call is caught wherever it sits in otherwise clean code
        #[test]
        fn eval_is_caught_anywhere(name in "[a-z][a-z0-9_]{0,8}", depth in 0usize..4) {
            let mut source = format!("eval('{name}')");
            for _ in 0..depth {
                source = format!("function wrap_{name}() {{ {source} }}");
            }
            let verdict = Policy::default().scan(&source);
            prop_assert_eq!(verdict.violated_rule.as_deref(), Some("eval"));
        }

        /// Property: a denylisted word inside a string literal is inert
        #[test]
        fn string_contents_are_not_screened(word in prop::sample::select(vec!["eval", "fetch", "document.cookie", "setTimeout"])) {
            let source = format!("const s = '{word}';");
            prop_assert!(Policy::default().scan(&source).allowed);
        }
    }
}

// =============================================================================
// Evaluation Properties
// =============================================================================

mod evaluation_tests {
    use super::*;

    fn object_literal(entries: &[(String, i32)]) -> String {
        let body: Vec<String> = entries.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        format!("({{ {} }})", body.join(", "))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Property: `toEqual` ignores key order
        #[test]
        fn to_equal_ignores_key_order(
            entries in prop::collection::btree_map("k[a-z]{1,4}", -1000i32..1000, 1..6)
        ) {
            let forward: Vec<(String, i32)> = entries.into_iter().collect();
            let mut backward = forward.clone();
            backward.reverse();

            let learner = format!("exports.value = () => {}", object_literal(&forward));
            let tests = format!(
                "test('same', () => expect(userCode.value()).toEqual({}))",
                object_literal(&backward)
            );
            let result = evaluate(&learner, &tests, 5000);
            prop_assert!(result.passed, "{:?}", result);
        }

        /// Property: identical inputs give identical results
        #[test]
        fn evaluation_is_idempotent(a in -100i32..100, b in -100i32..100, expected in -200i32..200) {
            let learner = "exports.add = (a, b) => a + b";
            let tests = format!("test('add', () => expect(userCode.add({a}, {b})).toBe({expected}))");
            let first = evaluate(learner, &tests, 5000);
            let second = evaluate(learner, &tests, 5000);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.passed, a + b == expected);
            prop_assert_eq!(first.total, 1);
        }

        /// Property: rejected code runs no assertions
        #[test]
        fn rejected_code_runs_nothing(
            construct in prop::sample::select(vec!["eval('1')", "fetch('/x')", "document.cookie", "new Function('')"])
        ) {
            let learner = format!("exports.x = 1; {construct};");
            let result = evaluate(&learner, "test('t', () => expect(1).toBe(1))", 5000);
            prop_assert_eq!(result.fatal_kind, Some(FatalKind::Policy));
            prop_assert_eq!(result.total, 0);
            prop_assert!(!result.passed);
        }
    }
}
