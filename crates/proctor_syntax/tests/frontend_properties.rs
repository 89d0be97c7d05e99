//! Property-based tests for the script frontend.
//!
//! Learner submissions are arbitrary text, so the lexer and parser must return diagnostics rather than panic
//! on anything they are handed.

use proctor_syntax::{lexer, parse_source};
use proptest::prelude::*;

const FRAGMENTS: &[&str] = &[
    "let", "const", "x", "=", "=>", "(", ")", "{", "}", "[", "]", "`", "${", "'", "\"", "/", "*", "?.", "??",
    "...", ",", ";", "\n", "function", "class", "return", "1.5", "0x", "\\", "++", "new", "super", "of", "in",
];

fn fragment_soup() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..40).prop_map(|parts| parts.join(" "))
}

proptest! {
    #[test]
    fn lexer_never_panics(source in "\\PC{0,200}") {
        let _ = lexer::lex(&source);
    }

    #[test]
    fn parser_never_panics_on_token_soup(source in fragment_soup()) {
        let _ = parse_source(&source);
    }

    #[test]
    fn spans_stay_inside_source(source in fragment_soup()) {
        if let Ok(tokens) = lexer::lex(&source) {
            for token in tokens {
                prop_assert!(token.span.start <= token.span.end);
                prop_assert!(token.span.end <= source.len());
            }
        }
    }

    #[test]
    fn integer_literals_round_trip(n in 0u32..1_000_000) {
        let tokens = lexer::lex(&n.to_string()).unwrap();
        prop_assert_eq!(&tokens[0].kind, &lexer::TokenKind::Number(n as f64));
    }
}

#[test]
fn moderate_nesting_parses() {
    // Parser recursion follows source nesting; keep the fixture well inside the default test stack.
    let source = format!("{}1{}", "(".repeat(64), ")".repeat(64));
    assert!(parse_source(&source).is_ok());
}
