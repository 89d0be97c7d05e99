//! Parity between `proctor_core` number/string semantics and what scripts observe at run time.

use proctor::evaluate;
use proctor_core::numbers::{number_to_string, parse_int, string_to_number};
use proctor_core::strings::utf16_len;

fn script_equals(expr: &str, expected: &str) {
    let tests = format!("test('parity', () => expect({expr}).toBe({expected}))");
    let result = evaluate("", &tests, 5000);
    assert!(result.passed, "{expr} vs {expected}: {:?}", result.outcomes);
}

#[test]
fn number_formatting_matches_core() {
    for (expr, value) in [
        ("0.1 + 0.2", 0.1 + 0.2),
        ("1 / 3", 1.0 / 3.0),
        ("1e21", 1e21),
        ("-0", -0.0),
        ("123456789012", 123456789012.0),
        ("5e-7", 5e-7),
    ] {
        script_equals(&format!("String({expr})"), &format!("'{}'", number_to_string(value)));
    }
}

#[test]
fn numeric_parsing_matches_core() {
    for text in ["  42 ", "0x1F", "", "1e3", "12px", "-7.5"] {
        let core = string_to_number(text);
        let expected = if core.is_nan() { "NaN".to_string() } else { number_to_string(core) };
        script_equals(&format!("String(Number('{text}'))"), &format!("'{expected}'"));
    }
    assert_eq!(number_to_string(parse_int("12px", 10)), "12");
    script_equals("parseInt('12px', 10)", "12");
}

#[test]
fn string_length_counts_utf16_units() {
    for text in ["hello", "héllo", "😀", "a😀b"] {
        script_equals(&format!("'{text}'.length"), &utf16_len(text).to_string());
    }
}
