//! The assertion vocabulary behind `expect(actual)`.
//!
//! Every matcher returns `undefined` on success and throws an `Error` whose message names both operands on
//! failure. Operands are rendered the way `JSON.stringify` renders them, falling back to the console
//! inspector for values JSON cannot represent (cycles, `toJSON` that throws).

use std::rc::Rc;

use proctor_syntax::ast::BinaryOp;

use crate::runtime::interpreter::{ErrorType, Interpreter};
use crate::runtime::intrinsics::{inspect, json};
use crate::runtime::object::ObjectKind;
use crate::runtime::value::{ObjectId, Value, same_value_zero, strict_equals};
use crate::runtime::{Abrupt, Completion};

/// Build the `expect` function.
pub fn install(it: &mut Interpreter) -> Completion<Value> {
    let expect = it.new_native("expect", 1, |it, args| {
        let actual = args.arg(0);
        Ok(Value::Object(matcher_object(it, actual)?))
    })?;
    Ok(Value::Object(expect))
}

type Check = fn(&mut Interpreter, &Value, &Value) -> Completion<bool>;

/// Matchers taking an expected operand: `(name, verb, check)`.
const BINARY: &[(&str, &str, Check)] = &[
    ("toBe", "to be", identical),
    ("toEqual", "to equal", deep_equal),
    ("toContain", "to contain", contains),
];

type Predicate = fn(&Value) -> bool;

/// Matchers on the actual value alone.
const UNARY: &[(&str, &str, Predicate)] = &[
    ("toBeTruthy", "to be truthy", Value::truthy),
    ("toBeFalsy", "to be falsy", falsy),
    ("toBeDefined", "to be defined", defined),
    ("toBeUndefined", "to be undefined", Value::is_undefined),
    ("toBeNull", "to be null", null),
];

fn identical(_: &mut Interpreter, actual: &Value, expected: &Value) -> Completion<bool> {
    Ok(strict_equals(actual, expected))
}

fn falsy(value: &Value) -> bool {
    !value.truthy()
}

fn defined(value: &Value) -> bool {
    !value.is_undefined()
}

fn null(value: &Value) -> bool {
    matches!(value, Value::Null)
}

fn matcher_object(it: &mut Interpreter, actual: Value) -> Completion<ObjectId> {
    let matchers = it.new_object()?;
    for &(name, verb, check) in BINARY {
        let actual = actual.clone();
        it.define_method(matchers, name, 1, move |it, args| {
            let expected = args.arg(0);
            if check(it, &actual, &expected)? {
                return Ok(Value::Undefined);
            }
            let message = format!("Expected {} {verb} {}", render(it, &actual)?, render(it, &expected)?);
            Err(it.throw_error(ErrorType::Error, message))
        })?;
    }
    for &(name, verb, predicate) in UNARY {
        let actual = actual.clone();
        it.define_method(matchers, name, 0, move |it, _| {
            if predicate(&actual) {
                return Ok(Value::Undefined);
            }
            let message = format!("Expected {} {verb}", render(it, &actual)?);
            Err(it.throw_error(ErrorType::Error, message))
        })?;
    }
    for (name, verb, op) in [
        ("toBeGreaterThan", "to be greater than", BinaryOp::Gt),
        ("toBeLessThan", "to be less than", BinaryOp::Lt),
    ] {
        let actual = actual.clone();
        it.define_method(matchers, name, 1, move |it, args| {
            let expected = args.arg(0);
            if it.binary_op(op, &actual, &expected)?.truthy() {
                return Ok(Value::Undefined);
            }
            let message = format!("Expected {} {verb} {}", it.to_string(&actual)?, it.to_string(&expected)?);
            Err(it.throw_error(ErrorType::Error, message))
        })?;
    }
    Ok(matchers)
}

/// `JSON.stringify(value)` as it would appear in a template string.
fn render(it: &mut Interpreter, value: &Value) -> Completion<String> {
    match json::stringify(it, value) {
        Ok(Some(text)) => Ok(text),
        Ok(None) => Ok("undefined".to_string()),
        Err(Abrupt::Interrupt(interrupt)) => Err(Abrupt::Interrupt(interrupt)),
        Err(Abrupt::Throw(_)) => Ok(inspect(it, value)),
    }
}

fn contains(it: &mut Interpreter, actual: &Value, item: &Value) -> Completion<bool> {
    if let Some(items) = it.array_items(actual) {
        return Ok(items.iter().any(|v| same_value_zero(v, item)));
    }
    match (actual, item) {
        (Value::String(haystack), Value::String(needle)) => Ok(haystack.contains(&**needle)),
        (Value::String(haystack), other) => {
            let needle = it.to_string(other)?;
            Ok(haystack.contains(&*needle))
        }
        _ => Ok(false),
    }
}

/// Recursive structural equality.
///
/// Own enumerable keys are compared as sets, so key order never matters and a key holding `undefined` equals
/// a missing key. Functions and DOM nodes compare by identity. Comparing a structure that contains itself
/// throws instead of recursing forever.
pub fn deep_equal(it: &mut Interpreter, a: &Value, b: &Value) -> Completion<bool> {
    let mut stack = Vec::new();
    equal_values(it, a, b, &mut stack)
}

fn equal_values(it: &mut Interpreter, a: &Value, b: &Value, stack: &mut Vec<ObjectId>) -> Completion<bool> {
    if same_value_zero(a, b) {
        return Ok(true);
    }
    let (Value::Object(x), Value::Object(y)) = (a, b) else {
        return Ok(false);
    };
    if !is_structural(it, *x) || !is_structural(it, *y) {
        return Ok(false);
    }
    if stack.contains(x) || stack.contains(y) {
        return Err(it.throw_error(
            ErrorType::Error,
            "toEqual cannot compare circular structures",
        ));
    }
    it.checkpoint()?;
    stack.push(*x);
    stack.push(*y);
    let result = it.nested(|it| equal_objects(it, *x, *y, stack));
    stack.truncate(stack.len() - 2);
    result
}

/// Objects compared by content rather than identity.
fn is_structural(it: &Interpreter, id: ObjectId) -> bool {
    !matches!(
        it.heap.get(id).kind,
        ObjectKind::Function(_) | ObjectKind::Element(_) | ObjectKind::Text(_)
    )
}

fn equal_objects(it: &mut Interpreter, x: ObjectId, y: ObjectId, stack: &mut Vec<ObjectId>) -> Completion<bool> {
    let (x_array, y_array) = (it.heap.get(x).as_array().is_some(), it.heap.get(y).as_array().is_some());
    if x_array != y_array {
        return Ok(false);
    }
    let lengths = (it.heap.get(x).as_array().map(Vec::len), it.heap.get(y).as_array().map(Vec::len));
    if lengths.0 != lengths.1 {
        return Ok(false);
    }
    let (x_error, y_error) = (is_error(it, x), is_error(it, y));
    if x_error != y_error {
        return Ok(false);
    }
    if x_error {
        let same_name = same_value_zero(&it.get_property(x, "name")?, &it.get_property(y, "name")?);
        let same_message = same_value_zero(&it.get_property(x, "message")?, &it.get_property(y, "message")?);
        if !(same_name && same_message) {
            return Ok(false);
        }
    }

    let x_keys = defined_keys(it, x)?;
    let y_keys = defined_keys(it, y)?;
    if x_keys.len() != y_keys.len() {
        return Ok(false);
    }
    for (key, x_value) in x_keys {
        let Some((_, y_value)) = y_keys.iter().find(|(k, _)| *k == key) else {
            return Ok(false);
        };
        if !equal_values(it, &x_value, y_value, stack)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn is_error(it: &Interpreter, id: ObjectId) -> bool {
    matches!(it.heap.get(id).kind, ObjectKind::Error)
}

/// Own enumerable entries whose value is not `undefined`.
fn defined_keys(it: &mut Interpreter, id: ObjectId) -> Completion<Vec<(Rc<str>, Value)>> {
    let mut entries = it.own_entries(id)?;
    entries.retain(|(_, v)| !v.is_undefined());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{InterruptHandle, Limits};

    fn interpreter() -> Interpreter {
        Interpreter::new(Limits::default(), InterruptHandle::new()).expect("realm")
    }

    fn object(it: &mut Interpreter, entries: &[(&str, Value)]) -> Value {
        let id = it.new_object().expect("object");
        for (k, v) in entries {
            it.define_data(id, k, v.clone());
        }
        Value::Object(id)
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let mut it = interpreter();
        let a = object(&mut it, &[("a", 1.0.into()), ("b", 2.0.into())]);
        let b = object(&mut it, &[("b", 2.0.into()), ("a", 1.0.into())]);
        assert!(deep_equal(&mut it, &a, &b).expect("compare"));
    }

    #[test]
    fn test_undefined_keys_equal_missing_keys() {
        let mut it = interpreter();
        let a = object(&mut it, &[("a", 1.0.into()), ("b", Value::Undefined)]);
        let b = object(&mut it, &[("a", 1.0.into())]);
        assert!(deep_equal(&mut it, &a, &b).expect("compare"));
    }

    #[test]
    fn test_arrays_and_objects_differ() {
        let mut it = interpreter();
        let array = Value::Object(it.new_array(Vec::new()).expect("array"));
        let empty = object(&mut it, &[]);
        assert!(!deep_equal(&mut it, &array, &empty).expect("compare"));
    }

    #[test]
    fn test_nested_difference() {
        let mut it = interpreter();
        let inner_a = Value::Object(it.new_array(vec![1.0.into(), 2.0.into()]).expect("array"));
        let inner_b = Value::Object(it.new_array(vec![1.0.into(), 3.0.into()]).expect("array"));
        let a = object(&mut it, &[("xs", inner_a)]);
        let b = object(&mut it, &[("xs", inner_b)]);
        assert!(!deep_equal(&mut it, &a, &b).expect("compare"));
    }

    #[test]
    fn test_functions_compare_by_identity() {
        let mut it = interpreter();
        let f = Value::Object(it.new_native("f", 0, |_, _| Ok(Value::Undefined)).expect("fn"));
        let g = Value::Object(it.new_native("f", 0, |_, _| Ok(Value::Undefined)).expect("fn"));
        assert!(deep_equal(&mut it, &f, &f).expect("compare"));
        assert!(!deep_equal(&mut it, &f, &g).expect("compare"));
    }

    #[test]
    fn test_cycles_fail_closed() {
        let mut it = interpreter();
        let a = object(&mut it, &[]);
        let b = object(&mut it, &[]);
        if let (Value::Object(x), Value::Object(y)) = (&a, &b) {
            it.define_data(*x, "self", a.clone());
            it.define_data(*y, "self", b.clone());
        }
        match deep_equal(&mut it, &a, &b) {
            Err(Abrupt::Throw(error)) => {
                assert_eq!(it.thrown_message(&error), "toEqual cannot compare circular structures");
            }
            other => panic!("expected a thrown error, got {other:?}"),
        }
    }

    #[test]
    fn test_nan_equals_nan() {
        let mut it = interpreter();
        assert!(deep_equal(&mut it, &Value::Number(f64::NAN), &Value::Number(f64::NAN)).expect("compare"));
    }

    #[test]
    fn test_contains_finds_nan_and_signed_zero() {
        let mut it = interpreter();
        let items = Value::Object(it.new_array(vec![1.0.into(), Value::Number(f64::NAN), (-0.0).into()]).expect("array"));
        assert!(contains(&mut it, &items, &Value::Number(f64::NAN)).expect("contains"));
        assert!(contains(&mut it, &items, &0.0.into()).expect("contains"));
        assert!(!contains(&mut it, &items, &2.0.into()).expect("contains"));
    }
}
