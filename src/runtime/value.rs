//! Runtime values.
//!
//! Primitives are stored inline; every object lives on the interpreter's [`Heap`](super::object::Heap) and is
//! referenced through an [`ObjectId`]. Strings share their buffer through `Rc<str>` so copying a value never
//! copies text.

use std::fmt;
use std::rc::Rc;

use proctor_core::numbers::{number_to_string, string_to_number};

/// Opaque handle to an object on the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A script value.
#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Object(ObjectId),
}

impl Value {
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// `ToBoolean`.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => !(*n == 0.0 || n.is_nan()),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// `ToNumber` for primitives. Objects must go through the interpreter first.
    pub fn primitive_to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Object(_) => f64::NAN,
        }
    }

    /// `ToString` for primitives. Objects must go through the interpreter first.
    pub fn primitive_to_string(&self) -> Rc<str> {
        match self {
            Value::Undefined => "undefined".into(),
            Value::Null => "null".into(),
            Value::Bool(true) => "true".into(),
            Value::Bool(false) => "false".into(),
            Value::Number(n) => number_to_string(*n).into(),
            Value::String(s) => Rc::clone(s),
            Value::Object(_) => "[object Object]".into(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Object(id)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Object(id) => write!(f, "[object #{}]", id.0),
            other => f.write_str(&other.primitive_to_string()),
        }
    }
}

/// `===`
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => x == y,
        _ => false,
    }
}

/// SameValueZero: `===` except that `NaN` equals itself (`includes`, `indexOf` on NaN-aware paths).
pub fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => strict_equals(a, b),
    }
}

/// Compare two strings by UTF-16 code units, the ordering `<` uses on strings.
pub fn compare_strings(a: &str, b: &str) -> std::cmp::Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Number(0.0).truthy());
        assert!(!Value::Number(f64::NAN).truthy());
        assert!(!Value::from("").truthy());
        assert!(Value::from("0").truthy());
        assert!(Value::Object(ObjectId(0)).truthy());
    }

    #[test]
    fn test_strict_equality() {
        assert!(strict_equals(&Value::from(1.0), &Value::from(1.0)));
        assert!(!strict_equals(&Value::from(f64::NAN), &Value::from(f64::NAN)));
        assert!(same_value_zero(&Value::from(f64::NAN), &Value::from(f64::NAN)));
        assert!(!strict_equals(&Value::from("1"), &Value::from(1.0)));
        assert!(!strict_equals(&Value::Null, &Value::Undefined));
    }

    #[test]
    fn test_primitive_conversions() {
        assert_eq!(&*Value::from(0.1 + 0.2).primitive_to_string(), "0.30000000000000004");
        assert_eq!(Value::from(" 42 ").primitive_to_number(), 42.0);
        assert!(Value::Undefined.primitive_to_number().is_nan());
        assert_eq!(Value::Null.primitive_to_number(), 0.0);
    }

    #[test]
    fn test_string_ordering_uses_code_units() {
        use std::cmp::Ordering;
        assert_eq!(compare_strings("a", "b"), Ordering::Less);
        assert_eq!(compare_strings("Z", "a"), Ordering::Less);
        assert_eq!(compare_strings("ab", "a"), Ordering::Greater);
    }
}
