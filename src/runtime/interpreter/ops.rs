//! Conversions and operators.

use std::rc::Rc;

use proctor_core::numbers::{number_to_string, to_int32, to_uint32};
use proctor_syntax::ast::BinaryOp;

use super::Interpreter;
use crate::runtime::object::{FunctionData, ObjectKind};
use crate::runtime::value::{compare_strings, strict_equals, ObjectId, Value};
use crate::runtime::Completion;

/// Hint for [`Interpreter::to_primitive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    Number,
    String,
}

impl Interpreter {
    pub fn type_of(&self, value: &Value) -> &'static str {
        match value {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(id) if self.heap.get(*id).is_callable() => "function",
            Value::Object(_) => "object",
        }
    }

    pub fn is_callable(&self, value: &Value) -> bool {
        value.as_object().is_some_and(|id| self.heap.get(id).is_callable())
    }

    pub fn to_primitive(&mut self, value: &Value, hint: PreferredType) -> Completion<Value> {
        let Value::Object(id) = value else {
            return Ok(value.clone());
        };
        let order = match hint {
            PreferredType::String => ["toString", "valueOf"],
            PreferredType::Default | PreferredType::Number => ["valueOf", "toString"],
        };
        for name in order {
            let method = self.get_property(*id, name)?;
            if self.is_callable(&method) {
                let result = self.call(&method, value.clone(), &[])?;
                if !matches!(result, Value::Object(_)) {
                    return Ok(result);
                }
            }
        }
        Err(self.type_error("Cannot convert object to primitive value"))
    }

    pub fn to_string(&mut self, value: &Value) -> Completion<Rc<str>> {
        match value {
            Value::Object(_) => {
                let primitive = self.to_primitive(value, PreferredType::String)?;
                Ok(primitive.primitive_to_string())
            }
            other => Ok(other.primitive_to_string()),
        }
    }

    pub fn to_number(&mut self, value: &Value) -> Completion<f64> {
        match value {
            Value::Object(_) => {
                let primitive = self.to_primitive(value, PreferredType::Number)?;
                Ok(primitive.primitive_to_number())
            }
            other => Ok(other.primitive_to_number()),
        }
    }

    pub fn to_integer(&mut self, value: &Value) -> Completion<f64> {
        let n = self.to_number(value)?;
        Ok(if n.is_nan() { 0.0 } else { n.trunc() })
    }

    pub fn to_property_key(&mut self, value: &Value) -> Completion<Rc<str>> {
        match value {
            Value::String(s) => Ok(Rc::clone(s)),
            Value::Number(n) => Ok(number_to_string(*n).into()),
            other => self.to_string(other),
        }
    }

    /// `==`
    pub fn loose_equals(&mut self, a: &Value, b: &Value) -> Completion<bool> {
        Ok(match (a, b) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
            (Value::Number(x), Value::String(_)) => *x == b.primitive_to_number(),
            (Value::String(_), Value::Number(y)) => a.primitive_to_number() == *y,
            (Value::Bool(_), _) => {
                let n = Value::Number(a.primitive_to_number());
                return self.loose_equals(&n, b);
            }
            (_, Value::Bool(_)) => {
                let n = Value::Number(b.primitive_to_number());
                return self.loose_equals(a, &n);
            }
            (Value::Object(_), Value::Object(_)) => strict_equals(a, b),
            (Value::Object(_), _) => {
                let p = self.to_primitive(a, PreferredType::Default)?;
                return self.loose_equals(&p, b);
            }
            (_, Value::Object(_)) => {
                let p = self.to_primitive(b, PreferredType::Default)?;
                return self.loose_equals(a, &p);
            }
            _ => strict_equals(a, b),
        })
    }

    /// Abstract relational comparison; `None` when either side is `NaN`.
    fn compare(&mut self, a: &Value, b: &Value) -> Completion<Option<std::cmp::Ordering>> {
        let pa = self.to_primitive(a, PreferredType::Number)?;
        let pb = self.to_primitive(b, PreferredType::Number)?;
        if let (Value::String(x), Value::String(y)) = (&pa, &pb) {
            return Ok(Some(compare_strings(x, y)));
        }
        let x = pa.primitive_to_number();
        let y = pb.primitive_to_number();
        Ok(x.partial_cmp(&y))
    }

    pub fn add_values(&mut self, a: &Value, b: &Value) -> Completion<Value> {
        if let (Value::Number(x), Value::Number(y)) = (a, b) {
            return Ok(Value::Number(x + y));
        }
        let pa = self.to_primitive(a, PreferredType::Default)?;
        let pb = self.to_primitive(b, PreferredType::Default)?;
        if matches!(pa, Value::String(_)) || matches!(pb, Value::String(_)) {
            let sa = pa.primitive_to_string();
            let sb = pb.primitive_to_string();
            return self.concat_strings(&sa, &sb);
        }
        Ok(Value::Number(pa.primitive_to_number() + pb.primitive_to_number()))
    }

    pub fn binary_op(&mut self, op: BinaryOp, a: &Value, b: &Value) -> Completion<Value> {
        use std::cmp::Ordering::{Equal, Greater, Less};
        let value = match op {
            BinaryOp::Add => return self.add_values(a, b),
            BinaryOp::Sub => Value::Number(self.to_number(a)? - self.to_number(b)?),
            BinaryOp::Mul => Value::Number(self.to_number(a)? * self.to_number(b)?),
            BinaryOp::Div => Value::Number(self.to_number(a)? / self.to_number(b)?),
            BinaryOp::Mod => Value::Number(self.to_number(a)? % self.to_number(b)?),
            BinaryOp::Pow => {
                let base = self.to_number(a)?;
                let exp = self.to_number(b)?;
                Value::Number(js_pow(base, exp))
            }
            BinaryOp::Eq => Value::Bool(self.loose_equals(a, b)?),
            BinaryOp::NotEq => Value::Bool(!self.loose_equals(a, b)?),
            BinaryOp::StrictEq => Value::Bool(strict_equals(a, b)),
            BinaryOp::StrictNotEq => Value::Bool(!strict_equals(a, b)),
            BinaryOp::Lt => Value::Bool(matches!(self.compare(a, b)?, Some(Less))),
            BinaryOp::LtEq => Value::Bool(matches!(self.compare(a, b)?, Some(Less | Equal))),
            BinaryOp::Gt => Value::Bool(matches!(self.compare(a, b)?, Some(Greater))),
            BinaryOp::GtEq => Value::Bool(matches!(self.compare(a, b)?, Some(Greater | Equal))),
            BinaryOp::BitAnd => Value::Number(f64::from(self.int32(a)? & self.int32(b)?)),
            BinaryOp::BitOr => Value::Number(f64::from(self.int32(a)? | self.int32(b)?)),
            BinaryOp::BitXor => Value::Number(f64::from(self.int32(a)? ^ self.int32(b)?)),
            BinaryOp::Shl => {
                let x = self.int32(a)?;
                let s = self.uint32(b)? & 31;
                Value::Number(f64::from(x.wrapping_shl(s)))
            }
            BinaryOp::Shr => {
                let x = self.int32(a)?;
                let s = self.uint32(b)? & 31;
                Value::Number(f64::from(x >> s))
            }
            BinaryOp::UShr => {
                let x = self.uint32(a)?;
                let s = self.uint32(b)? & 31;
                Value::Number(f64::from(x >> s))
            }
            BinaryOp::In => {
                let Value::Object(id) = b else {
                    let key = self.to_string(a)?;
                    return Err(self.type_error(format!(
                        "Cannot use 'in' operator to search for '{key}' in {b}"
                    )));
                };
                let key = self.to_property_key(a)?;
                Value::Bool(self.has_property(*id, &key))
            }
            BinaryOp::Instanceof => Value::Bool(self.instance_of(a, b)?),
        };
        Ok(value)
    }

    fn int32(&mut self, v: &Value) -> Completion<i32> {
        Ok(to_int32(self.to_number(v)?))
    }

    fn uint32(&mut self, v: &Value) -> Completion<u32> {
        Ok(to_uint32(self.to_number(v)?))
    }

    pub fn instance_of(&mut self, value: &Value, constructor: &Value) -> Completion<bool> {
        let Some(ctor) = constructor.as_object().filter(|id| self.heap.get(*id).is_callable()) else {
            return Err(self.type_error("Right-hand side of 'instanceof' is not callable"));
        };
        let ctor = self.bound_target(ctor);
        let Value::Object(id) = value else {
            return Ok(false);
        };
        let Value::Object(proto) = self.get_property(ctor, "prototype")? else {
            return Err(self.type_error("Function has non-object prototype in instanceof check"));
        };
        Ok(self.inherits_from(*id, proto))
    }

    /// Whether `proto` is on the prototype chain of `id`.
    pub fn inherits_from(&self, id: ObjectId, proto: ObjectId) -> bool {
        let mut current = self.heap.get(id).proto;
        while let Some(cur) = current {
            if cur == proto {
                return true;
            }
            current = self.heap.get(cur).proto;
        }
        false
    }

    fn bound_target(&self, mut id: ObjectId) -> ObjectId {
        while let ObjectKind::Function(FunctionData::Bound(b)) = &self.heap.get(id).kind {
            id = b.target;
        }
        id
    }
}

/// `**` with the script rules for `NaN` exponents and `(±1) ** ±Infinity`.
pub(crate) fn js_pow(base: f64, exp: f64) -> f64 {
    if exp.is_nan() || (base.abs() == 1.0 && exp.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pow_edge_cases() {
        assert!(js_pow(1.0, f64::NAN).is_nan());
        assert!(js_pow(1.0, f64::INFINITY).is_nan());
        assert_eq!(js_pow(2.0, 10.0), 1024.0);
        assert_eq!(js_pow(0.0, 0.0), 1.0);
    }
}
