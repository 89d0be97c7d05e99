//! `Number`, `Boolean` and the numeric globals (`parseInt`, `parseFloat`, `isNaN`, `isFinite`).

use proctor_core::numbers::{number_to_string, parse_float, parse_int, to_int32};

use super::{define_constructor, number_arg, string_arg};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::{CallArgs, Property};
use crate::runtime::value::Value;
use crate::runtime::Completion;

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub(super) fn install(it: &mut Interpreter) -> Completion<()> {
    let proto = it.realm.number_proto;
    let ctor = define_constructor(it, "Number", 1, proto, |it, args| {
        if args.args.is_empty() {
            return Ok(Value::Number(0.0));
        }
        Ok(Value::Number(number_arg(it, &args, 0)?))
    })?;
    for (name, value) in [
        ("MAX_SAFE_INTEGER", MAX_SAFE_INTEGER),
        ("MIN_SAFE_INTEGER", -MAX_SAFE_INTEGER),
        ("EPSILON", f64::EPSILON),
        ("MAX_VALUE", f64::MAX),
        ("MIN_VALUE", 5e-324),
        ("POSITIVE_INFINITY", f64::INFINITY),
        ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
        ("NaN", f64::NAN),
    ] {
        it.heap
            .get_mut(ctor)
            .props
            .insert(name.into(), Property::frozen(Value::Number(value)));
    }
    it.define_method(ctor, "isInteger", 1, |_, args| {
        Ok(Value::Bool(matches!(args.arg(0), Value::Number(n) if n.is_finite() && n.trunc() == n)))
    })?;
    it.define_method(ctor, "isSafeInteger", 1, |_, args| {
        Ok(Value::Bool(
            matches!(args.arg(0), Value::Number(n) if n.is_finite() && n.trunc() == n && n.abs() <= MAX_SAFE_INTEGER),
        ))
    })?;
    it.define_method(ctor, "isFinite", 1, |_, args| {
        Ok(Value::Bool(matches!(args.arg(0), Value::Number(n) if n.is_finite())))
    })?;
    it.define_method(ctor, "isNaN", 1, |_, args| {
        Ok(Value::Bool(matches!(args.arg(0), Value::Number(n) if n.is_nan())))
    })?;

    let parse_int_fn = it.new_native("parseInt", 2, global_parse_int)?;
    let parse_float_fn = it.new_native("parseFloat", 1, |it, args| {
        Ok(Value::Number(parse_float(&string_arg(it, &args, 0)?)))
    })?;
    for (name, f) in [("parseInt", parse_int_fn), ("parseFloat", parse_float_fn)] {
        it.define_hidden(ctor, name, Value::Object(f));
        it.define_global(name, Value::Object(f));
    }
    let is_nan = it.new_native("isNaN", 1, |it, args| Ok(Value::Bool(number_arg(it, &args, 0)?.is_nan())))?;
    it.define_global("isNaN", Value::Object(is_nan));
    let is_finite = it.new_native("isFinite", 1, |it, args| {
        Ok(Value::Bool(number_arg(it, &args, 0)?.is_finite()))
    })?;
    it.define_global("isFinite", Value::Object(is_finite));

    it.define_method(proto, "valueOf", 0, |it, args| this_number(it, &args, "valueOf").map(Value::Number))?;
    it.define_method(proto, "toString", 1, |it, args| {
        let n = this_number(it, &args, "toString")?;
        let radix = match args.arg(0) {
            Value::Undefined => 10.0,
            other => it.to_integer(&other)?,
        };
        if !(2.0..=36.0).contains(&radix) {
            return Err(it.range_error("toString() radix must be between 2 and 36"));
        }
        Ok(Value::from(to_radix_string(n, radix as u32)))
    })?;
    it.define_method(proto, "toFixed", 1, |it, args| {
        let n = this_number(it, &args, "toFixed")?;
        let digits = it.to_integer(&args.arg(0))?;
        if !(0.0..=100.0).contains(&digits) {
            return Err(it.range_error("toFixed() digits argument must be between 0 and 100"));
        }
        Ok(Value::from(to_fixed(n, digits as usize)))
    })?;

    let boolean_proto = it.realm.boolean_proto;
    define_constructor(it, "Boolean", 1, boolean_proto, |_, args| Ok(Value::Bool(args.arg(0).truthy())))?;
    it.define_method(boolean_proto, "toString", 0, |it, args| {
        this_boolean(it, &args, "toString").map(|b| Value::from(if b { "true" } else { "false" }))
    })?;
    it.define_method(boolean_proto, "valueOf", 0, |it, args| this_boolean(it, &args, "valueOf").map(Value::Bool))?;
    Ok(())
}

fn global_parse_int(it: &mut Interpreter, args: CallArgs<'_>) -> Completion<Value> {
    let s = string_arg(it, &args, 0)?;
    let radix = to_int32(number_arg(it, &args, 1)?);
    if radix != 0 && !(2..=36).contains(&radix) {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(parse_int(&s, radix as u32)))
}

fn this_number(it: &mut Interpreter, args: &CallArgs<'_>, method: &str) -> Completion<f64> {
    match args.this {
        Value::Number(n) => Ok(n),
        _ => Err(it.type_error(format!(
            "Number.prototype.{method} requires that 'this' be a Number"
        ))),
    }
}

fn this_boolean(it: &mut Interpreter, args: &CallArgs<'_>, method: &str) -> Completion<bool> {
    match args.this {
        Value::Bool(b) => Ok(b),
        _ => Err(it.type_error(format!(
            "Boolean.prototype.{method} requires that 'this' be a Boolean"
        ))),
    }
}

/// `Number.prototype.toFixed`: round half away from zero on the exact binary value.
///
/// `(1.005).toFixed(2)` is `"1.00"` because the stored double sits just below the tie.
pub(crate) fn to_fixed(n: f64, digits: usize) -> String {
    if !n.is_finite() || n.abs() >= 1e21 {
        return number_to_string(n);
    }
    let negative = n < 0.0;
    // Every finite double has a terminating decimal expansion of at most 1074 fractional digits.
    let exact = format!("{:.1100}", n.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut kept: Vec<u8> = int_part.bytes().chain(frac_part.bytes().take(digits)).collect();
    let round_up = frac_part.as_bytes().get(digits).is_some_and(|d| *d >= b'5');
    if round_up {
        let mut i = kept.len();
        loop {
            if i == 0 {
                kept.insert(0, b'1');
                break;
            }
            i -= 1;
            if kept[i] == b'9' {
                kept[i] = b'0';
            } else {
                kept[i] += 1;
                break;
            }
        }
    }
    let split = kept.len() - digits;
    let (whole, fraction) = kept.split_at(split);
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&String::from_utf8_lossy(whole));
    if digits > 0 {
        out.push('.');
        out.push_str(&String::from_utf8_lossy(fraction));
    }
    out
}

/// `Number.prototype.toString(radix)`.
pub(crate) fn to_radix_string(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() {
        return number_to_string(n);
    }
    let negative = n < 0.0;
    let n = n.abs();
    let mut int_part = n.trunc();
    let mut frac = n - int_part;

    let mut int_digits = Vec::new();
    if int_part == 0.0 {
        int_digits.push('0');
    }
    while int_part >= 1.0 {
        let d = (int_part % f64::from(radix)) as u32;
        int_digits.push(std::char::from_digit(d, radix).unwrap_or('0'));
        int_part = (int_part / f64::from(radix)).trunc();
    }
    int_digits.reverse();

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.extend(int_digits);
    if frac > 0.0 {
        out.push('.');
        for _ in 0..52 {
            frac *= f64::from(radix);
            let d = frac.trunc() as u32;
            out.push(std::char::from_digit(d, radix).unwrap_or('0'));
            frac -= f64::from(d);
            if frac == 0.0 {
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fixed_rounds_the_stored_value() {
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(-2.5, 0), "-3");
        assert_eq!(to_fixed(0.125, 2), "0.13");
        assert_eq!(to_fixed(9.995, 2), "9.99");
        assert_eq!(to_fixed(99.99, 1), "100.0");
        assert_eq!(to_fixed(3.0, 0), "3");
        assert_eq!(to_fixed(f64::NAN, 2), "NaN");
    }

    #[test]
    fn test_radix_strings() {
        assert_eq!(to_radix_string(255.0, 16), "ff");
        assert_eq!(to_radix_string(-5.0, 2), "-101");
        assert_eq!(to_radix_string(0.5, 2), "0.1");
        assert_eq!(to_radix_string(0.0, 36), "0");
    }
}
