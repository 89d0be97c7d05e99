//! The `Math` namespace.

use super::{define_namespace, number_arg};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::Property;
use crate::runtime::value::Value;
use crate::runtime::Completion;

type Unary = fn(f64) -> f64;

pub(super) fn install(it: &mut Interpreter) -> Completion<()> {
    let math = define_namespace(it, "Math")?;
    for (name, value) in [
        ("PI", std::f64::consts::PI),
        ("E", std::f64::consts::E),
        ("LN2", std::f64::consts::LN_2),
        ("LN10", std::f64::consts::LN_10),
        ("LOG2E", std::f64::consts::LOG2_E),
        ("LOG10E", std::f64::consts::LOG10_E),
        ("SQRT2", std::f64::consts::SQRT_2),
        ("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
    ] {
        it.heap
            .get_mut(math)
            .props
            .insert(name.into(), Property::frozen(Value::Number(value)));
    }

    let unary: [(&str, Unary); 20] = [
        ("abs", f64::abs),
        ("floor", f64::floor),
        ("ceil", f64::ceil),
        ("round", round),
        ("trunc", f64::trunc),
        ("sign", sign),
        ("sqrt", f64::sqrt),
        ("cbrt", f64::cbrt),
        ("exp", f64::exp),
        ("log", f64::ln),
        ("log2", f64::log2),
        ("log10", f64::log10),
        ("sin", f64::sin),
        ("cos", f64::cos),
        ("tan", f64::tan),
        ("asin", f64::asin),
        ("acos", f64::acos),
        ("atan", f64::atan),
        ("fround", |x| f64::from(x as f32)),
        ("log1p", f64::ln_1p),
    ];
    for (name, f) in unary {
        it.define_method(math, name, 1, move |it, args| Ok(Value::Number(f(number_arg(it, &args, 0)?))))?;
    }

    it.define_method(math, "pow", 2, |it, args| {
        let base = number_arg(it, &args, 0)?;
        let exp = number_arg(it, &args, 1)?;
        Ok(Value::Number(crate::runtime::interpreter::js_pow(base, exp)))
    })?;
    it.define_method(math, "atan2", 2, |it, args| {
        let y = number_arg(it, &args, 0)?;
        let x = number_arg(it, &args, 1)?;
        Ok(Value::Number(y.atan2(x)))
    })?;
    it.define_method(math, "hypot", 2, |it, args| {
        let mut sum = 0.0;
        for i in 0..args.args.len() {
            let n = number_arg(it, &args, i)?;
            if n.is_infinite() {
                return Ok(Value::Number(f64::INFINITY));
            }
            sum += n * n;
        }
        Ok(Value::Number(sum.sqrt()))
    })?;
    it.define_method(math, "max", 2, |it, args| {
        let mut best = f64::NEG_INFINITY;
        for i in 0..args.args.len() {
            best = max(best, number_arg(it, &args, i)?);
        }
        Ok(Value::Number(best))
    })?;
    it.define_method(math, "min", 2, |it, args| {
        let mut best = f64::INFINITY;
        for i in 0..args.args.len() {
            best = -max(-best, -number_arg(it, &args, i)?);
        }
        Ok(Value::Number(best))
    })?;
    it.define_method(math, "random", 0, |it, _| Ok(Value::Number(it.next_random())))?;
    Ok(())
}

/// `Math.round`: halves round towards positive infinity (`Math.round(-2.5)` is `-2`).
fn round(x: f64) -> f64 {
    if !x.is_finite() || x.fract() == 0.0 {
        return x;
    }
    let r = (x + 0.5).floor();
    // `x + 0.5` is inexact just below one half.
    let r = if r - x > 0.5 { r - 1.0 } else { r };
    if r == 0.0 && x < 0.0 { -0.0 } else { r }
}

fn sign(x: f64) -> f64 {
    if x.is_nan() || x == 0.0 { x } else { x.signum() }
}

/// NaN-propagating max where `+0` beats `-0`.
fn max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else if a == b && a == 0.0 {
        if a.is_sign_positive() { a } else { b }
    } else if a > b {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_halves_go_up() {
        assert_eq!(round(2.5), 3.0);
        assert_eq!(round(-2.5), -2.0);
        assert_eq!(round(0.49999999999999994), 0.0);
        assert!(round(-0.4).is_sign_negative());
    }

    #[test]
    fn test_max_propagates_nan() {
        assert!(max(1.0, f64::NAN).is_nan());
        assert_eq!(max(-0.0, 0.0).to_bits(), 0.0f64.to_bits());
        assert_eq!(max(3.0, 7.0), 7.0);
    }
}
