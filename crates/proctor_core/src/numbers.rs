//! Define shared number semantics (formatting, parsing, integer coercion).
//!
//! Script numbers are IEEE-754 doubles. This module holds the pure conversions the runtime needs so that
//! `String(0.1 + 0.2)`, `Number("  42 ")` and `x | 0` behave the way learners expect.
//!
//! ## Notes
//! - Formatting follows the shortest round-trip digit string (Rust's `{:e}` output) laid out with the
//!   script `Number.prototype.toString` rules: plain notation for exponents in `[-7, 21)`, exponent notation
//!   otherwise.
//! - Parsing rejects Rust-only spellings such as `inf` and `nan`.

/// Format a number the way `String(n)` does.
///
/// ## Examples
/// ```rust
/// use proctor_core::numbers::number_to_string;
///
/// assert_eq!(number_to_string(5.0), "5");
/// assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
/// assert_eq!(number_to_string(1e21), "1e+21");
/// assert_eq!(number_to_string(-0.0), "0");
/// ```
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let sign = if n < 0.0 { "-" } else { "" };
    let sci = format!("{:e}", n.abs());
    let (mantissa, exponent) = match sci.split_once('e') {
        Some(parts) => parts,
        None => return format!("{sign}{}", n.abs()),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let n_pos = exponent + 1;

    let body = if k <= n_pos && n_pos <= 21 {
        format!("{digits}{}", "0".repeat((n_pos - k) as usize))
    } else if 0 < n_pos && n_pos <= 21 {
        let (int_part, frac_part) = digits.split_at(n_pos as usize);
        format!("{int_part}.{frac_part}")
    } else if -6 < n_pos && n_pos <= 0 {
        format!("0.{}{digits}", "0".repeat((-n_pos) as usize))
    } else {
        let exp = n_pos - 1;
        let exp_sign = if exp < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{exp_sign}{}", exp.abs())
        } else {
            format!("{first}.{rest}e{exp_sign}{}", exp.abs())
        }
    };
    format!("{sign}{body}")
}

/// Convert a string to a number the way `Number(s)` does.
///
/// ## Returns
/// - `0.0` for empty or whitespace-only input.
/// - `NaN` for anything that is not a complete numeric literal.
///
/// ## Examples
/// ```rust
/// use proctor_core::numbers::string_to_number;
///
/// assert_eq!(string_to_number(" 42 "), 42.0);
/// assert_eq!(string_to_number("0x1f"), 31.0);
/// assert!(string_to_number("inf").is_nan());
/// ```
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return parse_radix_digits(rest, radix).unwrap_or(f64::NAN);
        }
    }
    if is_decimal_literal(trimmed) {
        trimmed.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// Implement `parseFloat`: parse the longest decimal prefix, ignoring leading whitespace.
pub fn parse_float(s: &str) -> f64 {
    let trimmed = s.trim_start();
    for (spelling, value) in [
        ("Infinity", f64::INFINITY),
        ("+Infinity", f64::INFINITY),
        ("-Infinity", f64::NEG_INFINITY),
    ] {
        if trimmed.starts_with(spelling) {
            return value;
        }
    }
    let mut best = None;
    for (idx, c) in trimmed.char_indices() {
        let candidate = &trimmed[..idx + c.len_utf8()];
        if is_decimal_literal(candidate) {
            best = Some(candidate);
        } else if !matches!(c, '0'..='9' | '.' | 'e' | 'E' | '+' | '-') {
            break;
        }
    }
    best.and_then(|b| b.parse::<f64>().ok()).unwrap_or(f64::NAN)
}

/// Implement `parseInt(s, radix)`.
///
/// ## Notes
/// - `radix == 0` means “detect”: `0x` selects 16, otherwise 10.
/// - Radix outside `2..=36` yields `NaN`.
pub fn parse_int(s: &str, radix: u32) -> f64 {
    let mut rest = s.trim_start();
    let mut negative = false;
    if let Some(r) = rest.strip_prefix('-') {
        negative = true;
        rest = r;
    } else if let Some(r) = rest.strip_prefix('+') {
        rest = r;
    }

    let mut radix = radix;
    if radix == 0 || radix == 16 {
        if let Some(r) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
            rest = r;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }

    let digits: String = rest.chars().take_while(|c| c.is_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    let value = parse_radix_digits(&digits, radix).unwrap_or(f64::NAN);
    if negative { -value } else { value }
}

/// Convert a number to a signed 32-bit integer (`ToInt32`).
pub fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// Convert a number to an unsigned 32-bit integer (`ToUint32`).
pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let truncated = n.trunc();
    let modulo = truncated.rem_euclid(4_294_967_296.0);
    modulo as u32
}

/// Return `true` if `n` is an integral value that fits an array index.
pub fn as_array_index(n: f64) -> Option<usize> {
    if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n < 4_294_967_295.0 {
        Some(n as usize)
    } else {
        None
    }
}

/// Return the canonical index for a property key that spells an array index (`"0"`, `"17"`).
pub fn key_as_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<usize>().ok()
}

fn parse_radix_digits(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    let mut value = 0.0f64;
    for c in digits.chars() {
        let d = c.to_digit(radix)?;
        value = value * radix as f64 + d as f64;
    }
    Some(value)
}

/// Return `true` for a complete optionally-signed decimal literal (`1`, `-1.5`, `.5`, `2e-3`).
fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_have_no_fraction() {
        assert_eq!(number_to_string(42.0), "42");
        assert_eq!(number_to_string(-7.0), "-7");
        assert_eq!(number_to_string(1e20), "100000000000000000000");
    }

    #[test]
    fn test_fractions_and_small_numbers() {
        assert_eq!(number_to_string(1.5), "1.5");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(0.0000001), "1e-7");
        assert_eq!(number_to_string(123.456), "123.456");
    }

    #[test]
    fn test_special_values() {
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::INFINITY), "Infinity");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(1.5e300), "1.5e+300");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("  3.25\n"), 3.25);
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
        assert_eq!(string_to_number("0b101"), 5.0);
        assert!(string_to_number("12px").is_nan());
        assert!(string_to_number("nan").is_nan());
        assert!(string_to_number(".").is_nan());
    }

    #[test]
    fn test_parse_int_and_float() {
        assert_eq!(parse_int("42px", 0), 42.0);
        assert_eq!(parse_int("  -0x1A", 0), -26.0);
        assert_eq!(parse_int("101", 2), 5.0);
        assert!(parse_int("zz", 10).is_nan());
        assert_eq!(parse_float("3.14abc"), 3.14);
        assert_eq!(parse_float("  -2e3x"), -2000.0);
        assert!(parse_float("abc").is_nan());
    }

    #[test]
    fn test_int32_coercions() {
        assert_eq!(to_int32(4_294_967_295.0), -1);
        assert_eq!(to_int32(-1.9), -1);
        assert_eq!(to_uint32(-1.0), 4_294_967_295);
        assert_eq!(to_int32(f64::NAN), 0);
    }

    #[test]
    fn test_index_keys() {
        assert_eq!(key_as_index("0"), Some(0));
        assert_eq!(key_as_index("12"), Some(12));
        assert_eq!(key_as_index("012"), None);
        assert_eq!(key_as_index("length"), None);
    }
}
