//! `String` and `String.prototype`. Positions are UTF-16 code units throughout.

use std::rc::Rc;

use proctor_core::strings::{
    clamp_index, utf16_char_at, utf16_code_at, utf16_index_of, utf16_last_index_of, utf16_len, utf16_slice,
};

use super::{define_constructor, number_arg, relative_arg, string_arg};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::CallArgs;
use crate::runtime::value::Value;
use crate::runtime::Completion;

pub(super) fn install(it: &mut Interpreter) -> Completion<()> {
    let proto = it.realm.string_proto;
    let ctor = define_constructor(it, "String", 1, proto, |it, args| {
        if args.args.is_empty() {
            return Ok(Value::from(""));
        }
        Ok(Value::String(string_arg(it, &args, 0)?))
    })?;
    it.define_method(ctor, "fromCharCode", 1, |it, args| {
        let mut units = Vec::with_capacity(args.args.len());
        for arg in args.args {
            let n = it.to_number(arg)?;
            units.push(proctor_core::numbers::to_uint32(n) as u16);
        }
        Ok(Value::from(String::from_utf16_lossy(&units)))
    })?;

    it.define_method(proto, "toString", 0, |it, args| this_string(it, &args, "toString").map(Value::String))?;
    it.define_method(proto, "valueOf", 0, |it, args| this_string(it, &args, "valueOf").map(Value::String))?;
    it.define_method(proto, "charAt", 1, |it, args| {
        let s = this_string(it, &args, "charAt")?;
        let i = it.to_integer(&args.arg(0))?;
        Ok(Value::from(if i < 0.0 {
            String::new()
        } else {
            utf16_char_at(&s, i as usize).unwrap_or_default()
        }))
    })?;
    it.define_method(proto, "charCodeAt", 1, |it, args| {
        let s = this_string(it, &args, "charCodeAt")?;
        let i = it.to_integer(&args.arg(0))?;
        let code = if i < 0.0 { None } else { utf16_code_at(&s, i as usize) };
        Ok(Value::Number(code.map_or(f64::NAN, f64::from)))
    })?;
    it.define_method(proto, "at", 1, |it, args| {
        let s = this_string(it, &args, "at")?;
        let n = it.to_integer(&args.arg(0))?;
        let len = utf16_len(&s) as f64;
        let index = if n < 0.0 { len + n } else { n };
        if index < 0.0 || index >= len {
            return Ok(Value::Undefined);
        }
        Ok(utf16_char_at(&s, index as usize).map_or(Value::Undefined, Value::from))
    })?;
    it.define_method(proto, "indexOf", 1, |it, args| {
        let s = this_string(it, &args, "indexOf")?;
        let needle = string_arg(it, &args, 0)?;
        let from = clamp_index(it.to_integer(&args.arg(1))?, utf16_len(&s));
        Ok(position(utf16_index_of(&s, &needle, from)))
    })?;
    it.define_method(proto, "lastIndexOf", 1, |it, args| {
        let s = this_string(it, &args, "lastIndexOf")?;
        let needle = string_arg(it, &args, 0)?;
        Ok(position(utf16_last_index_of(&s, &needle)))
    })?;
    it.define_method(proto, "includes", 1, |it, args| {
        let s = this_string(it, &args, "includes")?;
        let needle = search_string(it, &args, "includes")?;
        let from = clamp_index(it.to_integer(&args.arg(1))?, utf16_len(&s));
        Ok(Value::Bool(utf16_index_of(&s, &needle, from).is_some()))
    })?;
    it.define_method(proto, "startsWith", 1, |it, args| {
        let s = this_string(it, &args, "startsWith")?;
        let needle = search_string(it, &args, "startsWith")?;
        let from = clamp_index(it.to_integer(&args.arg(1))?, utf16_len(&s));
        let tail = utf16_slice(&s, from, usize::MAX);
        Ok(Value::Bool(tail.starts_with(&*needle)))
    })?;
    it.define_method(proto, "endsWith", 1, |it, args| {
        let s = this_string(it, &args, "endsWith")?;
        let needle = search_string(it, &args, "endsWith")?;
        let len = utf16_len(&s);
        let end = match args.arg(1) {
            Value::Undefined => len,
            other => clamp_index(it.to_integer(&other)?, len),
        };
        let head = utf16_slice(&s, 0, end);
        Ok(Value::Bool(head.ends_with(&*needle)))
    })?;
    it.define_method(proto, "slice", 2, |it, args| {
        let s = this_string(it, &args, "slice")?;
        let len = utf16_len(&s);
        let start = relative_arg(it, &args.arg(0), len, 0)?;
        let end = relative_arg(it, &args.arg(1), len, len)?;
        Ok(Value::from(utf16_slice(&s, start, end)))
    })?;
    it.define_method(proto, "substring", 2, |it, args| {
        let s = this_string(it, &args, "substring")?;
        let len = utf16_len(&s);
        let start = clamp_index(it.to_integer(&args.arg(0))?, len);
        let end = match args.arg(1) {
            Value::Undefined => len,
            other => clamp_index(it.to_integer(&other)?, len),
        };
        Ok(Value::from(utf16_slice(&s, start.min(end), start.max(end))))
    })?;
    it.define_method(proto, "toUpperCase", 0, |it, args| {
        Ok(Value::from(this_string(it, &args, "toUpperCase")?.to_uppercase()))
    })?;
    it.define_method(proto, "toLowerCase", 0, |it, args| {
        Ok(Value::from(this_string(it, &args, "toLowerCase")?.to_lowercase()))
    })?;
    it.define_method(proto, "trim", 0, |it, args| Ok(Value::from(this_string(it, &args, "trim")?.trim())))?;
    it.define_method(proto, "trimStart", 0, |it, args| {
        Ok(Value::from(this_string(it, &args, "trimStart")?.trim_start()))
    })?;
    it.define_method(proto, "trimEnd", 0, |it, args| {
        Ok(Value::from(this_string(it, &args, "trimEnd")?.trim_end()))
    })?;
    it.define_method(proto, "padStart", 2, |it, args| pad(it, &args, true))?;
    it.define_method(proto, "padEnd", 2, |it, args| pad(it, &args, false))?;
    it.define_method(proto, "repeat", 1, |it, args| {
        let s = this_string(it, &args, "repeat")?;
        let count = it.to_integer(&args.arg(0))?;
        if count < 0.0 || count.is_infinite() {
            return Err(it.range_error(format!("Invalid count value: {}", args.arg(0))));
        }
        let count = count as usize;
        it.check_string_len(utf16_len(&s).saturating_mul(count))?;
        Ok(Value::from(s.repeat(count)))
    })?;
    it.define_method(proto, "concat", 1, |it, args| {
        let mut out = this_string(it, &args, "concat")?;
        for arg in args.args {
            let next = it.to_string(arg)?;
            out = match it.concat_strings(&out, &next)? {
                Value::String(s) => s,
                _ => out,
            };
        }
        Ok(Value::String(out))
    })?;
    it.define_method(proto, "split", 2, |it, args| {
        let s = this_string(it, &args, "split")?;
        let limit = match args.arg(1) {
            Value::Undefined => usize::MAX,
            other => proctor_core::numbers::to_uint32(it.to_number(&other)?) as usize,
        };
        let parts: Vec<Value> = match args.arg(0) {
            Value::Undefined => vec![Value::String(Rc::clone(&s))],
            separator => {
                let separator = it.to_string(&separator)?;
                split(&s, &separator).into_iter().map(Value::from).collect()
            }
        };
        let parts = parts.into_iter().take(limit).collect();
        Ok(Value::Object(it.new_array(parts)?))
    })?;
    it.define_method(proto, "replace", 2, |it, args| replace(it, &args, false))?;
    it.define_method(proto, "replaceAll", 2, |it, args| replace(it, &args, true))?;
    Ok(())
}

fn this_string(it: &mut Interpreter, args: &CallArgs<'_>, method: &str) -> Completion<Rc<str>> {
    match &args.this {
        Value::String(s) => Ok(Rc::clone(s)),
        Value::Undefined | Value::Null => Err(it.type_error(format!(
            "String.prototype.{method} called on null or undefined"
        ))),
        other => it.to_string(other),
    }
}

/// First argument of `includes`/`startsWith`/`endsWith`, which reject regular expressions.
fn search_string(it: &mut Interpreter, args: &CallArgs<'_>, method: &str) -> Completion<Rc<str>> {
    if let Value::Object(id) = args.arg(0) {
        if it.has_property(id, "exec") {
            return Err(it.type_error(format!(
                "First argument to String.prototype.{method} must not be a regular expression"
            )));
        }
    }
    string_arg(it, args, 0)
}

fn position(found: Option<usize>) -> Value {
    Value::Number(found.map_or(-1.0, |i| i as f64))
}

fn pad(it: &mut Interpreter, args: &CallArgs<'_>, at_start: bool) -> Completion<Value> {
    let s = this_string(it, args, if at_start { "padStart" } else { "padEnd" })?;
    let target = number_arg(it, args, 0)?;
    let filler: Rc<str> = match args.arg(1) {
        Value::Undefined => " ".into(),
        other => it.to_string(&other)?,
    };
    let len = utf16_len(&s);
    if target.is_nan() || target <= len as f64 || filler.is_empty() {
        return Ok(Value::String(s));
    }
    let target = target as usize;
    it.check_string_len(target)?;
    let fill_len = target - len;
    let filler_units = utf16_len(&filler);
    let repeated = filler.repeat(fill_len / filler_units + 1);
    let padding = utf16_slice(&repeated, 0, fill_len);
    Ok(Value::from(if at_start {
        format!("{padding}{s}")
    } else {
        format!("{s}{padding}")
    }))
}

/// `split` with a string separator; the empty separator splits into code units.
fn split(s: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return (0..utf16_len(s))
            .map(|i| utf16_slice(s, i, i + 1))
            .collect();
    }
    s.split(separator).map(str::to_string).collect()
}

/// `replace`/`replaceAll` with a string pattern and a string or function replacement.
fn replace(it: &mut Interpreter, args: &CallArgs<'_>, all: bool) -> Completion<Value> {
    let method = if all { "replaceAll" } else { "replace" };
    let s = this_string(it, args, method)?;
    if let Value::Object(id) = args.arg(0) {
        if it.has_property(id, "exec") {
            return Err(it.type_error(format!(
                "String.prototype.{method} does not support regular expressions here"
            )));
        }
    }
    let pattern = string_arg(it, args, 0)?;
    let replacement = args.arg(1);
    let callable = it.is_callable(&replacement);
    let template = if callable {
        None
    } else {
        Some(it.to_string(&replacement)?)
    };

    let mut matches = Vec::new();
    let mut from = 0;
    while let Some(at) = utf16_index_of(&s, &pattern, from) {
        matches.push(at);
        if !all {
            break;
        }
        from = at + utf16_len(&pattern).max(1);
        if from > utf16_len(&s) {
            break;
        }
    }

    let mut out = String::new();
    let mut cursor = 0;
    let pattern_len = utf16_len(&pattern);
    for at in matches {
        out.push_str(&utf16_slice(&s, cursor, at));
        let piece = match &template {
            Some(template) => expand_template(template, &pattern, &s, at, pattern_len),
            None => {
                let result = it.call(
                    &replacement,
                    Value::Undefined,
                    &[Value::String(Rc::clone(&pattern)), Value::from(at), Value::String(Rc::clone(&s))],
                )?;
                it.to_string(&result)?.to_string()
            }
        };
        out.push_str(&piece);
        it.check_string_len(utf16_len(&out))?;
        cursor = at + pattern_len;
    }
    out.push_str(&utf16_slice(&s, cursor, usize::MAX));
    Ok(Value::from(out))
}

/// Expand `$$`, `$&`, `` $` `` and `$'` in a replacement string.
fn expand_template(template: &str, matched: &str, subject: &str, at: usize, len: usize) -> String {
    let mut out = String::new();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => out.push('$'),
            Some('&') => out.push_str(matched),
            Some('`') => out.push_str(&utf16_slice(subject, 0, at)),
            Some('\'') => out.push_str(&utf16_slice(subject, at + len, usize::MAX)),
            _ => {
                out.push('$');
                continue;
            }
        }
        chars.next();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_empty_separator_yields_code_units() {
        assert_eq!(split("abc", ""), ["a", "b", "c"]);
        assert_eq!(split("a,b,,c", ","), ["a", "b", "", "c"]);
    }

    #[test]
    fn test_replacement_patterns() {
        assert_eq!(expand_template("[$&]", "b", "abc", 1, 1), "[b]");
        assert_eq!(expand_template("$$", "b", "abc", 1, 1), "$");
        assert_eq!(expand_template("$`|$'", "b", "abc", 1, 1), "a|c");
        assert_eq!(expand_template("$1", "b", "abc", 1, 1), "$1");
    }
}
