//! The `JSON` namespace.
//!
//! `JSON.parse` goes through `serde_json` and converts the resulting tree onto the heap; `JSON.stringify`
//! walks script values directly because it has to call `toJSON` and the replacer.

use std::rc::Rc;

use proctor_core::strings::utf16_len;

use super::define_namespace;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::value::{ObjectId, Value};
use crate::runtime::Completion;

pub(super) fn install(it: &mut Interpreter) -> Completion<()> {
    let json = define_namespace(it, "JSON")?;
    it.define_method(json, "stringify", 3, |it, args| {
        let replacer = args.arg(1);
        let space = args.arg(2);
        match stringify_with(it, &args.arg(0), &replacer, &space)? {
            Some(text) => Ok(Value::from(text)),
            None => Ok(Value::Undefined),
        }
    })?;
    it.define_method(json, "parse", 2, |it, args| {
        let text = super::string_arg(it, &args, 0)?;
        let value = parse(it, &text)?;
        let reviver = args.arg(1);
        if !it.is_callable(&reviver) {
            return Ok(value);
        }
        let root = it.new_object()?;
        it.define_data(root, "", value);
        revive(it, root, "".into(), &reviver)
    })?;
    Ok(())
}

/// `JSON.stringify(value)` with no replacer or indentation. `None` means the result is `undefined`.
pub fn stringify(it: &mut Interpreter, value: &Value) -> Completion<Option<String>> {
    stringify_with(it, value, &Value::Undefined, &Value::Undefined)
}

/// Parse JSON text into script values.
pub fn parse(it: &mut Interpreter, text: &str) -> Completion<Value> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(tree) => from_serde(it, &tree),
        Err(e) if e.is_eof() => Err(it.syntax_error("Unexpected end of JSON input")),
        Err(e) => Err(it.syntax_error(format!(
            "Unexpected token in JSON at line {} column {}",
            e.line(),
            e.column()
        ))),
    }
}

/// Copy a `serde_json` tree onto the heap. Key order is preserved.
pub fn from_serde(it: &mut Interpreter, tree: &serde_json::Value) -> Completion<Value> {
    Ok(match tree {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => {
            it.check_string_len(utf16_len(s))?;
            Value::from(s.as_str())
        }
        serde_json::Value::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(from_serde(it, item)?);
            }
            Value::Object(it.new_array(values)?)
        }
        serde_json::Value::Object(map) => {
            let object = it.new_object()?;
            for (key, item) in map {
                let value = from_serde(it, item)?;
                it.set_property(object, key, value)?;
            }
            Value::Object(object)
        }
    })
}

fn revive(it: &mut Interpreter, holder: ObjectId, key: Rc<str>, reviver: &Value) -> Completion<Value> {
    let value = it.get_property(holder, &key)?;
    if let Value::Object(id) = value {
        it.nested(|it| {
            let keys: Vec<Rc<str>> = match it.heap.get(id).as_array() {
                Some(items) => (0..items.len()).map(|i| Rc::from(i.to_string())).collect(),
                None => it.own_keys(id),
            };
            for k in keys {
                let revived = revive(it, id, Rc::clone(&k), reviver)?;
                if revived.is_undefined() {
                    it.delete_property(id, &k)?;
                } else {
                    it.set_property(id, &k, revived)?;
                }
            }
            Ok(())
        })?;
    }
    it.call(reviver, Value::Object(holder), &[Value::String(key), value])
}

struct Serializer {
    replacer: Option<Value>,
    allow: Option<Vec<Rc<str>>>,
    gap: String,
    stack: Vec<ObjectId>,
}

fn stringify_with(it: &mut Interpreter, value: &Value, replacer: &Value, space: &Value) -> Completion<Option<String>> {
    let mut serializer = Serializer {
        replacer: None,
        allow: None,
        gap: String::new(),
        stack: Vec::new(),
    };
    if it.is_callable(replacer) {
        serializer.replacer = Some(replacer.clone());
    } else if let Some(items) = it.array_items(replacer) {
        let mut allow = Vec::new();
        for item in items {
            if matches!(item, Value::String(_) | Value::Number(_)) {
                let key = it.to_string(&item)?;
                if !allow.contains(&key) {
                    allow.push(key);
                }
            }
        }
        serializer.allow = Some(allow);
    }
    serializer.gap = match space {
        Value::Number(n) => " ".repeat(n.clamp(0.0, 10.0) as usize),
        Value::String(s) => s.chars().take(10).collect(),
        _ => String::new(),
    };

    let wrapper = it.new_object()?;
    it.define_data(wrapper, "", value.clone());
    let mut out = String::new();
    let written = serializer.property(it, wrapper, value.clone(), "", "", &mut out)?;
    Ok(written.then_some(out))
}

impl Serializer {
    /// Serialize `holder[key]` (already read as `value`). Returns `false` when the value is skipped.
    fn property(
        &mut self,
        it: &mut Interpreter,
        holder: ObjectId,
        mut value: Value,
        key: &str,
        indent: &str,
        out: &mut String,
    ) -> Completion<bool> {
        if let Value::Object(_) = value {
            let to_json = it.get(&value, "toJSON")?;
            if it.is_callable(&to_json) {
                value = it.call(&to_json, value.clone(), &[Value::from(key)])?;
            }
        }
        if let Some(replacer) = &self.replacer {
            value = it.call(replacer, Value::Object(holder), &[Value::from(key), value])?;
        }
        match &value {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) if n.is_finite() => out.push_str(&value.primitive_to_string()),
            Value::Number(_) => out.push_str("null"),
            Value::String(s) => quote(s, out),
            Value::Undefined => return Ok(false),
            Value::Object(id) => {
                if it.is_callable(&value) {
                    return Ok(false);
                }
                if self.stack.contains(id) {
                    return Err(it.type_error("Converting circular structure to JSON"));
                }
                self.stack.push(*id);
                let result = it.nested(|it| self.object(it, *id, indent, out));
                self.stack.pop();
                result?;
            }
        }
        it.check_string_len(out.len())?;
        Ok(true)
    }

    fn object(&mut self, it: &mut Interpreter, id: ObjectId, indent: &str, out: &mut String) -> Completion<()> {
        let inner = format!("{indent}{}", self.gap);
        let (open, close) = if it.heap.get(id).as_array().is_some() { ('[', ']') } else { ('{', '}') };
        let mut first = true;
        out.push(open);

        if let Some(len) = it.heap.get(id).as_array().map(Vec::len) {
            for i in 0..len {
                if !first {
                    out.push(',');
                }
                first = false;
                self.newline(&inner, out);
                let item = it.get_property(id, &i.to_string())?;
                if !self.property(it, id, item, &i.to_string(), &inner, out)? {
                    out.push_str("null");
                }
            }
        } else {
            let keys = match &self.allow {
                Some(allow) => allow.clone(),
                None => it.own_keys(id),
            };
            for key in keys {
                if !it.has_own_property(id, &key) && self.allow.is_some() {
                    continue;
                }
                let value = it.get_property(id, &key)?;
                let mark = out.len();
                if !first {
                    out.push(',');
                }
                self.newline(&inner, out);
                quote(&key, out);
                out.push(':');
                if !self.gap.is_empty() {
                    out.push(' ');
                }
                if self.property(it, id, value, &key, &inner, out)? {
                    first = false;
                } else {
                    out.truncate(mark);
                }
            }
        }

        if !first {
            self.newline(indent, out);
        }
        out.push(close);
        Ok(())
    }

    fn newline(&self, indent: &str, out: &mut String) {
        if !self.gap.is_empty() {
            out.push('\n');
            out.push_str(indent);
        }
    }
}

fn quote(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes_control_characters() {
        let mut out = String::new();
        quote("a\"b\\c\n\u{1}", &mut out);
        assert_eq!(out, r#""a\"b\\c\n\u0001""#);
    }
}
