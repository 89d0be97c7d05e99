//! `console` and the value inspector used for console output and error messages.

use super::define_namespace;
use crate::runtime::interpreter::{ConsoleLevel, Interpreter};
use crate::runtime::object::{FunctionData, ObjectKind};
use crate::runtime::value::{ObjectId, Value};
use crate::runtime::Completion;

/// Nesting shown before objects collapse to `[Object]`.
const MAX_DEPTH: usize = 2;
/// Array items and object entries shown before `... N more items`.
const MAX_ITEMS: usize = 100;

pub(super) fn install(it: &mut Interpreter) -> Completion<()> {
    let console = define_namespace(it, "console")?;
    for (name, level) in [
        ("log", ConsoleLevel::Log),
        ("info", ConsoleLevel::Log),
        ("warn", ConsoleLevel::Warn),
        ("error", ConsoleLevel::Error),
        ("debug", ConsoleLevel::Debug),
    ] {
        it.define_method(console, name, 0, move |it, args| {
            let line = args
                .args
                .iter()
                .map(|v| inspect(it, v))
                .collect::<Vec<_>>()
                .join(" ");
            it.console_write(level, &line);
            Ok(Value::Undefined)
        })?;
    }
    Ok(())
}

/// Render `value` the way `console.log` shows it. Reads the heap directly and never runs script code.
pub fn inspect(it: &Interpreter, value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string(),
        other => {
            let mut out = String::new();
            Inspector { it, seen: Vec::new() }.write(other, 0, &mut out);
            out
        }
    }
}

struct Inspector<'a> {
    it: &'a Interpreter,
    seen: Vec<ObjectId>,
}

impl Inspector<'_> {
    fn write(&mut self, value: &Value, depth: usize, out: &mut String) {
        match value {
            Value::String(s) => {
                out.push('\'');
                out.push_str(&s.replace('\'', "\\'"));
                out.push('\'');
            }
            Value::Object(id) => self.write_object(*id, depth, out),
            other => out.push_str(&other.primitive_to_string()),
        }
    }

    fn write_object(&mut self, id: ObjectId, depth: usize, out: &mut String) {
        if self.seen.contains(&id) {
            out.push_str("[Circular]");
            return;
        }
        let it = self.it;
        let object = it.heap.get(id);
        match &object.kind {
            ObjectKind::Function(FunctionData::Class(class)) => {
                let name = class.def.name.as_deref().unwrap_or("(anonymous)");
                out.push_str(&format!("[class {name}]"));
                return;
            }
            ObjectKind::Function(_) => {
                let name = match object.props.get("name").map(|p| &p.value) {
                    Some(Value::String(s)) if !s.is_empty() => s.to_string(),
                    _ => "(anonymous)".to_string(),
                };
                out.push_str(&format!("[Function: {name}]"));
                return;
            }
            ObjectKind::Error => {
                out.push_str(&self.error_line(id));
                return;
            }
            ObjectKind::Element(element) => {
                out.push_str(&format!("<{}>", element.tag));
                return;
            }
            ObjectKind::Text(text) => {
                out.push_str(&format!("#text '{}'", text.data));
                return;
            }
            ObjectKind::Array(items) => {
                if items.is_empty() {
                    out.push_str("[]");
                    return;
                }
                if depth > MAX_DEPTH {
                    out.push_str("[Array]");
                    return;
                }
                let items = items.clone();
                self.seen.push(id);
                out.push_str("[ ");
                for (i, item) in items.iter().take(MAX_ITEMS).enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write(item, depth + 1, out);
                }
                if items.len() > MAX_ITEMS {
                    out.push_str(&format!(", ... {} more items", items.len() - MAX_ITEMS));
                }
                out.push_str(" ]");
                self.seen.pop();
            }
            ObjectKind::Ordinary => {
                let entries: Vec<_> = object
                    .props
                    .iter()
                    .filter(|(_, p)| p.enumerable)
                    .map(|(k, p)| (k.clone(), p.value.clone()))
                    .collect();
                if entries.is_empty() {
                    out.push_str("{}");
                    return;
                }
                if depth > MAX_DEPTH {
                    out.push_str("[Object]");
                    return;
                }
                self.seen.push(id);
                out.push_str("{ ");
                for (i, (key, value)) in entries.iter().take(MAX_ITEMS).enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if is_identifier(key) {
                        out.push_str(key);
                    } else {
                        out.push_str(&format!("'{key}'"));
                    }
                    out.push_str(": ");
                    self.write(value, depth + 1, out);
                }
                if entries.len() > MAX_ITEMS {
                    out.push_str(&format!(", ... {} more items", entries.len() - MAX_ITEMS));
                }
                out.push_str(" }");
                self.seen.pop();
            }
        }
    }

    fn error_line(&self, id: ObjectId) -> String {
        let name = self.it.lookup_chain(id, "name").map(|v| v.primitive_to_string().to_string());
        let name = name.unwrap_or_else(|| "Error".to_string());
        let message = self.it.thrown_message(&Value::Object(id));
        if message.is_empty() {
            name
        } else {
            format!("{name}: {message}")
        }
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_keys_print_bare() {
        assert!(is_identifier("count"));
        assert!(is_identifier("$el"));
        assert!(!is_identifier("data-id"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier(""));
    }
}
