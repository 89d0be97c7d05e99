//! Static HTML serialization of the headless DOM.
//!
//! The output is meant to be shown, never run: event-handler attributes, script-bearing URLs and active
//! elements are dropped, and all text and attribute values are escaped.

use super::element;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::ObjectKind;
use crate::runtime::value::{ObjectId, Value};

/// Elements dropped together with their subtree.
const DROPPED_ELEMENTS: &[&str] = &[
    "script", "iframe", "frame", "frameset", "object", "embed", "base", "meta", "link", "noscript", "template",
];

const VOID_ELEMENTS: &[&str] = &[
    "area", "br", "col", "hr", "img", "input", "source", "track", "wbr",
];

/// Attributes holding URLs, checked for script schemes.
const URL_ATTRIBUTES: &[&str] = &["href", "src", "action", "formaction", "xlink:href", "poster", "cite"];

pub fn outer_html(it: &Interpreter, id: ObjectId) -> String {
    let mut out = String::new();
    write_nodes(it, vec![id], &mut out);
    out
}

pub fn inner_html(it: &Interpreter, id: ObjectId) -> String {
    let mut out = String::new();
    let children = element(it, id).map(|e| e.children.clone()).unwrap_or_default();
    write_nodes(it, children, &mut out);
    out
}

enum Step {
    Node(ObjectId),
    Close(std::rc::Rc<str>),
}

fn write_nodes(it: &Interpreter, roots: Vec<ObjectId>, out: &mut String) {
    let mut stack: Vec<Step> = roots.into_iter().rev().map(Step::Node).collect();
    while let Some(step) = stack.pop() {
        let id = match step {
            Step::Close(tag) => {
                out.push_str("</");
                out.push_str(&tag);
                out.push('>');
                continue;
            }
            Step::Node(id) => id,
        };
        match &it.heap.get(id).kind {
            ObjectKind::Text(text) => escape_text(&text.data, out),
            ObjectKind::Element(e) => {
                if DROPPED_ELEMENTS.contains(&&*e.tag) {
                    continue;
                }
                out.push('<');
                out.push_str(&e.tag);
                for (name, value) in &e.attrs {
                    if name.as_ref() == "style" || !safe_attribute(name, value) {
                        continue;
                    }
                    write_attribute(name, value, out);
                }
                let style = style_text(it, e.attr("style").map(|s| &**s), e.style);
                if !style.is_empty() {
                    write_attribute("style", &style, out);
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&&*e.tag) {
                    continue;
                }
                stack.push(Step::Close(e.tag.clone()));
                stack.extend(e.children.iter().rev().map(|c| Step::Node(*c)));
            }
            _ => {}
        }
    }
}

fn safe_attribute(name: &str, value: &str) -> bool {
    let valid_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'));
    if !valid_name || name.starts_with("on") || name == "srcdoc" {
        return false;
    }
    if URL_ATTRIBUTES.contains(&name) {
        let scheme: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .take(11)
            .collect::<String>()
            .to_ascii_lowercase();
        if scheme.starts_with("javascript:") || scheme.starts_with("vbscript:") || scheme.starts_with("data:text") {
            return false;
        }
    }
    true
}

fn write_attribute(name: &str, value: &str, out: &mut String) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

/// The `style` attribute followed by declarations set through the element's `style` object.
fn style_text(it: &Interpreter, attribute: Option<&str>, object: Option<ObjectId>) -> String {
    let mut declarations: Vec<String> = attribute
        .map(|a| {
            a.split(';')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if let Some(style) = object {
        for (key, prop) in it.heap.get(style).props.iter() {
            let value = match &prop.value {
                Value::String(s) if !s.is_empty() => s.to_string(),
                Value::Number(_) => prop.value.primitive_to_string().to_string(),
                _ => continue,
            };
            declarations.push(format!("{}: {value}", kebab_case(key)));
        }
    }
    declarations
        .into_iter()
        .filter(|d| !d.to_ascii_lowercase().contains("url(") && !d.to_ascii_lowercase().contains("expression("))
        .map(|d| d + ";")
        .collect::<Vec<_>>()
        .join(" ")
}

/// `backgroundColor` to `background-color`.
fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsafe_attributes_are_dropped() {
        assert!(safe_attribute("href", "https://example.com"));
        assert!(!safe_attribute("href", "javascript:alert(1)"));
        assert!(!safe_attribute("href", " JaVa\tScRiPt:alert(1)"));
        assert!(!safe_attribute("onclick", "x()"));
        assert!(!safe_attribute("srcdoc", "<p>"));
        assert!(!safe_attribute("a b", "x"));
        assert!(safe_attribute("data-id", "3"));
    }

    #[test]
    fn test_kebab_case() {
        assert_eq!(kebab_case("backgroundColor"), "background-color");
        assert_eq!(kebab_case("color"), "color");
        assert_eq!(kebab_case("borderTopLeftRadius"), "border-top-left-radius");
    }

    #[test]
    fn test_escaping() {
        let mut out = String::new();
        escape_text("<b>&</b>", &mut out);
        assert_eq!(out, "&lt;b&gt;&amp;&lt;/b&gt;");
        let mut out = String::new();
        write_attribute("title", "\"x\"", &mut out);
        assert_eq!(out, " title=\"&quot;x&quot;\"");
    }
}
