//! Accessor-like node properties (`textContent`, `className`, `firstChild`, ...).
//!
//! The object model has no accessors, so property reads and writes on nodes consult these hooks before the
//! ordinary lookup.

use std::rc::Rc;

use super::{children, element, element_mut, parent, replace_children_with_text, serialize, text_content};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::ObjectKind;
use crate::runtime::value::{ObjectId, Value};
use crate::runtime::Completion;

const NODE_HOOKS: &[&str] = &[
    "nodeType",
    "nodeName",
    "textContent",
    "parentNode",
    "parentElement",
    "nextSibling",
    "previousSibling",
];

const ELEMENT_HOOKS: &[&str] = &[
    "tagName",
    "innerText",
    "innerHTML",
    "outerHTML",
    "firstChild",
    "lastChild",
    "firstElementChild",
    "lastElementChild",
    "childNodes",
    "children",
    "childElementCount",
    "className",
    "id",
    "style",
    "classList",
];

const TEXT_HOOKS: &[&str] = &["data", "nodeValue", "length"];

/// Properties that mirror the attribute of the same name.
const REFLECTED: &[&str] = &[
    "type",
    "href",
    "target",
    "value",
    "name",
    "title",
    "src",
    "alt",
    "placeholder",
    "rel",
];

/// Properties that mirror the presence of an attribute.
const BOOLEAN_ATTRIBUTES: &[&str] = &["disabled", "checked", "hidden"];

fn is_handler_slot(key: &str) -> bool {
    key.len() > 2 && key.starts_with("on") && key[2..].bytes().all(|b| b.is_ascii_lowercase())
}

pub(crate) fn has_hook(key: &str) -> bool {
    NODE_HOOKS.contains(&key)
        || ELEMENT_HOOKS.contains(&key)
        || REFLECTED.contains(&key)
        || BOOLEAN_ATTRIBUTES.contains(&key)
        || is_handler_slot(key)
}

pub(crate) fn get_hook(it: &mut Interpreter, id: ObjectId, key: &str) -> Completion<Option<Value>> {
    if let ObjectKind::Text(text) = &it.heap.get(id).kind {
        let data = Rc::clone(&text.data);
        return Ok(Some(match key {
            "nodeType" => Value::Number(3.0),
            "nodeName" => Value::from("#text"),
            "textContent" | "data" | "nodeValue" => Value::String(data),
            "length" => Value::from(proctor_core::strings::utf16_len(&data)),
            "parentNode" | "parentElement" => node_or_null(parent(it, id)),
            "nextSibling" => node_or_null(sibling(it, id, 1)),
            "previousSibling" => node_or_null(sibling(it, id, -1)),
            _ => return Ok(None),
        }));
    }
    let Some(e) = element(it, id) else {
        return Ok(None);
    };

    let value = match key {
        "tagName" | "nodeName" => Value::from(e.tag.to_ascii_uppercase()),
        "nodeType" => Value::Number(1.0),
        "textContent" | "innerText" => Value::from(text_content(it, id)),
        "innerHTML" => Value::from(serialize::inner_html(it, id)),
        "outerHTML" => Value::from(serialize::outer_html(it, id)),
        "firstChild" => node_or_null(e.children.first().copied()),
        "lastChild" => node_or_null(e.children.last().copied()),
        "firstElementChild" => node_or_null(element_children(it, id).first().copied()),
        "lastElementChild" => node_or_null(element_children(it, id).last().copied()),
        "childElementCount" => Value::from(element_children(it, id).len()),
        "childNodes" => {
            let nodes = children(it, id).into_iter().map(Value::Object).collect();
            Value::Object(it.new_array(nodes)?)
        }
        "children" => {
            let nodes = element_children(it, id).into_iter().map(Value::Object).collect();
            Value::Object(it.new_array(nodes)?)
        }
        "parentNode" | "parentElement" => node_or_null(e.parent),
        "nextSibling" => node_or_null(sibling(it, id, 1)),
        "previousSibling" => node_or_null(sibling(it, id, -1)),
        "className" => attr_or_empty(e.attr("class")),
        "id" => attr_or_empty(e.attr("id")),
        "style" => Value::Object(style_object(it, id)?),
        "classList" => Value::Object(class_list(it, id)?),
        k if REFLECTED.contains(&k) => attr_or_empty(e.attr(k)),
        k if BOOLEAN_ATTRIBUTES.contains(&k) => Value::Bool(e.attr(k).is_some()),
        k if is_handler_slot(k) => e
            .handlers
            .iter()
            .find(|(name, _)| &**name == k)
            .map_or(Value::Null, |(_, v)| v.clone()),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// Returns `true` if `key` was handled.
pub(crate) fn set_hook(it: &mut Interpreter, id: ObjectId, key: &str, value: &Value) -> Completion<bool> {
    if matches!(it.heap.get(id).kind, ObjectKind::Text(_)) {
        return match key {
            "textContent" | "data" | "nodeValue" => {
                let data = text_value(it, value)?;
                if let ObjectKind::Text(text) = &mut it.heap.get_mut(id).kind {
                    text.data = data;
                }
                Ok(true)
            }
            k if NODE_HOOKS.contains(&k) || TEXT_HOOKS.contains(&k) => Err(read_only(it, k)),
            _ => Ok(false),
        };
    }
    if element(it, id).is_none() {
        return Ok(false);
    }
    match key {
        "textContent" | "innerText" => {
            let text = text_value(it, value)?;
            replace_children_with_text(it, id, text)?;
        }
        "innerHTML" => {
            let html = text_value(it, value)?;
            if html.contains('<') || html.contains('&') {
                return Err(it.type_error(
                    "Setting innerHTML to markup is not supported; build nodes with document.createElement",
                ));
            }
            replace_children_with_text(it, id, html)?;
        }
        "className" => set_attr(it, id, "class", value)?,
        "id" => set_attr(it, id, "id", value)?,
        "style" => {
            set_attr(it, id, "style", value)?;
            if let Some(e) = element_mut(it, id) {
                e.style = None;
            }
        }
        k if REFLECTED.contains(&k) => set_attr(it, id, k, value)?,
        k if BOOLEAN_ATTRIBUTES.contains(&k) => {
            if let Some(e) = element_mut(it, id) {
                if value.truthy() {
                    e.set_attr(k, "".into());
                } else {
                    e.remove_attr(k);
                }
            }
        }
        k if is_handler_slot(k) => {
            let handler = if it.is_callable(value) { value.clone() } else { Value::Null };
            if let Some(e) = element_mut(it, id) {
                match e.handlers.iter_mut().find(|(name, _)| &**name == k) {
                    Some(slot) => slot.1 = handler,
                    None => e.handlers.push((k.into(), handler)),
                }
            }
        }
        k if NODE_HOOKS.contains(&k) || ELEMENT_HOOKS.contains(&k) => return Err(read_only(it, k)),
        _ => return Ok(false),
    }
    Ok(true)
}

fn read_only(it: &mut Interpreter, key: &str) -> crate::runtime::Abrupt {
    it.type_error(format!("Cannot set property {key} of [object Node] which has only a getter"))
}

/// `null` and `undefined` assign as the empty string, like the DOM's nullable string setters.
fn text_value(it: &mut Interpreter, value: &Value) -> Completion<Rc<str>> {
    match value {
        Value::Null | Value::Undefined => Ok("".into()),
        other => it.to_string(other),
    }
}

fn set_attr(it: &mut Interpreter, id: ObjectId, name: &str, value: &Value) -> Completion<()> {
    let value = it.to_string(value)?;
    if let Some(e) = element_mut(it, id) {
        e.set_attr(name, value);
    }
    Ok(())
}

fn attr_or_empty(value: Option<&Rc<str>>) -> Value {
    value.map_or_else(|| Value::from(""), |v| Value::String(Rc::clone(v)))
}

fn node_or_null(id: Option<ObjectId>) -> Value {
    id.map_or(Value::Null, Value::Object)
}

fn element_children(it: &Interpreter, id: ObjectId) -> Vec<ObjectId> {
    children(it, id)
        .into_iter()
        .filter(|c| element(it, *c).is_some())
        .collect()
}

fn sibling(it: &Interpreter, id: ObjectId, offset: isize) -> Option<ObjectId> {
    let siblings = children(it, parent(it, id)?);
    let at = siblings.iter().position(|c| *c == id)?;
    let target = at.checked_add_signed(offset)?;
    siblings.get(target).copied()
}

fn style_object(it: &mut Interpreter, id: ObjectId) -> Completion<ObjectId> {
    if let Some(style) = element(it, id).and_then(|e| e.style) {
        return Ok(style);
    }
    let style = it.new_object()?;
    if let Some(e) = element_mut(it, id) {
        e.style = Some(style);
    }
    Ok(style)
}

fn class_list(it: &mut Interpreter, id: ObjectId) -> Completion<ObjectId> {
    if let Some(list) = element(it, id).and_then(|e| e.class_list) {
        return Ok(list);
    }
    let list = it.new_object()?;
    it.define_method(list, "add", 1, move |it, args| {
        let mut classes = element(it, id).map(|e| e.classes()).unwrap_or_default();
        for arg in args.args {
            let name = it.to_string(arg)?;
            if !classes.iter().any(|c| **c == *name) {
                classes.push(name.to_string());
            }
        }
        write_classes(it, id, &classes);
        Ok(Value::Undefined)
    })?;
    it.define_method(list, "remove", 1, move |it, args| {
        let mut classes = element(it, id).map(|e| e.classes()).unwrap_or_default();
        for arg in args.args {
            let name = it.to_string(arg)?;
            classes.retain(|c| **c != *name);
        }
        write_classes(it, id, &classes);
        Ok(Value::Undefined)
    })?;
    it.define_method(list, "toggle", 1, move |it, args| {
        let name = super::super::intrinsics::string_arg(it, &args, 0)?;
        let mut classes = element(it, id).map(|e| e.classes()).unwrap_or_default();
        let present = classes.iter().any(|c| **c == *name);
        let wanted = match args.arg(1) {
            Value::Undefined => !present,
            force => force.truthy(),
        };
        if wanted && !present {
            classes.push(name.to_string());
        } else if !wanted {
            classes.retain(|c| **c != *name);
        }
        write_classes(it, id, &classes);
        Ok(Value::Bool(wanted))
    })?;
    it.define_method(list, "contains", 1, move |it, args| {
        let name = super::super::intrinsics::string_arg(it, &args, 0)?;
        Ok(Value::Bool(
            element(it, id).is_some_and(|e| e.classes().iter().any(|c| **c == *name)),
        ))
    })?;
    if let Some(e) = element_mut(it, id) {
        e.class_list = Some(list);
    }
    Ok(list)
}

fn write_classes(it: &mut Interpreter, id: ObjectId, classes: &[String]) {
    if let Some(e) = element_mut(it, id) {
        e.set_attr("class", classes.join(" ").into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_slots_are_lowercase_on_names() {
        assert!(is_handler_slot("onclick"));
        assert!(is_handler_slot("oninput"));
        assert!(!is_handler_slot("onClick"));
        assert!(!is_handler_slot("on"));
        assert!(has_hook("textContent"));
        assert!(!has_hook("foo"));
    }
}
