//! Headless DOM behind the `document` capability.
//!
//! Nodes are heap objects whose kind is [`ObjectKind::Element`] or [`ObjectKind::Text`]. Tree links are plain
//! ids, so the tree is walked iteratively everywhere and a hostile document cannot overflow the host stack.
//! There is no parser: markup only ever leaves the DOM (through [`serialize`]), it never enters it.

mod hooks;
pub mod selector;
pub mod serialize;

use std::cell::Cell;
use std::rc::Rc;

pub(crate) use hooks::{get_hook, has_hook, set_hook};

use super::interpreter::{ConsoleLevel, ErrorType, Interpreter};
use super::intrinsics::define_constructor;
use super::object::{CallArgs, Object, ObjectKind};
use super::value::{ObjectId, Value};
use super::{Abrupt, Completion};

pub struct Listener {
    pub event: Rc<str>,
    pub callback: Value,
}

pub struct ElementData {
    /// Lowercase tag name.
    pub tag: Rc<str>,
    pub attrs: Vec<(Rc<str>, Rc<str>)>,
    pub children: Vec<ObjectId>,
    pub parent: Option<ObjectId>,
    pub listeners: Vec<Listener>,
    /// `on<event>` property slots.
    pub handlers: Vec<(Rc<str>, Value)>,
    pub style: Option<ObjectId>,
    pub class_list: Option<ObjectId>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase().into(),
            attrs: Vec::new(),
            children: Vec::new(),
            parent: None,
            listeners: Vec::new(),
            handlers: Vec::new(),
            style: None,
            class_list: None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&Rc<str>> {
        self.attrs.iter().find(|(k, _)| &**k == name).map(|(_, v)| v)
    }

    pub fn set_attr(&mut self, name: &str, value: Rc<str>) {
        match self.attrs.iter_mut().find(|(k, _)| &**k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.into(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|(k, _)| &**k != name);
        self.attrs.len() != before
    }

    pub fn classes(&self) -> Vec<String> {
        self.attr("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

pub struct TextData {
    pub data: Rc<str>,
    pub parent: Option<ObjectId>,
}

/// The `document` global of one evaluation, plus the root element the preview renders into.
#[derive(Clone)]
pub struct Document {
    pub object: ObjectId,
    root: Rc<Cell<Option<ObjectId>>>,
}

impl Document {
    pub fn root(&self) -> Option<ObjectId> {
        self.root.get()
    }

    pub fn set_root(&self, root: ObjectId) {
        self.root.set(Some(root));
    }
}

// ---- tree helpers ------------------------------------------------------------------------------------------

pub(crate) fn element(it: &Interpreter, id: ObjectId) -> Option<&ElementData> {
    match &it.heap.get(id).kind {
        ObjectKind::Element(e) => Some(e),
        _ => None,
    }
}

pub(crate) fn element_mut(it: &mut Interpreter, id: ObjectId) -> Option<&mut ElementData> {
    match &mut it.heap.get_mut(id).kind {
        ObjectKind::Element(e) => Some(e),
        _ => None,
    }
}

pub(crate) fn is_node(it: &Interpreter, id: ObjectId) -> bool {
    matches!(it.heap.get(id).kind, ObjectKind::Element(_) | ObjectKind::Text(_))
}

pub(crate) fn parent(it: &Interpreter, id: ObjectId) -> Option<ObjectId> {
    match &it.heap.get(id).kind {
        ObjectKind::Element(e) => e.parent,
        ObjectKind::Text(t) => t.parent,
        _ => None,
    }
}

fn set_parent(it: &mut Interpreter, id: ObjectId, parent: Option<ObjectId>) {
    match &mut it.heap.get_mut(id).kind {
        ObjectKind::Element(e) => e.parent = parent,
        ObjectKind::Text(t) => t.parent = parent,
        _ => {}
    }
}

pub(crate) fn children(it: &Interpreter, id: ObjectId) -> Vec<ObjectId> {
    element(it, id).map(|e| e.children.clone()).unwrap_or_default()
}

/// Remove `node` from its parent, if it has one.
fn detach(it: &mut Interpreter, node: ObjectId) {
    if let Some(p) = parent(it, node) {
        if let Some(e) = element_mut(it, p) {
            e.children.retain(|c| *c != node);
        }
    }
    set_parent(it, node, None);
}

/// `true` if `node` is `ancestor` or lies below it.
pub(crate) fn contains(it: &Interpreter, ancestor: ObjectId, node: ObjectId) -> bool {
    let mut current = Some(node);
    while let Some(cur) = current {
        if cur == ancestor {
            return true;
        }
        current = parent(it, cur);
    }
    false
}

/// Elements below `root` in document order, `root` excluded.
pub(crate) fn descendants(it: &Interpreter, root: ObjectId) -> Vec<ObjectId> {
    let mut out = Vec::new();
    let mut stack: Vec<ObjectId> = children(it, root).into_iter().rev().collect();
    while let Some(id) = stack.pop() {
        if let Some(e) = element(it, id) {
            out.push(id);
            stack.extend(e.children.iter().rev());
        }
    }
    out
}

/// Concatenated text of every text node below `id`.
pub(crate) fn text_content(it: &Interpreter, id: ObjectId) -> String {
    let mut out = String::new();
    let mut stack = vec![id];
    while let Some(node) = stack.pop() {
        match &it.heap.get(node).kind {
            ObjectKind::Text(t) => out.push_str(&t.data),
            ObjectKind::Element(e) => stack.extend(e.children.iter().rev()),
            _ => {}
        }
    }
    out
}

/// Replace every child of `id` with a single text node (none for the empty string).
fn replace_children_with_text(it: &mut Interpreter, id: ObjectId, text: Rc<str>) -> Completion<()> {
    for child in children(it, id) {
        set_parent(it, child, None);
    }
    if let Some(e) = element_mut(it, id) {
        e.children.clear();
    }
    if !text.is_empty() {
        let node = new_text(it, text)?;
        insert_child(it, id, node, None)?;
    }
    Ok(())
}

pub(crate) fn new_element(it: &mut Interpreter, tag: &str) -> Completion<ObjectId> {
    let proto = it.realm.element_proto;
    it.alloc(Object::new(ObjectKind::Element(ElementData::new(tag)), Some(proto)))
}

pub(crate) fn new_text(it: &mut Interpreter, data: Rc<str>) -> Completion<ObjectId> {
    let proto = it.realm.text_proto;
    it.alloc(Object::new(ObjectKind::Text(TextData { data, parent: None }), Some(proto)))
}

/// Insert `child` into `parent` before `reference` (or at the end), moving it out of its old position.
fn insert_child(
    it: &mut Interpreter,
    parent_id: ObjectId,
    child: ObjectId,
    reference: Option<ObjectId>,
) -> Completion<()> {
    if contains(it, child, parent_id) {
        return Err(it.throw_error(
            ErrorType::Error,
            "Failed to execute 'appendChild' on 'Node': The new child element contains the parent.",
        ));
    }
    detach(it, child);
    let Some(e) = element_mut(it, parent_id) else {
        return Err(it.type_error("This node type does not support this method."));
    };
    let at = reference
        .and_then(|r| e.children.iter().position(|c| *c == r))
        .unwrap_or(e.children.len());
    e.children.insert(at, child);
    set_parent(it, child, Some(parent_id));
    Ok(())
}

fn node_arg(it: &mut Interpreter, args: &CallArgs<'_>, i: usize, method: &str) -> Completion<ObjectId> {
    match args.arg(i) {
        Value::Object(id) if is_node(it, id) => Ok(id),
        _ => Err(it.type_error(format!(
            "Failed to execute '{method}' on 'Node': parameter {} is not of type 'Node'.",
            i + 1
        ))),
    }
}

fn this_node(it: &mut Interpreter, args: &CallArgs<'_>) -> Completion<ObjectId> {
    match args.this {
        Value::Object(id) if is_node(it, id) => Ok(id),
        _ => Err(it.type_error("Illegal invocation")),
    }
}

fn this_element(it: &mut Interpreter, args: &CallArgs<'_>) -> Completion<ObjectId> {
    match args.this {
        Value::Object(id) if element(it, id).is_some() => Ok(id),
        _ => Err(it.type_error("Illegal invocation")),
    }
}

fn valid_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

// ---- installation ------------------------------------------------------------------------------------------

/// Install `document`, `Event`, `CustomEvent` and the node methods into the realm.
pub fn install(it: &mut Interpreter) -> Completion<Document> {
    install_node_methods(it)?;
    install_element_methods(it)?;
    install_events(it)?;

    let root: Rc<Cell<Option<ObjectId>>> = Rc::new(Cell::new(None));
    let document = it.new_object()?;
    it.define_method(document, "createElement", 1, |it, args| {
        let tag = super::intrinsics::string_arg(it, &args, 0)?;
        if !valid_name(&tag) {
            return Err(it.throw_error(
                ErrorType::Error,
                format!(
                    "Failed to execute 'createElement' on 'Document': The tag name provided ('{tag}') is not a valid name."
                ),
            ));
        }
        Ok(Value::Object(new_element(it, &tag)?))
    })?;
    it.define_method(document, "createTextNode", 1, |it, args| {
        let data = super::intrinsics::string_arg(it, &args, 0)?;
        Ok(Value::Object(new_text(it, data)?))
    })?;
    let cell = Rc::clone(&root);
    it.define_method(document, "getElementById", 1, move |it, args| {
        let wanted = super::intrinsics::string_arg(it, &args, 0)?;
        let Some(root) = cell.get() else {
            return Ok(Value::Null);
        };
        let found = std::iter::once(root)
            .chain(descendants(it, root))
            .find(|id| element(it, *id).and_then(|e| e.attr("id")).is_some_and(|v| *v == wanted));
        Ok(found.map_or(Value::Null, Value::Object))
    })?;
    let cell = Rc::clone(&root);
    it.define_method(document, "querySelector", 1, move |it, args| match cell.get() {
        Some(root) => query(it, root, &args, false),
        None => Ok(Value::Null),
    })?;
    let cell = Rc::clone(&root);
    it.define_method(document, "querySelectorAll", 1, move |it, args| match cell.get() {
        Some(root) => query(it, root, &args, true),
        None => Ok(Value::Object(it.new_array(Vec::new())?)),
    })?;
    it.define_global("document", Value::Object(document));
    Ok(Document { object: document, root })
}

fn install_node_methods(it: &mut Interpreter) -> Completion<()> {
    let proto = it.realm.node_proto;
    it.define_method(proto, "appendChild", 1, |it, args| {
        let parent_id = this_node(it, &args)?;
        let child = node_arg(it, &args, 0, "appendChild")?;
        insert_child(it, parent_id, child, None)?;
        Ok(Value::Object(child))
    })?;
    it.define_method(proto, "insertBefore", 2, |it, args| {
        let parent_id = this_node(it, &args)?;
        let child = node_arg(it, &args, 0, "insertBefore")?;
        let reference = match args.arg(1) {
            Value::Null | Value::Undefined => None,
            _ => {
                let r = node_arg(it, &args, 1, "insertBefore")?;
                if parent(it, r) != Some(parent_id) {
                    return Err(it.throw_error(
                        ErrorType::Error,
                        "Failed to execute 'insertBefore' on 'Node': The node before which the new node is to be inserted is not a child of this node.",
                    ));
                }
                Some(r)
            }
        };
        insert_child(it, parent_id, child, reference)?;
        Ok(Value::Object(child))
    })?;
    it.define_method(proto, "removeChild", 1, |it, args| {
        let parent_id = this_node(it, &args)?;
        let child = node_arg(it, &args, 0, "removeChild")?;
        if parent(it, child) != Some(parent_id) {
            return Err(it.throw_error(
                ErrorType::Error,
                "Failed to execute 'removeChild' on 'Node': The node to be removed is not a child of this node.",
            ));
        }
        detach(it, child);
        Ok(Value::Object(child))
    })?;
    it.define_method(proto, "remove", 0, |it, args| {
        let node = this_node(it, &args)?;
        detach(it, node);
        Ok(Value::Undefined)
    })?;
    it.define_method(proto, "contains", 1, |it, args| {
        let node = this_node(it, &args)?;
        Ok(Value::Bool(match args.arg(0) {
            Value::Object(other) if is_node(it, other) => contains(it, node, other),
            _ => false,
        }))
    })?;
    it.define_method(proto, "hasChildNodes", 0, |it, args| {
        let node = this_node(it, &args)?;
        Ok(Value::Bool(!children(it, node).is_empty()))
    })?;
    Ok(())
}

fn install_element_methods(it: &mut Interpreter) -> Completion<()> {
    let proto = it.realm.element_proto;
    it.define_method(proto, "append", 0, |it, args| {
        let parent_id = this_element(it, &args)?;
        for arg in args.args {
            let child = match arg {
                Value::Object(id) if is_node(it, *id) => *id,
                other => {
                    let text = it.to_string(other)?;
                    new_text(it, text)?
                }
            };
            insert_child(it, parent_id, child, None)?;
        }
        Ok(Value::Undefined)
    })?;
    it.define_method(proto, "setAttribute", 2, |it, args| {
        let id = this_element(it, &args)?;
        let name = super::intrinsics::string_arg(it, &args, 0)?.to_ascii_lowercase();
        if !valid_name(&name) {
            return Err(it.throw_error(
                ErrorType::Error,
                format!("Failed to execute 'setAttribute' on 'Element': '{name}' is not a valid attribute name."),
            ));
        }
        let value = super::intrinsics::string_arg(it, &args, 1)?;
        if let Some(e) = element_mut(it, id) {
            e.set_attr(&name, value);
        }
        Ok(Value::Undefined)
    })?;
    it.define_method(proto, "getAttribute", 1, |it, args| {
        let id = this_element(it, &args)?;
        let name = super::intrinsics::string_arg(it, &args, 0)?.to_ascii_lowercase();
        Ok(element(it, id)
            .and_then(|e| e.attr(&name).cloned())
            .map_or(Value::Null, Value::String))
    })?;
    it.define_method(proto, "removeAttribute", 1, |it, args| {
        let id = this_element(it, &args)?;
        let name = super::intrinsics::string_arg(it, &args, 0)?.to_ascii_lowercase();
        if let Some(e) = element_mut(it, id) {
            e.remove_attr(&name);
        }
        Ok(Value::Undefined)
    })?;
    it.define_method(proto, "hasAttribute", 1, |it, args| {
        let id = this_element(it, &args)?;
        let name = super::intrinsics::string_arg(it, &args, 0)?.to_ascii_lowercase();
        Ok(Value::Bool(element(it, id).is_some_and(|e| e.attr(&name).is_some())))
    })?;
    it.define_method(proto, "addEventListener", 2, |it, args| {
        let id = this_element(it, &args)?;
        let event = super::intrinsics::string_arg(it, &args, 0)?;
        let callback = args.arg(1);
        if !it.is_callable(&callback) {
            return Ok(Value::Undefined);
        }
        if let Some(e) = element_mut(it, id) {
            let duplicate = e
                .listeners
                .iter()
                .any(|l| l.event == event && super::value::strict_equals(&l.callback, &callback));
            if !duplicate {
                e.listeners.push(Listener { event, callback });
            }
        }
        Ok(Value::Undefined)
    })?;
    it.define_method(proto, "removeEventListener", 2, |it, args| {
        let id = this_element(it, &args)?;
        let event = super::intrinsics::string_arg(it, &args, 0)?;
        let callback = args.arg(1);
        if let Some(e) = element_mut(it, id) {
            e.listeners
                .retain(|l| !(l.event == event && super::value::strict_equals(&l.callback, &callback)));
        }
        Ok(Value::Undefined)
    })?;
    it.define_method(proto, "dispatchEvent", 1, |it, args| {
        let id = this_element(it, &args)?;
        let Value::Object(event) = args.arg(0) else {
            return Err(it.type_error(
                "Failed to execute 'dispatchEvent' on 'EventTarget': parameter 1 is not of type 'Event'.",
            ));
        };
        Ok(Value::Bool(dispatch(it, id, event)?))
    })?;
    it.define_method(proto, "click", 0, |it, args| {
        let id = this_element(it, &args)?;
        let disabled = element(it, id).is_some_and(|e| e.attr("disabled").is_some());
        if !disabled {
            let event = new_event(it, None, "click", true, true)?;
            dispatch(it, id, event)?;
        }
        Ok(Value::Undefined)
    })?;
    it.define_method(proto, "querySelector", 1, |it, args| {
        let id = this_element(it, &args)?;
        query(it, id, &args, false)
    })?;
    it.define_method(proto, "querySelectorAll", 1, |it, args| {
        let id = this_element(it, &args)?;
        query(it, id, &args, true)
    })?;
    it.define_method(proto, "matches", 1, |it, args| {
        let id = this_element(it, &args)?;
        let list = parse_selector(it, &args, "matches")?;
        Ok(Value::Bool(list.matches(it, id)))
    })?;
    it.define_method(proto, "closest", 1, |it, args| {
        let id = this_element(it, &args)?;
        let list = parse_selector(it, &args, "closest")?;
        let mut current = Some(id);
        while let Some(cur) = current {
            if element(it, cur).is_some() && list.matches(it, cur) {
                return Ok(Value::Object(cur));
            }
            current = parent(it, cur);
        }
        Ok(Value::Null)
    })?;
    Ok(())
}

fn parse_selector(it: &mut Interpreter, args: &CallArgs<'_>, method: &str) -> Completion<selector::SelectorList> {
    let text = super::intrinsics::string_arg(it, args, 0)?;
    match selector::parse(&text) {
        Some(list) => Ok(list),
        None => Err(it.syntax_error(format!(
            "Failed to execute '{method}' on 'Element': '{text}' is not a valid selector."
        ))),
    }
}

fn query(it: &mut Interpreter, root: ObjectId, args: &CallArgs<'_>, all: bool) -> Completion<Value> {
    let method = if all { "querySelectorAll" } else { "querySelector" };
    let list = parse_selector(it, args, method)?;
    let mut found = Vec::new();
    for id in descendants(it, root) {
        if list.matches(it, id) {
            found.push(Value::Object(id));
            if !all {
                break;
            }
        }
    }
    if all {
        Ok(Value::Object(it.new_array(found)?))
    } else {
        Ok(found.into_iter().next().unwrap_or(Value::Null))
    }
}

// ---- events ------------------------------------------------------------------------------------------------

fn install_events(it: &mut Interpreter) -> Completion<()> {
    let event_proto = it.realm.event_proto;
    define_constructor(it, "Event", 1, event_proto, move |it, args| {
        let Some(target) = args.new_target else {
            return Err(it.type_error(
                "Failed to construct 'Event': Please use the 'new' operator, this DOM object constructor cannot be called as a function.",
            ));
        };
        let proto = it.prototype_from_constructor(target, event_proto)?;
        construct_event(it, &args, proto)
    })?;
    let custom_proto = it.new_object_with_proto(Some(event_proto))?;
    define_constructor(it, "CustomEvent", 1, custom_proto, move |it, args| {
        let Some(target) = args.new_target else {
            return Err(it.type_error(
                "Failed to construct 'CustomEvent': Please use the 'new' operator, this DOM object constructor cannot be called as a function.",
            ));
        };
        let proto = it.prototype_from_constructor(target, custom_proto)?;
        let event = construct_event(it, &args, proto)?;
        let detail = match args.arg(1) {
            Value::Object(options) => it.get_property(options, "detail")?,
            _ => Value::Undefined,
        };
        let detail = if detail.is_undefined() { Value::Null } else { detail };
        it.set(&event, "detail", detail)?;
        Ok(event)
    })?;

    it.define_method(event_proto, "preventDefault", 0, |it, args| {
        if it.get(&args.this, "cancelable")?.truthy() {
            it.set(&args.this, "defaultPrevented", Value::Bool(true))?;
        }
        Ok(Value::Undefined)
    })?;
    it.define_method(event_proto, "stopPropagation", 0, |it, args| {
        it.set(&args.this, "cancelBubble", Value::Bool(true))?;
        Ok(Value::Undefined)
    })?;
    it.define_method(event_proto, "stopImmediatePropagation", 0, |it, args| {
        it.set(&args.this, "cancelBubble", Value::Bool(true))?;
        if let Value::Object(id) = args.this {
            it.define_hidden(id, "immediatePropagationStopped", Value::Bool(true));
        }
        Ok(Value::Undefined)
    })?;
    Ok(())
}

fn construct_event(it: &mut Interpreter, args: &CallArgs<'_>, proto: ObjectId) -> Completion<Value> {
    if args.args.is_empty() {
        return Err(it.type_error(
            "Failed to construct 'Event': 1 argument required, but only 0 present.",
        ));
    }
    let kind = super::intrinsics::string_arg(it, args, 0)?;
    let (bubbles, cancelable) = match args.arg(1) {
        Value::Object(options) => (
            it.get_property(options, "bubbles")?.truthy(),
            it.get_property(options, "cancelable")?.truthy(),
        ),
        _ => (false, false),
    };
    Ok(Value::Object(new_event(it, Some(proto), &kind, bubbles, cancelable)?))
}

fn new_event(
    it: &mut Interpreter,
    proto: Option<ObjectId>,
    kind: &str,
    bubbles: bool,
    cancelable: bool,
) -> Completion<ObjectId> {
    let proto = proto.unwrap_or(it.realm.event_proto);
    let event = it.new_object_with_proto(Some(proto))?;
    it.define_data(event, "type", Value::from(kind));
    it.define_data(event, "bubbles", Value::Bool(bubbles));
    it.define_data(event, "cancelable", Value::Bool(cancelable));
    it.define_data(event, "defaultPrevented", Value::Bool(false));
    it.define_data(event, "cancelBubble", Value::Bool(false));
    it.define_data(event, "target", Value::Null);
    it.define_data(event, "currentTarget", Value::Null);
    Ok(event)
}

/// Deliver `event` at `target` and, if it bubbles, at each ancestor. Returns `!defaultPrevented`.
///
/// A listener that throws is reported on the console and does not stop delivery, as in a browser.
pub(crate) fn dispatch(it: &mut Interpreter, target: ObjectId, event: ObjectId) -> Completion<bool> {
    let kind = it.get_property(event, "type")?;
    let kind = it.to_string(&kind)?;
    let bubbles = it.get_property(event, "bubbles")?.truthy();
    it.set_property(event, "target", Value::Object(target))?;

    let mut path = vec![target];
    if bubbles {
        let mut current = parent(it, target);
        while let Some(p) = current {
            path.push(p);
            current = parent(it, p);
        }
    }

    let slot = format!("on{kind}");
    'path: for node in path {
        let Some(e) = element(it, node) else { continue };
        let mut callbacks: Vec<Value> = e
            .handlers
            .iter()
            .filter(|(name, v)| **name == *slot && !v.is_nullish())
            .map(|(_, v)| v.clone())
            .collect();
        callbacks.extend(e.listeners.iter().filter(|l| l.event == kind).map(|l| l.callback.clone()));
        it.set_property(event, "currentTarget", Value::Object(node))?;
        for callback in callbacks {
            match it.call(&callback, Value::Object(node), &[Value::Object(event)]) {
                Ok(_) => {}
                Err(Abrupt::Throw(error)) => {
                    let message = super::intrinsics::inspect(it, &error);
                    it.console_write(ConsoleLevel::Error, &format!("Uncaught {message}"));
                }
                Err(interrupt) => return Err(interrupt),
            }
            if it.lookup_chain(event, "immediatePropagationStopped").is_some_and(|v| v.truthy()) {
                break 'path;
            }
        }
        if it.get_property(event, "cancelBubble")?.truthy() {
            break;
        }
    }
    it.set_property(event, "currentTarget", Value::Null)?;
    Ok(!it.get_property(event, "defaultPrevented")?.truthy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_storage_keeps_order_and_overwrites() {
        let mut e = ElementData::new("DIV");
        assert_eq!(&*e.tag, "div");
        e.set_attr("id", "a".into());
        e.set_attr("class", "x y".into());
        e.set_attr("id", "b".into());
        assert_eq!(e.attr("id").map(|v| &**v), Some("b"));
        assert_eq!(e.attrs.len(), 2);
        assert_eq!(e.classes(), ["x", "y"]);
        assert!(e.remove_attr("id"));
        assert!(!e.remove_attr("id"));
    }

    #[test]
    fn test_names() {
        assert!(valid_name("div"));
        assert!(valid_name("my-widget"));
        assert!(!valid_name(""));
        assert!(!valid_name("1div"));
        assert!(!valid_name("a b"));
        assert!(!valid_name("<script>"));
    }
}
