//! Property access.
//!
//! Keys are always strings. Arrays keep their elements in a dense `Vec` and expose `length` and index keys
//! over it; DOM nodes route their reflected properties through `dom` hooks; everything else is a plain
//! prototype-chain lookup over [`PropertyMap`](crate::runtime::object::PropertyMap).

use std::rc::Rc;

use proctor_core::numbers::{as_array_index, key_as_index};
use proctor_core::strings::{utf16_char_at, utf16_len};

use super::Interpreter;
use crate::runtime::dom;
use crate::runtime::object::{FunctionData, Object, ObjectKind, Property};
use crate::runtime::value::{ObjectId, Value};
use crate::runtime::Completion;

/// What a write found when it inspected the target.
enum WriteCheck {
    Proceed,
    ReadOnly,
    NotExtensible,
}

impl Interpreter {
    /// `target[key]` for any value.
    pub fn get(&mut self, target: &Value, key: &str) -> Completion<Value> {
        match target {
            Value::Object(id) => self.get_property(*id, key),
            Value::Undefined | Value::Null => Err(self.type_error(format!(
                "Cannot read properties of {target} (reading '{key}')"
            ))),
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::from(utf16_len(s)));
                }
                if let Some(i) = key_as_index(key) {
                    return Ok(utf16_char_at(s, i).map_or(Value::Undefined, Value::from));
                }
                let proto = self.realm.string_proto;
                self.get_property(proto, key)
            }
            Value::Number(_) => {
                let proto = self.realm.number_proto;
                self.get_property(proto, key)
            }
            Value::Bool(_) => {
                let proto = self.realm.boolean_proto;
                self.get_property(proto, key)
            }
        }
    }

    pub fn get_property(&mut self, id: ObjectId, key: &str) -> Completion<Value> {
        match &self.heap.get(id).kind {
            ObjectKind::Array(items) => {
                if key == "length" {
                    return Ok(Value::from(items.len()));
                }
                if let Some(i) = key_as_index(key) {
                    return Ok(items.get(i).cloned().unwrap_or(Value::Undefined));
                }
            }
            ObjectKind::Element(_) | ObjectKind::Text(_) => {
                if let Some(value) = dom::get_hook(self, id, key)? {
                    return Ok(value);
                }
            }
            ObjectKind::Function(_) => {
                if let Some(value) = self.function_own_property(id, key)? {
                    return Ok(value);
                }
            }
            _ => {}
        }
        Ok(self.lookup_chain(id, key).unwrap_or(Value::Undefined))
    }

    /// Ordinary lookup along the prototype chain, without exotic behaviour.
    pub(crate) fn lookup_chain(&self, id: ObjectId, key: &str) -> Option<Value> {
        let mut current = Some(id);
        while let Some(cur) = current {
            let object = self.heap.get(cur);
            if let Some(p) = object.props.get(key) {
                return Some(p.value.clone());
            }
            current = object.proto;
        }
        None
    }

    /// `name`, `length` and the lazily created `prototype` of script functions.
    fn function_own_property(&mut self, id: ObjectId, key: &str) -> Completion<Option<Value>> {
        if !matches!(key, "name" | "length" | "prototype") || self.heap.get(id).props.contains(key) {
            return Ok(None);
        }
        let ObjectKind::Function(data) = &self.heap.get(id).kind else {
            return Ok(None);
        };
        let value = match (data, key) {
            (FunctionData::Script(c), "name") => Value::from(c.def.name.as_deref().unwrap_or("")),
            (FunctionData::Script(c), "length") => Value::from(c.def.arity()),
            (FunctionData::Class(c), "name") => Value::from(c.def.name.as_deref().unwrap_or("")),
            (FunctionData::Class(c), "length") => {
                Value::from(c.def.constructor.as_ref().map_or(0, |ctor| ctor.arity()))
            }
            (FunctionData::Bound(b), "name") => {
                let target = b.target;
                let inner = self.get_property(target, "name")?;
                Value::from(format!("bound {}", inner.primitive_to_string()))
            }
            (FunctionData::Bound(b), "length") => {
                let (target, bound_args) = (b.target, b.args.len());
                let inner = self.get_property(target, "length")?.primitive_to_number();
                Value::from((inner - bound_args as f64).max(0.0))
            }
            (FunctionData::Script(c), "prototype")
                if matches!(c.def.kind, proctor_syntax::ast::FunctionKind::Normal) =>
            {
                let proto = self.new_object()?;
                self.define_hidden(proto, "constructor", Value::Object(id));
                self.heap
                    .get_mut(id)
                    .props
                    .insert("prototype".into(), Property::hidden(Value::Object(proto)));
                Value::Object(proto)
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    /// `target[key] = value` with strict-mode failure semantics.
    pub fn set(&mut self, target: &Value, key: &str, value: Value) -> Completion<()> {
        match target {
            Value::Object(id) => self.set_property(*id, key, value),
            Value::Undefined | Value::Null => Err(self.type_error(format!(
                "Cannot set properties of {target} (setting '{key}')"
            ))),
            Value::String(s) => Err(self.type_error(format!("Cannot create property '{key}' on string '{s}'"))),
            other => Err(self.type_error(format!(
                "Cannot create property '{key}' on {} '{other}'",
                self.type_of(other)
            ))),
        }
    }

    pub fn set_property(&mut self, id: ObjectId, key: &str, value: Value) -> Completion<()> {
        match &self.heap.get(id).kind {
            ObjectKind::Array(_) => return self.set_array_property(id, key, value),
            ObjectKind::Element(_) | ObjectKind::Text(_) => {
                if dom::set_hook(self, id, key, &value)? {
                    return Ok(());
                }
            }
            _ => {}
        }
        self.write_own(id, key, value)
    }

    fn write_own(&mut self, id: ObjectId, key: &str, value: Value) -> Completion<()> {
        let check = {
            let object = self.heap.get(id);
            match object.props.get(key) {
                Some(p) if !p.writable => WriteCheck::ReadOnly,
                Some(_) => WriteCheck::Proceed,
                None if !object.extensible => WriteCheck::NotExtensible,
                None => WriteCheck::Proceed,
            }
        };
        match check {
            WriteCheck::ReadOnly => Err(self.type_error(format!(
                "Cannot assign to read only property '{key}' of object"
            ))),
            WriteCheck::NotExtensible => Err(self.type_error(format!(
                "Cannot add property {key}, object is not extensible"
            ))),
            WriteCheck::Proceed => {
                let props = &mut self.heap.get_mut(id).props;
                match props.get_mut(key) {
                    Some(p) => p.value = value,
                    None => props.insert(key.into(), Property::data(value)),
                }
                Ok(())
            }
        }
    }

    fn set_array_property(&mut self, id: ObjectId, key: &str, value: Value) -> Completion<()> {
        let index = key_as_index(key);
        if key != "length" && index.is_none() {
            return self.write_own(id, key, value);
        }
        if !self.heap.get(id).extensible {
            return Err(self.type_error(format!(
                "Cannot assign to read only property '{key}' of object '[object Array]'"
            )));
        }
        if key == "length" {
            let n = match &value {
                Value::Number(n) => as_array_index(*n),
                other => as_array_index(other.primitive_to_number()),
            };
            let Some(n) = n else {
                return Err(self.range_error("Invalid array length"));
            };
            return self.set_array_length(id, n);
        }
        let Some(i) = index else { return Ok(()) };
        self.check_array_len(i + 1)?;
        if let Some(items) = self.heap.get_mut(id).as_array_mut() {
            if i >= items.len() {
                items.resize(i + 1, Value::Undefined);
            }
            items[i] = value;
        }
        Ok(())
    }

    pub(crate) fn set_array_length(&mut self, id: ObjectId, len: usize) -> Completion<()> {
        self.check_array_len(len)?;
        if let Some(items) = self.heap.get_mut(id).as_array_mut() {
            items.resize(len, Value::Undefined);
        }
        Ok(())
    }

    /// `delete target[key]`.
    pub fn delete_property(&mut self, id: ObjectId, key: &str) -> Completion<bool> {
        let object = self.heap.get(id);
        let frozen = !object.extensible;
        let is_array = object.as_array().is_some();
        if is_array && key == "length" {
            return Err(self.type_error("Cannot delete property 'length' of [object Array]"));
        }
        let present = object.props.contains(key) || (is_array && key_as_index(key).is_some());
        if frozen && present {
            return Err(self.type_error(format!("Cannot delete property '{key}' of #<Object>")));
        }
        let object = self.heap.get_mut(id);
        if let (Some(i), Some(items)) = (key_as_index(key), object.as_array_mut()) {
            if let Some(slot) = items.get_mut(i) {
                *slot = Value::Undefined;
            }
            return Ok(true);
        }
        object.props.remove(key);
        Ok(true)
    }

    /// `key in object`.
    pub fn has_property(&self, id: ObjectId, key: &str) -> bool {
        let object = self.heap.get(id);
        match &object.kind {
            ObjectKind::Array(items) => {
                if key == "length" || key_as_index(key).is_some_and(|i| i < items.len()) {
                    return true;
                }
            }
            ObjectKind::Element(_) | ObjectKind::Text(_) if dom::has_hook(key) => return true,
            ObjectKind::Function(_) if matches!(key, "name" | "length") => return true,
            _ => {}
        }
        self.lookup_chain(id, key).is_some()
    }

    pub fn has_own_property(&self, id: ObjectId, key: &str) -> bool {
        let object = self.heap.get(id);
        if let Some(items) = object.as_array() {
            if key == "length" || key_as_index(key).is_some_and(|i| i < items.len()) {
                return true;
            }
        }
        object.props.contains(key)
    }

    /// Own enumerable string keys in property order: integer keys ascending, then insertion order.
    pub fn own_keys(&self, id: ObjectId) -> Vec<Rc<str>> {
        let object = self.heap.get(id);
        let mut keys: Vec<Rc<str>> = Vec::new();
        if let Some(items) = object.as_array() {
            keys.extend((0..items.len()).map(|i| Rc::from(i.to_string())));
        }
        let mut indexed: Vec<(usize, Rc<str>)> = Vec::new();
        let mut named: Vec<Rc<str>> = Vec::new();
        for (k, p) in object.props.iter() {
            if !p.enumerable {
                continue;
            }
            match key_as_index(k) {
                Some(i) => indexed.push((i, Rc::clone(k))),
                None => named.push(Rc::clone(k)),
            }
        }
        indexed.sort_by_key(|(i, _)| *i);
        keys.extend(indexed.into_iter().map(|(_, k)| k));
        keys.extend(named);
        keys
    }

    /// Keys visited by `for...in`: own enumerable keys, then inherited ones not already shadowed.
    pub fn for_in_keys(&self, id: ObjectId) -> Vec<Rc<str>> {
        let mut keys = self.own_keys(id);
        let mut seen: std::collections::HashSet<Rc<str>> = keys.iter().cloned().collect();
        let mut current = self.heap.get(id).proto;
        while let Some(cur) = current {
            for (k, p) in self.heap.get(cur).props.iter() {
                if seen.insert(Rc::clone(k)) && p.enumerable {
                    keys.push(Rc::clone(k));
                }
            }
            current = self.heap.get(cur).proto;
        }
        keys
    }

    /// Own enumerable `(key, value)` pairs, the view `Object.entries` and spread share.
    pub fn own_entries(&mut self, id: ObjectId) -> Completion<Vec<(Rc<str>, Value)>> {
        let keys = self.own_keys(id);
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.get_property(id, &key)?;
            out.push((key, value));
        }
        Ok(out)
    }

    /// `Object.freeze`: no new keys, every existing key read-only.
    pub fn freeze(&mut self, id: ObjectId) {
        let object = self.heap.get_mut(id);
        object.extensible = false;
        for p in object.props.values_mut() {
            p.writable = false;
        }
    }

    /// Prototype of `id`, as a script value.
    pub fn prototype_of(&self, id: ObjectId) -> Value {
        self.heap.get(id).proto.map_or(Value::Null, Value::Object)
    }

    /// Allocate an ordinary object with an explicit prototype (`Object.create`).
    pub fn new_object_with_proto(&mut self, proto: Option<ObjectId>) -> Completion<ObjectId> {
        self.alloc(Object::new(ObjectKind::Ordinary, proto))
    }

    pub fn is_array(&self, value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|id| self.heap.get(id).as_array().is_some())
    }

    /// Clone of an array's elements, or `None` for non-arrays.
    pub fn array_items(&self, value: &Value) -> Option<Vec<Value>> {
        value.as_object().and_then(|id| self.heap.get(id).as_array().cloned())
    }
}
