//! `Object` and `Object.prototype`.

use std::rc::Rc;

use super::define_constructor;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::{ObjectKind, Property};
use crate::runtime::value::{ObjectId, Value};
use crate::runtime::Completion;

pub(super) fn install(it: &mut Interpreter) -> Completion<()> {
    let proto = it.realm.object_proto;
    let ctor = define_constructor(it, "Object", 1, proto, |it, args| match args.arg(0) {
        Value::Undefined | Value::Null => Ok(Value::Object(it.new_object()?)),
        Value::Object(id) => Ok(Value::Object(id)),
        primitive => Ok(primitive),
    })?;

    it.define_method(ctor, "keys", 1, |it, args| {
        let id = to_object_id(it, &args.arg(0))?;
        let keys = match id {
            Some(id) => it.own_keys(id).into_iter().map(Value::String).collect(),
            None => string_indices(&args.arg(0)),
        };
        Ok(Value::Object(it.new_array(keys)?))
    })?;
    it.define_method(ctor, "values", 1, |it, args| {
        let entries = entries_of(it, &args.arg(0))?;
        let values = entries.into_iter().map(|(_, v)| v).collect();
        Ok(Value::Object(it.new_array(values)?))
    })?;
    it.define_method(ctor, "entries", 1, |it, args| {
        let entries = entries_of(it, &args.arg(0))?;
        let mut pairs = Vec::with_capacity(entries.len());
        for (k, v) in entries {
            pairs.push(Value::Object(it.new_array(vec![Value::String(k), v])?));
        }
        Ok(Value::Object(it.new_array(pairs)?))
    })?;
    it.define_method(ctor, "assign", 2, |it, args| {
        let Some(target) = to_object_id(it, &args.arg(0))? else {
            return Err(it.type_error("Cannot convert undefined or null to object"));
        };
        for source in args.args.iter().skip(1) {
            it.copy_own_entries(source, target)?;
        }
        Ok(Value::Object(target))
    })?;
    it.define_method(ctor, "freeze", 1, |it, args| {
        let value = args.arg(0);
        if let Value::Object(id) = value {
            it.freeze(id);
        }
        Ok(value)
    })?;
    it.define_method(ctor, "isFrozen", 1, |it, args| {
        Ok(Value::Bool(match args.arg(0) {
            Value::Object(id) => {
                let object = it.heap.get(id);
                !object.extensible && object.props.iter().all(|(_, p)| !p.writable)
            }
            _ => true,
        }))
    })?;
    it.define_method(ctor, "create", 2, |it, args| {
        let proto = match args.arg(0) {
            Value::Object(id) => Some(id),
            Value::Null => None,
            other => {
                return Err(it.type_error(format!("Object prototype may only be an Object or null: {other}")));
            }
        };
        let id = it.new_object_with_proto(proto)?;
        if let Value::Object(props) = args.arg(1) {
            define_properties(it, id, props)?;
        }
        Ok(Value::Object(id))
    })?;
    it.define_method(ctor, "getPrototypeOf", 1, |it, args| match args.arg(0) {
        Value::Object(id) => Ok(it.prototype_of(id)),
        Value::String(_) => Ok(Value::Object(it.realm.string_proto)),
        Value::Number(_) => Ok(Value::Object(it.realm.number_proto)),
        Value::Bool(_) => Ok(Value::Object(it.realm.boolean_proto)),
        Value::Undefined | Value::Null => Err(it.type_error("Cannot convert undefined or null to object")),
    })?;
    it.define_method(ctor, "fromEntries", 1, |it, args| {
        let object = it.new_object()?;
        for entry in it.iterate_to_vec(&args.arg(0))? {
            let key = it.get(&entry, "0")?;
            let key = it.to_property_key(&key)?;
            let value = it.get(&entry, "1")?;
            it.define_data(object, &key, value);
        }
        Ok(Value::Object(object))
    })?;
    it.define_method(ctor, "defineProperty", 3, |it, args| {
        let Value::Object(id) = args.arg(0) else {
            return Err(it.type_error("Object.defineProperty called on non-object"));
        };
        let key = it.to_property_key(&args.arg(1))?;
        let Value::Object(descriptor) = args.arg(2) else {
            return Err(it.type_error("Property description must be an object"));
        };
        define_one(it, id, &key, descriptor)?;
        Ok(Value::Object(id))
    })?;
    it.define_method(ctor, "getOwnPropertyNames", 1, |it, args| {
        let Some(id) = to_object_id(it, &args.arg(0))? else {
            return Ok(Value::Object(it.new_array(string_indices(&args.arg(0)))?));
        };
        let mut names: Vec<Value> = it.own_keys(id).into_iter().map(Value::String).collect();
        let object = it.heap.get(id);
        if object.as_array().is_some() {
            names.push(Value::from("length"));
        }
        let hidden: Vec<Value> = object
            .props
            .iter()
            .filter(|(_, p)| !p.enumerable)
            .map(|(k, _)| Value::String(Rc::clone(k)))
            .collect();
        names.extend(hidden);
        Ok(Value::Object(it.new_array(names)?))
    })?;

    it.define_method(proto, "hasOwnProperty", 1, |it, args| {
        let key = it.to_property_key(&args.arg(0))?;
        Ok(Value::Bool(match &args.this {
            Value::Object(id) => it.has_own_property(*id, &key),
            Value::String(s) => {
                key.as_ref() == "length"
                    || proctor_core::numbers::key_as_index(&key)
                        .is_some_and(|i| i < proctor_core::strings::utf16_len(s))
            }
            _ => false,
        }))
    })?;
    it.define_method(proto, "toString", 0, |it, args| {
        Ok(Value::from(match &args.this {
            Value::Undefined => "[object Undefined]",
            Value::Null => "[object Null]",
            Value::Bool(_) => "[object Boolean]",
            Value::Number(_) => "[object Number]",
            Value::String(_) => "[object String]",
            Value::Object(id) => match &it.heap.get(*id).kind {
                ObjectKind::Array(_) => "[object Array]",
                ObjectKind::Function(_) => "[object Function]",
                ObjectKind::Error => "[object Error]",
                ObjectKind::Element(_) => "[object HTMLElement]",
                ObjectKind::Text(_) => "[object Text]",
                ObjectKind::Ordinary => "[object Object]",
            },
        }))
    })?;
    it.define_method(proto, "valueOf", 0, |_, args| Ok(args.this.clone()))?;
    it.define_method(proto, "isPrototypeOf", 1, |it, args| {
        Ok(Value::Bool(match (&args.this, args.arg(0)) {
            (Value::Object(proto), Value::Object(id)) => it.inherits_from(id, *proto),
            _ => false,
        }))
    })?;
    Ok(())
}

/// `ToObject` for the statics: objects pass through, strings are handled by the caller, null throws.
fn to_object_id(it: &mut Interpreter, value: &Value) -> Completion<Option<ObjectId>> {
    match value {
        Value::Object(id) => Ok(Some(*id)),
        Value::Undefined | Value::Null => Err(it.type_error("Cannot convert undefined or null to object")),
        _ => Ok(None),
    }
}

fn string_indices(value: &Value) -> Vec<Value> {
    match value {
        Value::String(s) => (0..proctor_core::strings::utf16_len(s))
            .map(|i| Value::from(i.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

fn entries_of(it: &mut Interpreter, value: &Value) -> Completion<Vec<(Rc<str>, Value)>> {
    match to_object_id(it, value)? {
        Some(id) => it.own_entries(id),
        None => Ok(match value {
            Value::String(s) => s
                .chars()
                .enumerate()
                .map(|(i, c)| (Rc::from(i.to_string()), Value::from(c.to_string())))
                .collect(),
            _ => Vec::new(),
        }),
    }
}

fn define_properties(
    it: &mut Interpreter,
    id: ObjectId,
    props: ObjectId,
) -> Completion<()> {
    for (key, descriptor) in it.own_entries(props)? {
        let Value::Object(descriptor) = descriptor else {
            return Err(it.type_error("Property description must be an object"));
        };
        define_one(it, id, &key, descriptor)?;
    }
    Ok(())
}

/// Data descriptors only; accessors are outside the supported language.
fn define_one(
    it: &mut Interpreter,
    id: ObjectId,
    key: &str,
    descriptor: ObjectId,
) -> Completion<()> {
    if it.has_own_property(descriptor, "get") || it.has_own_property(descriptor, "set") {
        return Err(it.type_error("Accessor properties are not supported"));
    }
    let value = it.get_property(descriptor, "value")?;
    let writable = it.get_property(descriptor, "writable")?.truthy();
    let enumerable = it.get_property(descriptor, "enumerable")?.truthy();
    if it.heap.get(id).as_array().is_some() || !it.heap.get(id).extensible {
        return Err(it.type_error(format!("Cannot redefine property: {key}")));
    }
    it.heap.get_mut(id).props.insert(
        key.into(),
        Property {
            value,
            enumerable,
            writable,
        },
    );
    Ok(())
}
