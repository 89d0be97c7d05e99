//! `Array` and `Array.prototype`.
//!
//! Methods operate on real arrays only; array-likes are accepted by `Array.from`.

use std::rc::Rc;

use proctor_core::numbers::as_array_index;
use proctor_core::strings::utf16_len;

use super::{define_constructor, relative_arg};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::object::CallArgs;
use crate::runtime::value::{compare_strings, same_value_zero, strict_equals, ObjectId, Value};
use crate::runtime::Completion;

pub(super) fn install(it: &mut Interpreter) -> Completion<()> {
    let proto = it.realm.array_proto;
    let ctor = define_constructor(it, "Array", 1, proto, |it, args| {
        if let [Value::Number(n)] = args.args {
            let Some(len) = as_array_index(*n) else {
                return Err(it.range_error("Invalid array length"));
            };
            it.check_array_len(len)?;
            return Ok(Value::Object(it.new_array(vec![Value::Undefined; len])?));
        }
        Ok(Value::Object(it.new_array(args.args.to_vec())?))
    })?;

    it.define_method(ctor, "isArray", 1, |it, args| Ok(Value::Bool(it.is_array(&args.arg(0)))))?;
    it.define_method(ctor, "of", 0, |it, args| Ok(Value::Object(it.new_array(args.args.to_vec())?)))?;
    it.define_method(ctor, "from", 1, array_from)?;

    it.define_method(proto, "push", 1, |it, args| {
        let id = this_array(it, &args, "push")?;
        let len = length(it, id) + args.args.len();
        it.check_array_len(len)?;
        if let Some(items) = it.heap.get_mut(id).as_array_mut() {
            items.extend_from_slice(args.args);
        }
        Ok(Value::from(len))
    })?;
    it.define_method(proto, "pop", 0, |it, args| {
        let id = this_array(it, &args, "pop")?;
        Ok(it
            .heap
            .get_mut(id)
            .as_array_mut()
            .and_then(Vec::pop)
            .unwrap_or(Value::Undefined))
    })?;
    it.define_method(proto, "shift", 0, |it, args| {
        let id = this_array(it, &args, "shift")?;
        let items = it.heap.get_mut(id).as_array_mut();
        Ok(match items {
            Some(items) if !items.is_empty() => items.remove(0),
            _ => Value::Undefined,
        })
    })?;
    it.define_method(proto, "unshift", 1, |it, args| {
        let id = this_array(it, &args, "unshift")?;
        let len = length(it, id) + args.args.len();
        it.check_array_len(len)?;
        if let Some(items) = it.heap.get_mut(id).as_array_mut() {
            items.splice(0..0, args.args.iter().cloned());
        }
        Ok(Value::from(len))
    })?;
    it.define_method(proto, "slice", 2, |it, args| {
        let id = this_array(it, &args, "slice")?;
        let items = snapshot(it, id);
        let start = relative_arg(it, &args.arg(0), items.len(), 0)?;
        let end = relative_arg(it, &args.arg(1), items.len(), items.len())?;
        let slice = items.get(start..end.max(start)).unwrap_or_default().to_vec();
        Ok(Value::Object(it.new_array(slice)?))
    })?;
    it.define_method(proto, "splice", 2, |it, args| {
        let id = this_array(it, &args, "splice")?;
        let len = length(it, id);
        let start = relative_arg(it, &args.arg(0), len, 0)?;
        let delete_count = match args.args.len() {
            0 => 0,
            1 => len - start,
            _ => {
                let n = it.to_integer(&args.arg(1))?;
                (n.max(0.0) as usize).min(len - start)
            }
        };
        let inserted = args.args.get(2..).unwrap_or_default();
        it.check_array_len(len - delete_count + inserted.len())?;
        let removed: Vec<Value> = match it.heap.get_mut(id).as_array_mut() {
            Some(items) => items
                .splice(start..start + delete_count, inserted.iter().cloned())
                .collect(),
            None => Vec::new(),
        };
        Ok(Value::Object(it.new_array(removed)?))
    })?;
    it.define_method(proto, "concat", 1, |it, args| {
        let id = this_array(it, &args, "concat")?;
        let mut out = snapshot(it, id);
        for arg in args.args {
            match it.array_items(arg) {
                Some(items) => out.extend(items),
                None => out.push(arg.clone()),
            }
            it.check_array_len(out.len())?;
        }
        Ok(Value::Object(it.new_array(out)?))
    })?;
    it.define_method(proto, "join", 1, |it, args| {
        let id = this_array(it, &args, "join")?;
        let separator: Rc<str> = match args.arg(0) {
            Value::Undefined => ",".into(),
            other => it.to_string(&other)?,
        };
        join(it, id, &separator)
    })?;
    it.define_method(proto, "toString", 0, |it, args| match &args.this {
        Value::Object(id) if it.heap.get(*id).as_array().is_some() => join(it, *id, ","),
        _ => Ok(Value::from("[object Object]")),
    })?;
    it.define_method(proto, "reverse", 0, |it, args| {
        let id = this_array(it, &args, "reverse")?;
        if let Some(items) = it.heap.get_mut(id).as_array_mut() {
            items.reverse();
        }
        Ok(args.this.clone())
    })?;
    it.define_method(proto, "indexOf", 1, |it, args| {
        let id = this_array(it, &args, "indexOf")?;
        let items = snapshot(it, id);
        let from = relative_arg(it, &args.arg(1), items.len(), 0)?;
        let needle = args.arg(0);
        let found = items.iter().skip(from).position(|v| strict_equals(v, &needle));
        Ok(Value::Number(found.map_or(-1.0, |i| (i + from) as f64)))
    })?;
    it.define_method(proto, "lastIndexOf", 1, |it, args| {
        let id = this_array(it, &args, "lastIndexOf")?;
        let needle = args.arg(0);
        let found = snapshot(it, id).iter().rposition(|v| strict_equals(v, &needle));
        Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
    })?;
    it.define_method(proto, "includes", 1, |it, args| {
        let id = this_array(it, &args, "includes")?;
        let items = snapshot(it, id);
        let from = relative_arg(it, &args.arg(1), items.len(), 0)?;
        let needle = args.arg(0);
        Ok(Value::Bool(items.iter().skip(from).any(|v| same_value_zero(v, &needle))))
    })?;
    it.define_method(proto, "at", 1, |it, args| {
        let id = this_array(it, &args, "at")?;
        let items = snapshot(it, id);
        let n = it.to_integer(&args.arg(0))?;
        let index = if n < 0.0 { items.len() as f64 + n } else { n };
        Ok(if index < 0.0 {
            Value::Undefined
        } else {
            items.get(index as usize).cloned().unwrap_or(Value::Undefined)
        })
    })?;
    it.define_method(proto, "fill", 1, |it, args| {
        let id = this_array(it, &args, "fill")?;
        let len = length(it, id);
        let start = relative_arg(it, &args.arg(1), len, 0)?;
        let end = relative_arg(it, &args.arg(2), len, len)?;
        let value = args.arg(0);
        if let Some(items) = it.heap.get_mut(id).as_array_mut() {
            for slot in items.iter_mut().take(end).skip(start) {
                *slot = value.clone();
            }
        }
        Ok(args.this.clone())
    })?;

    it.define_method(proto, "forEach", 1, |it, args| {
        each(it, &args, "forEach", |_, _, _| Ok(None))?;
        Ok(Value::Undefined)
    })?;
    it.define_method(proto, "map", 1, |it, args| {
        let mut out = Vec::new();
        each(it, &args, "map", |_, _, result| {
            out.push(result);
            Ok(None)
        })?;
        Ok(Value::Object(it.new_array(out)?))
    })?;
    it.define_method(proto, "filter", 1, |it, args| {
        let mut out = Vec::new();
        each(it, &args, "filter", |_, item, result| {
            if result.truthy() {
                out.push(item);
            }
            Ok(None)
        })?;
        Ok(Value::Object(it.new_array(out)?))
    })?;
    it.define_method(proto, "find", 1, |it, args| {
        let found = each(it, &args, "find", |_, item, result| Ok(result.truthy().then_some(item)))?;
        Ok(found.map_or(Value::Undefined, |(_, v)| v))
    })?;
    it.define_method(proto, "findIndex", 1, |it, args| {
        let found = each(it, &args, "findIndex", |_, item, result| Ok(result.truthy().then_some(item)))?;
        Ok(Value::Number(found.map_or(-1.0, |(i, _)| i as f64)))
    })?;
    it.define_method(proto, "findLast", 1, |it, args| {
        let found = find_last(it, &args, "findLast")?;
        Ok(found.map_or(Value::Undefined, |(_, v)| v))
    })?;
    it.define_method(proto, "findLastIndex", 1, |it, args| {
        let found = find_last(it, &args, "findLastIndex")?;
        Ok(Value::Number(found.map_or(-1.0, |(i, _)| i as f64)))
    })?;
    it.define_method(proto, "some", 1, |it, args| {
        let found = each(it, &args, "some", |_, item, result| Ok(result.truthy().then_some(item)))?;
        Ok(Value::Bool(found.is_some()))
    })?;
    it.define_method(proto, "every", 1, |it, args| {
        let failed = each(it, &args, "every", |_, item, result| Ok((!result.truthy()).then_some(item)))?;
        Ok(Value::Bool(failed.is_none()))
    })?;
    it.define_method(proto, "reduce", 1, |it, args| reduce(it, &args, "reduce", false))?;
    it.define_method(proto, "reduceRight", 1, |it, args| reduce(it, &args, "reduceRight", true))?;
    it.define_method(proto, "sort", 1, |it, args| {
        let id = this_array(it, &args, "sort")?;
        let comparator = args.arg(0);
        if !comparator.is_undefined() && !it.is_callable(&comparator) {
            return Err(it.type_error(
                "The comparison function must be either a function or undefined",
            ));
        }
        let items = snapshot(it, id);
        let sorted = merge_sort(it, items, &comparator)?;
        if let Some(items) = it.heap.get_mut(id).as_array_mut() {
            *items = sorted;
        }
        Ok(args.this.clone())
    })?;
    it.define_method(proto, "flat", 0, |it, args| {
        let id = this_array(it, &args, "flat")?;
        let depth = match args.arg(0) {
            Value::Undefined => 1.0,
            other => it.to_integer(&other)?,
        };
        let items = snapshot(it, id);
        let mut out = Vec::new();
        flatten_into(it, items, depth, &mut out)?;
        Ok(Value::Object(it.new_array(out)?))
    })?;
    it.define_method(proto, "flatMap", 1, |it, args| {
        let mut mapped = Vec::new();
        each(it, &args, "flatMap", |_, _, result| {
            mapped.push(result);
            Ok(None)
        })?;
        let mut out = Vec::new();
        flatten_into(it, mapped, 1.0, &mut out)?;
        Ok(Value::Object(it.new_array(out)?))
    })?;
    Ok(())
}

fn this_array(it: &mut Interpreter, args: &CallArgs<'_>, method: &str) -> Completion<ObjectId> {
    match &args.this {
        Value::Object(id) if it.heap.get(*id).as_array().is_some() => Ok(*id),
        _ => Err(it.type_error(format!("Array.prototype.{method} called on a non-array value"))),
    }
}

fn length(it: &Interpreter, id: ObjectId) -> usize {
    it.heap.get(id).as_array().map_or(0, Vec::len)
}

fn snapshot(it: &Interpreter, id: ObjectId) -> Vec<Value> {
    it.heap.get(id).as_array().cloned().unwrap_or_default()
}

fn element(it: &Interpreter, id: ObjectId, i: usize) -> Option<Value> {
    it.heap.get(id).as_array().and_then(|items| items.get(i).cloned())
}

fn callback_arg(it: &mut Interpreter, args: &CallArgs<'_>) -> Completion<Value> {
    let callback = args.arg(0);
    if it.is_callable(&callback) {
        Ok(callback)
    } else {
        let shown = crate::runtime::intrinsics::inspect(it, &callback);
        Err(it.type_error(format!("{shown} is not a function")))
    }
}

/// Drive `callback(item, index, array)` over the elements present when the call started.
///
/// `visit` sees each item with the callback's result and may stop the walk by returning a value.
fn each<F>(it: &mut Interpreter, args: &CallArgs<'_>, method: &str, mut visit: F) -> Completion<Option<(usize, Value)>>
where
    F: FnMut(usize, Value, Value) -> Completion<Option<Value>>,
{
    let id = this_array(it, args, method)?;
    let callback = callback_arg(it, args)?;
    let this_arg = args.arg(1);
    let len = length(it, id);
    for i in 0..len {
        let Some(item) = element(it, id, i) else { break };
        let result = it.call(
            &callback,
            this_arg.clone(),
            &[item.clone(), Value::from(i), Value::Object(id)],
        )?;
        if let Some(stop) = visit(i, item, result)? {
            return Ok(Some((i, stop)));
        }
    }
    Ok(None)
}

fn find_last(it: &mut Interpreter, args: &CallArgs<'_>, method: &str) -> Completion<Option<(usize, Value)>> {
    let id = this_array(it, args, method)?;
    let callback = callback_arg(it, args)?;
    for i in (0..length(it, id)).rev() {
        let item = element(it, id, i).unwrap_or(Value::Undefined);
        let result = it.call(&callback, args.arg(1), &[item.clone(), Value::from(i), Value::Object(id)])?;
        if result.truthy() {
            return Ok(Some((i, item)));
        }
    }
    Ok(None)
}

fn reduce(it: &mut Interpreter, args: &CallArgs<'_>, method: &str, from_right: bool) -> Completion<Value> {
    let id = this_array(it, args, method)?;
    let callback = callback_arg(it, args)?;
    let len = length(it, id);
    let mut order: Box<dyn Iterator<Item = usize>> = if from_right {
        Box::new((0..len).rev())
    } else {
        Box::new(0..len)
    };
    let mut acc = if args.args.len() >= 2 {
        args.arg(1)
    } else {
        match order.next() {
            Some(i) => element(it, id, i).unwrap_or(Value::Undefined),
            None => return Err(it.type_error("Reduce of empty array with no initial value")),
        }
    };
    for i in order {
        let Some(item) = element(it, id, i) else { continue };
        acc = it.call(
            &callback,
            Value::Undefined,
            &[acc, item, Value::from(i), Value::Object(id)],
        )?;
    }
    Ok(acc)
}

/// `Array.prototype.join`, with cycles joining as the empty string.
pub(crate) fn join(it: &mut Interpreter, id: ObjectId, separator: &str) -> Completion<Value> {
    if it.join_stack.contains(&id) {
        return Ok(Value::from(""));
    }
    it.join_stack.push(id);
    let result = it.nested(|it| {
        let items = snapshot(it, id);
        let mut out = String::new();
        let mut len = 0;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
                len += utf16_len(separator);
            }
            if !item.is_nullish() {
                let s = it.to_string(item)?;
                len += utf16_len(&s);
                out.push_str(&s);
            }
            it.check_string_len(len)?;
        }
        Ok(Value::from(out))
    });
    it.join_stack.pop();
    result
}

fn array_from(it: &mut Interpreter, args: CallArgs<'_>) -> Completion<Value> {
    let source = args.arg(0);
    let items = match &source {
        Value::String(_) => it.iterate_to_vec(&source)?,
        Value::Object(id) => match it.heap.get(*id).as_array() {
            Some(items) => items.clone(),
            None => {
                let len = it.get_property(*id, "length")?;
                let len = it.to_integer(&len)?.max(0.0) as usize;
                it.check_array_len(len)?;
                let mut items = Vec::with_capacity(len);
                for i in 0..len {
                    items.push(it.get_property(*id, &i.to_string())?);
                }
                items
            }
        },
        Value::Undefined | Value::Null => {
            return Err(it.type_error(format!("{source} is not iterable")));
        }
        _ => Vec::new(),
    };
    let map = args.arg(1);
    if map.is_undefined() {
        return Ok(Value::Object(it.new_array(items)?));
    }
    if !it.is_callable(&map) {
        return Err(it.type_error("Array.from: when provided, the second argument must be a function"));
    }
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        out.push(it.call(&map, Value::Undefined, &[item, Value::from(i)])?);
    }
    Ok(Value::Object(it.new_array(out)?))
}

fn flatten_into(it: &mut Interpreter, items: Vec<Value>, depth: f64, out: &mut Vec<Value>) -> Completion<()> {
    for item in items {
        match it.array_items(&item) {
            Some(inner) if depth >= 1.0 => it.nested(|it| flatten_into(it, inner, depth - 1.0, out))?,
            _ => out.push(item),
        }
        it.check_array_len(out.len())?;
    }
    Ok(())
}

/// `a > b` under the sort comparator (or the default string order, which puts `undefined` last).
fn sort_greater(it: &mut Interpreter, comparator: &Value, a: &Value, b: &Value) -> Completion<bool> {
    match (a, b) {
        (Value::Undefined, Value::Undefined) => return Ok(false),
        (Value::Undefined, _) => return Ok(true),
        (_, Value::Undefined) => return Ok(false),
        _ => {}
    }
    if comparator.is_undefined() {
        let sa = it.to_string(a)?;
        let sb = it.to_string(b)?;
        return Ok(compare_strings(&sa, &sb) == std::cmp::Ordering::Greater);
    }
    let result = it.call(comparator, Value::Undefined, &[a.clone(), b.clone()])?;
    Ok(it.to_number(&result)? > 0.0)
}

/// Stable bottom-up merge sort. Tolerates inconsistent comparators, which `slice::sort_by` does not.
fn merge_sort(it: &mut Interpreter, mut items: Vec<Value>, comparator: &Value) -> Completion<Vec<Value>> {
    let n = items.len();
    let mut buffer: Vec<Value> = Vec::with_capacity(n);
    let mut width = 1;
    while width < n {
        buffer.clear();
        let mut start = 0;
        while start < n {
            let mid = (start + width).min(n);
            let end = (start + 2 * width).min(n);
            let (mut i, mut j) = (start, mid);
            while i < mid && j < end {
                it.checkpoint()?;
                if sort_greater(it, comparator, &items[i], &items[j])? {
                    buffer.push(items[j].clone());
                    j += 1;
                } else {
                    buffer.push(items[i].clone());
                    i += 1;
                }
            }
            buffer.extend_from_slice(&items[i..mid]);
            buffer.extend_from_slice(&items[j..end]);
            start = end;
        }
        std::mem::swap(&mut items, &mut buffer);
        width *= 2;
    }
    Ok(items)
}
