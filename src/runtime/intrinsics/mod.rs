//! Built-in globals and prototypes.
//!
//! Every intrinsic is an ordinary native function installed on the realm's prototypes or bound in the
//! global scope. Nothing here reaches outside the interpreter except `console`, which forwards to `tracing`.

mod array;
mod console;
mod error;
mod function;
pub mod json;
mod math;
mod number;
mod object;
mod string;

pub use console::inspect;

use std::rc::Rc;

use super::interpreter::Interpreter;
use super::object::{CallArgs, Property};
use super::value::{ObjectId, Value};
use super::Completion;

pub(crate) fn install(it: &mut Interpreter) -> Completion<()> {
    object::install(it)?;
    function::install(it)?;
    array::install(it)?;
    string::install(it)?;
    number::install(it)?;
    math::install(it)?;
    json::install(it)?;
    error::install(it)?;
    console::install(it)?;
    it.define_global("undefined", Value::Undefined);
    it.define_global("NaN", Value::Number(f64::NAN));
    it.define_global("Infinity", Value::Number(f64::INFINITY));
    Ok(())
}

/// Create a global constructor `name` whose instances inherit from `prototype`.
pub(crate) fn define_constructor<F>(
    it: &mut Interpreter,
    name: &str,
    arity: usize,
    prototype: ObjectId,
    f: F,
) -> Completion<ObjectId>
where
    F: Fn(&mut Interpreter, CallArgs<'_>) -> Completion<Value> + 'static,
{
    let ctor = it.native_with(name, arity, Rc::new(f), true)?;
    it.heap
        .get_mut(ctor)
        .props
        .insert("prototype".into(), Property::frozen(Value::Object(prototype)));
    it.define_hidden(prototype, "constructor", Value::Object(ctor));
    it.define_global(name, Value::Object(ctor));
    Ok(ctor)
}

/// A plain namespace object (`Math`, `JSON`, `console`) bound as a global.
pub(crate) fn define_namespace(it: &mut Interpreter, name: &str) -> Completion<ObjectId> {
    let ns = it.new_object()?;
    it.define_global(name, Value::Object(ns));
    Ok(ns)
}

/// Relative index argument as used by `slice`, `at` and friends: negative counts from the end.
pub(crate) fn relative_arg(it: &mut Interpreter, value: &Value, len: usize, default: usize) -> Completion<usize> {
    if value.is_undefined() {
        return Ok(default);
    }
    let n = it.to_integer(value)?;
    Ok(proctor_core::strings::relative_index(n, len))
}

/// The `i`th argument coerced to a string.
pub(crate) fn string_arg(it: &mut Interpreter, args: &CallArgs<'_>, i: usize) -> Completion<Rc<str>> {
    let v = args.arg(i);
    it.to_string(&v)
}

/// The `i`th argument coerced to a number.
pub(crate) fn number_arg(it: &mut Interpreter, args: &CallArgs<'_>, i: usize) -> Completion<f64> {
    let v = args.arg(i);
    it.to_number(&v)
}
