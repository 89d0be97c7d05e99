//! `Function.prototype`. There is no `Function` constructor: source text never becomes code.

use crate::runtime::interpreter::Interpreter;
use crate::runtime::value::Value;
use crate::runtime::Completion;

pub(super) fn install(it: &mut Interpreter) -> Completion<()> {
    let proto = it.realm.function_proto;
    it.define_method(proto, "call", 1, |it, args| {
        let rest = args.args.get(1..).unwrap_or_default();
        it.call(&args.this, args.arg(0), rest)
    })?;
    it.define_method(proto, "apply", 2, |it, args| {
        let list = match args.arg(1) {
            Value::Undefined | Value::Null => Vec::new(),
            other => match it.array_items(&other) {
                Some(items) => items,
                None => return Err(it.type_error("CreateListFromArrayLike called on non-object")),
            },
        };
        it.call(&args.this, args.arg(0), &list)
    })?;
    it.define_method(proto, "bind", 1, |it, args| {
        let Some(target) = args.this.as_object().filter(|_| it.is_callable(&args.this)) else {
            return Err(it.type_error("Bind must be called on a function"));
        };
        let bound_args = args.args.get(1..).unwrap_or_default().to_vec();
        Ok(Value::Object(it.bind_function(target, args.arg(0), bound_args)?))
    })?;
    it.define_method(proto, "toString", 0, |it, args| {
        if !it.is_callable(&args.this) {
            return Err(it.type_error("Function.prototype.toString requires that 'this' be a Function"));
        }
        let name = it.get(&args.this, "name")?;
        Ok(Value::from(format!(
            "function {}() {{ [native code] }}",
            name.primitive_to_string()
        )))
    })?;
    Ok(())
}
