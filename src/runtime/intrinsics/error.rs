//! `Error` and the native error constructors.

use super::define_constructor;
use crate::runtime::interpreter::{ErrorType, Interpreter};
use crate::runtime::value::Value;
use crate::runtime::Completion;

pub(super) fn install(it: &mut Interpreter) -> Completion<()> {
    for kind in ErrorType::ALL {
        let proto = it.error_proto(kind);
        define_constructor(it, kind.name(), 1, proto, move |it, args| {
            let proto = match args.new_target {
                Some(target) => it.prototype_from_constructor(target, proto)?,
                None => proto,
            };
            let message = match args.arg(0) {
                Value::Undefined => "".into(),
                other => it.to_string(&other)?,
            };
            let name = it.get_property(proto, "name")?;
            let name = it.to_string(&name)?;
            let error = it.new_error_object(proto, &name, &message)?;
            if let Value::Object(options) = args.arg(1) {
                if it.has_property(options, "cause") {
                    let cause = it.get_property(options, "cause")?;
                    it.define_hidden(error, "cause", cause);
                }
            }
            Ok(Value::Object(error))
        })?;
        it.define_hidden(proto, "name", Value::from(kind.name()));
        it.define_hidden(proto, "message", Value::from(""));
    }

    let proto = it.realm.error_proto;
    it.define_method(proto, "toString", 0, |it, args| {
        let Value::Object(_) = args.this else {
            return Err(it.type_error("Error.prototype.toString called on non-object"));
        };
        let name = match it.get(&args.this, "name")? {
            Value::Undefined => "Error".into(),
            other => it.to_string(&other)?,
        };
        let message = match it.get(&args.this, "message")? {
            Value::Undefined => "".into(),
            other => it.to_string(&other)?,
        };
        Ok(Value::from(match (name.is_empty(), message.is_empty()) {
            (_, true) => name.to_string(),
            (true, false) => message.to_string(),
            (false, false) => format!("{name}: {message}"),
        }))
    })?;
    Ok(())
}
