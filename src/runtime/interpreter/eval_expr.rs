//! Expression evaluation.

use std::rc::Rc;

use proctor_core::strings::utf16_len;
use proctor_syntax::ast::{
    Argument, ArrayElement, AssignOp, Expr, FunctionKind, LogicalOp, MemberProp, ObjectProp, Pattern, PropKey,
    Spanned, TemplatePart, UnaryOp, UpdateOp,
};

use super::{BindMode, Interpreter};
use crate::runtime::object::Property;
use crate::runtime::scope::{self, Scope, ScopeError, ScopeRef};
use crate::runtime::value::Value;
use crate::runtime::Completion;

/// An assignable location.
pub(crate) enum Reference<'a> {
    Binding(&'a str),
    Property { base: Value, key: Rc<str> },
}

impl Interpreter {
    pub(crate) fn eval(&mut self, expr: &Spanned<Expr>, scope: &ScopeRef) -> Completion<Value> {
        match &expr.node {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::String(s) => Ok(Value::from(s.as_str())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Template(parts) => self.eval_template(parts, scope),
            Expr::Ident(name) => {
                let result = scope::lookup(scope, name);
                self.scope_result(result, name)
            }
            Expr::This => self.this_value(scope),
            Expr::Array(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    match element {
                        ArrayElement::Expr(e) => items.push(self.eval(e, scope)?),
                        ArrayElement::Spread(e) => {
                            let v = self.eval(e, scope)?;
                            items.extend(self.iterate_to_vec(&v)?);
                            self.check_array_len(items.len())?;
                        }
                        ArrayElement::Hole => items.push(Value::Undefined),
                    }
                }
                Ok(Value::Object(self.new_array(items)?))
            }
            Expr::Object(props) => self.eval_object_literal(props, scope),
            Expr::Function(def) => {
                let id = match (&def.name, def.kind) {
                    (Some(name), FunctionKind::Normal) => {
                        let own = Scope::block(scope);
                        let id = self.make_closure(def, &own, None)?;
                        own.borrow_mut().define_const(name, Value::Object(id));
                        id
                    }
                    _ => self.make_closure(def, scope, None)?,
                };
                Ok(Value::Object(id))
            }
            Expr::Class(class) => self.eval_class(class, scope),
            Expr::Unary(op, operand) => self.eval_unary(*op, operand, scope),
            Expr::Update { op, prefix, target } => {
                let reference = self.eval_reference(target, scope)?;
                let old = self.get_reference(&reference, scope)?;
                let old = self.to_number(&old)?;
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.put_reference(&reference, Value::Number(new), scope)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Expr::Binary(lhs, op, rhs) => {
                let a = self.eval(lhs, scope)?;
                let b = self.eval(rhs, scope)?;
                self.binary_op(*op, &a, &b)
            }
            Expr::Logical(lhs, op, rhs) => {
                let a = self.eval(lhs, scope)?;
                if short_circuits(*op, &a) {
                    Ok(a)
                } else {
                    self.eval(rhs, scope)
                }
            }
            Expr::Assign { op, target, value } => self.eval_assign(*op, target, value, scope),
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, scope)?.truthy() {
                    self.eval(consequent, scope)
                } else {
                    self.eval(alternate, scope)
                }
            }
            Expr::Member { .. } | Expr::Call { .. } => {
                Ok(self.eval_chain(expr, scope)?.unwrap_or(Value::Undefined))
            }
            Expr::OptionalChain(inner) => Ok(self.eval_chain(inner, scope)?.unwrap_or(Value::Undefined)),
            Expr::New { callee, args } => {
                let constructor = self.eval(callee, scope)?;
                let args = self.eval_args(args, scope)?;
                let is_constructor = constructor
                    .as_object()
                    .is_some_and(|id| self.heap.get(id).is_constructor());
                if !is_constructor {
                    return Err(self.type_error(format!("{} is not a constructor", callee_text(&callee.node))));
                }
                self.construct(&constructor, &args)
            }
            Expr::SuperCall(args) => {
                let args = self.eval_args(args, scope)?;
                self.super_call(&args, scope)
            }
            Expr::SuperMember(prop) => {
                let key = self.member_key(prop, scope)?;
                self.super_get(&key, scope)
            }
            Expr::Sequence(items) => {
                let mut last = Value::Undefined;
                for item in items {
                    last = self.eval(item, scope)?;
                }
                Ok(last)
            }
        }
    }

    fn eval_template(&mut self, parts: &[TemplatePart], scope: &ScopeRef) -> Completion<Value> {
        let mut out = String::new();
        let mut len = 0;
        for part in parts {
            match part {
                TemplatePart::Literal(s) => {
                    len += utf16_len(s);
                    self.check_string_len(len)?;
                    out.push_str(s);
                }
                TemplatePart::Expr(e) => {
                    let v = self.eval(e, scope)?;
                    let s = self.to_string(&v)?;
                    len += utf16_len(&s);
                    self.check_string_len(len)?;
                    out.push_str(&s);
                }
            }
        }
        Ok(Value::from(out))
    }

    fn eval_object_literal(&mut self, props: &[ObjectProp], scope: &ScopeRef) -> Completion<Value> {
        let object = self.new_object()?;
        for prop in props {
            match prop {
                ObjectProp::KeyValue(key, value) => {
                    let key = self.prop_key(key, scope)?;
                    let v = self.eval(value, scope)?;
                    self.name_anonymous_function(&v, &key);
                    self.define_data(object, &key, v);
                }
                ObjectProp::Shorthand(name) => {
                    let result = scope::lookup(scope, name);
                    let v = self.scope_result(result, name)?;
                    self.define_data(object, name, v);
                }
                ObjectProp::Method(key, def) => {
                    let key = self.prop_key(key, scope)?;
                    let method = self.make_closure(def, scope, Some(object))?;
                    self.name_anonymous_function(&Value::Object(method), &key);
                    self.define_data(object, &key, Value::Object(method));
                }
                ObjectProp::Spread(e) => {
                    let source = self.eval(e, scope)?;
                    self.copy_own_entries(&source, object)?;
                }
            }
        }
        Ok(Value::Object(object))
    }

    /// `{ ...source }` and `Object.assign`: copy own enumerable entries of `source` into `target`.
    pub(crate) fn copy_own_entries(
        &mut self,
        source: &Value,
        target: crate::runtime::value::ObjectId,
    ) -> Completion<()> {
        match source {
            Value::Object(id) => {
                for (key, v) in self.own_entries(*id)? {
                    self.set_property(target, &key, v)?;
                }
            }
            Value::String(s) => {
                for (i, c) in s.chars().enumerate() {
                    self.set_property(target, &i.to_string(), Value::from(c.to_string()))?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn prop_key(&mut self, key: &PropKey, scope: &ScopeRef) -> Completion<Rc<str>> {
        match key {
            PropKey::Named(n) => Ok(n.as_str().into()),
            PropKey::Computed(e) => {
                let v = self.eval(e, scope)?;
                self.to_property_key(&v)
            }
        }
    }

    pub(crate) fn member_key(&mut self, prop: &MemberProp, scope: &ScopeRef) -> Completion<Rc<str>> {
        match prop {
            MemberProp::Named(n) => Ok(n.as_str().into()),
            MemberProp::Computed(e) => {
                let v = self.eval(e, scope)?;
                self.to_property_key(&v)
            }
        }
    }

    pub(crate) fn eval_args(&mut self, args: &[Argument], scope: &ScopeRef) -> Completion<Vec<Value>> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Argument::Expr(e) => out.push(self.eval(e, scope)?),
                Argument::Spread(e) => {
                    let v = self.eval(e, scope)?;
                    out.extend(self.iterate_to_vec(&v)?);
                }
            }
        }
        Ok(out)
    }

    /// Evaluate a member access or call that may sit inside an optional chain.
    ///
    /// `None` means a `?.` short-circuited; the enclosing [`Expr::OptionalChain`] turns it into `undefined`.
    fn eval_chain(&mut self, expr: &Spanned<Expr>, scope: &ScopeRef) -> Completion<Option<Value>> {
        match &expr.node {
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let Some(base) = self.eval_chain(object, scope)? else {
                    return Ok(None);
                };
                if *optional && base.is_nullish() {
                    return Ok(None);
                }
                let key = self.member_key(property, scope)?;
                self.get(&base, &key).map(Some)
            }
            Expr::Call {
                callee,
                args,
                optional,
            } => {
                let Some((function, this)) = self.eval_callee(callee, scope)? else {
                    return Ok(None);
                };
                if *optional && function.is_nullish() {
                    return Ok(None);
                }
                let args = self.eval_args(args, scope)?;
                match function {
                    Value::Object(id) if self.heap.get(id).is_callable() => {
                        self.call_function(id, this, &args).map(Some)
                    }
                    _ => Err(self.type_error(format!("{} is not a function", callee_text(&callee.node)))),
                }
            }
            _ => self.eval(expr, scope).map(Some),
        }
    }

    /// Resolve a callee to `(function, this)`.
    fn eval_callee(&mut self, callee: &Spanned<Expr>, scope: &ScopeRef) -> Completion<Option<(Value, Value)>> {
        match &callee.node {
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let Some(base) = self.eval_chain(object, scope)? else {
                    return Ok(None);
                };
                if *optional && base.is_nullish() {
                    return Ok(None);
                }
                let key = self.member_key(property, scope)?;
                let function = self.get(&base, &key)?;
                Ok(Some((function, base)))
            }
            Expr::SuperMember(prop) => {
                let key = self.member_key(prop, scope)?;
                let function = self.super_get(&key, scope)?;
                let this = self.this_value(scope)?;
                Ok(Some((function, this)))
            }
            _ => Ok(self.eval_chain(callee, scope)?.map(|f| (f, Value::Undefined))),
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Spanned<Expr>, scope: &ScopeRef) -> Completion<Value> {
        match op {
            UnaryOp::Typeof => {
                if let Expr::Ident(name) = &operand.node {
                    return match scope::lookup(scope, name) {
                        Ok(v) => Ok(Value::from(self.type_of(&v))),
                        Err(ScopeError::NotDefined) => Ok(Value::from("undefined")),
                        Err(e) => self.scope_result(Err(e), name),
                    };
                }
                let v = self.eval(operand, scope)?;
                Ok(Value::from(self.type_of(&v)))
            }
            UnaryOp::Delete => match &operand.node {
                Expr::Member { object, property, .. } => {
                    let base = self.eval(object, scope)?;
                    let key = self.member_key(property, scope)?;
                    match base {
                        Value::Object(id) => Ok(Value::Bool(self.delete_property(id, &key)?)),
                        Value::Undefined | Value::Null => {
                            Err(self.type_error("Cannot convert undefined or null to object"))
                        }
                        _ => Ok(Value::Bool(true)),
                    }
                }
                Expr::Ident(_) => Err(self.syntax_error("Delete of an unqualified identifier in strict mode.")),
                _ => {
                    self.eval(operand, scope)?;
                    Ok(Value::Bool(true))
                }
            },
            UnaryOp::Not => Ok(Value::Bool(!self.eval(operand, scope)?.truthy())),
            UnaryOp::Void => {
                self.eval(operand, scope)?;
                Ok(Value::Undefined)
            }
            UnaryOp::Neg => {
                let v = self.eval(operand, scope)?;
                Ok(Value::Number(-self.to_number(&v)?))
            }
            UnaryOp::Plus => {
                let v = self.eval(operand, scope)?;
                Ok(Value::Number(self.to_number(&v)?))
            }
            UnaryOp::BitNot => {
                let v = self.eval(operand, scope)?;
                let n = proctor_core::numbers::to_int32(self.to_number(&v)?);
                Ok(Value::Number(f64::from(!n)))
            }
        }
    }

    fn eval_assign(
        &mut self,
        op: AssignOp,
        target: &Spanned<Pattern>,
        value: &Spanned<Expr>,
        scope: &ScopeRef,
    ) -> Completion<Value> {
        let reference = match &target.node {
            Pattern::Ident(name) => Reference::Binding(name),
            Pattern::Member(member) => self.eval_reference(member, scope)?,
            Pattern::Object { .. } | Pattern::Array { .. } => {
                let v = self.eval(value, scope)?;
                self.bind_pattern(target, v.clone(), scope, BindMode::Assign)?;
                return Ok(v);
            }
        };
        let result = match op {
            AssignOp::Assign => {
                let v = self.eval(value, scope)?;
                if let Reference::Binding(name) = &reference {
                    self.name_anonymous_function(&v, name);
                }
                v
            }
            AssignOp::Compound(bin) => {
                let current = self.get_reference(&reference, scope)?;
                let rhs = self.eval(value, scope)?;
                self.binary_op(bin, &current, &rhs)?
            }
            AssignOp::Logical(logical) => {
                let current = self.get_reference(&reference, scope)?;
                if short_circuits(logical, &current) {
                    return Ok(current);
                }
                self.eval(value, scope)?
            }
        };
        self.put_reference(&reference, result.clone(), scope)?;
        Ok(result)
    }

    pub(crate) fn eval_reference<'a>(
        &mut self,
        expr: &'a Spanned<Expr>,
        scope: &ScopeRef,
    ) -> Completion<Reference<'a>> {
        match &expr.node {
            Expr::Ident(name) => Ok(Reference::Binding(name)),
            Expr::Member { object, property, .. } => {
                let base = self.eval(object, scope)?;
                let key = self.member_key(property, scope)?;
                Ok(Reference::Property { base, key })
            }
            Expr::SuperMember(property) => {
                let base = self.this_value(scope)?;
                let key = self.member_key(property, scope)?;
                Ok(Reference::Property { base, key })
            }
            _ => Err(self.syntax_error("Invalid left-hand side in assignment")),
        }
    }

    pub(crate) fn get_reference(&mut self, reference: &Reference<'_>, scope: &ScopeRef) -> Completion<Value> {
        match reference {
            Reference::Binding(name) => {
                let result = scope::lookup(scope, name);
                self.scope_result(result, name)
            }
            Reference::Property { base, key } => self.get(base, key),
        }
    }

    pub(crate) fn put_reference(&mut self, reference: &Reference<'_>, value: Value, scope: &ScopeRef) -> Completion<()> {
        match reference {
            Reference::Binding(name) => {
                let result = scope::assign(scope, name, value);
                self.scope_result(result, name)
            }
            Reference::Property { base, key } => self.set(base, key, value),
        }
    }

    /// Give an anonymous function the name of the binding or key it is first stored under.
    pub(crate) fn name_anonymous_function(&mut self, value: &Value, name: &str) {
        use crate::runtime::object::{FunctionData, ObjectKind};
        let Value::Object(id) = value else { return };
        let object = self.heap.get_mut(*id);
        let anonymous = match &object.kind {
            ObjectKind::Function(FunctionData::Script(c)) => c.def.name.is_none(),
            ObjectKind::Function(FunctionData::Class(c)) => c.def.name.is_none(),
            _ => false,
        };
        if anonymous && !object.props.contains("name") {
            object.props.insert("name".into(), Property::frozen(Value::from(name)));
        }
    }
}

fn short_circuits(op: LogicalOp, left: &Value) -> bool {
    match op {
        LogicalOp::And => !left.truthy(),
        LogicalOp::Or => left.truthy(),
        LogicalOp::Nullish => !left.is_nullish(),
    }
}

/// Source-like rendering of a callee for "is not a function" messages.
pub(crate) fn callee_text(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::This => "this".to_string(),
        Expr::Member { object, property, .. } => match property {
            MemberProp::Named(n) => format!("{}.{n}", callee_text(&object.node)),
            MemberProp::Computed(_) => format!("{}[...]", callee_text(&object.node)),
        },
        Expr::SuperMember(MemberProp::Named(n)) => format!("super.{n}"),
        Expr::Call { callee, .. } => format!("{}(...)", callee_text(&callee.node)),
        Expr::OptionalChain(inner) => callee_text(&inner.node),
        _ => "(intermediate value)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_syntax::ast::Span;

    fn member(object: Expr, name: &str) -> Expr {
        Expr::Member {
            object: Box::new(Spanned::new(object, Span::default())),
            property: MemberProp::Named(name.to_string()),
            optional: false,
        }
    }

    #[test]
    fn test_callee_text_renders_member_paths() {
        let expr = member(member(Expr::Ident("user".into()), "profile"), "greet");
        assert_eq!(callee_text(&expr), "user.profile.greet");
        assert_eq!(callee_text(&Expr::Number(1.0)), "(intermediate value)");
    }
}
