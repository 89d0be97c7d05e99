//! Closures, calls and `new`.

use std::rc::Rc;

use proctor_syntax::ast::{FunctionBody, FunctionDef, FunctionKind};

use super::{BindMode, Flow, Interpreter};
use crate::runtime::object::{CallArgs, Closure, FunctionData, NativeFn, Object, ObjectKind};
use crate::runtime::scope::{self, FunctionFrame, Scope, ScopeRef};
use crate::runtime::value::{ObjectId, Value};
use crate::runtime::Completion;

/// What `call_function` found behind a callable object, cloned out of the heap.
enum Callee {
    Script {
        def: Rc<FunctionDef>,
        scope: ScopeRef,
        home_object: Option<ObjectId>,
    },
    Native(NativeFn),
    Bound {
        target: ObjectId,
        this: Value,
        args: Vec<Value>,
    },
    Class(String),
}

impl Interpreter {
    pub(crate) fn make_closure(
        &mut self,
        def: &Rc<FunctionDef>,
        scope: &ScopeRef,
        home_object: Option<ObjectId>,
    ) -> Completion<ObjectId> {
        let proto = self.realm.function_proto;
        self.alloc(Object::new(
            ObjectKind::Function(FunctionData::Script(Closure {
                def: Rc::clone(def),
                scope: Rc::clone(scope),
                home_object,
            })),
            Some(proto),
        ))
    }

    /// Call any value; non-callables throw `TypeError`.
    pub fn call(&mut self, callee: &Value, this: Value, args: &[Value]) -> Completion<Value> {
        match callee {
            Value::Object(id) if self.heap.get(*id).is_callable() => self.call_function(*id, this, args),
            other => {
                let shown = match other {
                    Value::String(s) => format!("\"{s}\""),
                    Value::Object(_) => "object".to_string(),
                    primitive => primitive.to_string(),
                };
                Err(self.type_error(format!("{shown} is not a function")))
            }
        }
    }

    pub(crate) fn call_function(&mut self, id: ObjectId, this: Value, args: &[Value]) -> Completion<Value> {
        self.enter_call()?;
        let result = self.call_function_inner(id, this, args);
        self.leave_call();
        result
    }

    fn callee(&self, id: ObjectId) -> Option<Callee> {
        let ObjectKind::Function(data) = &self.heap.get(id).kind else {
            return None;
        };
        Some(match data {
            FunctionData::Script(c) => Callee::Script {
                def: Rc::clone(&c.def),
                scope: Rc::clone(&c.scope),
                home_object: c.home_object,
            },
            FunctionData::Native(n) => Callee::Native(Rc::clone(&n.call)),
            FunctionData::Bound(b) => Callee::Bound {
                target: b.target,
                this: b.this.clone(),
                args: b.args.clone(),
            },
            FunctionData::Class(c) => Callee::Class(c.def.name.clone().unwrap_or_default()),
        })
    }

    fn call_function_inner(&mut self, id: ObjectId, this: Value, args: &[Value]) -> Completion<Value> {
        match self.callee(id) {
            Some(Callee::Script {
                def,
                scope,
                home_object,
            }) => {
                let frame = (def.kind != FunctionKind::Arrow).then(|| FunctionFrame {
                    this: Some(this),
                    home_object,
                    ..FunctionFrame::default()
                });
                let call_scope = match frame {
                    Some(frame) => Scope::function(&scope, frame),
                    None => Scope::block(&scope),
                };
                self.run_function_body(&def, &call_scope, args)
            }
            Some(Callee::Native(f)) => f(
                self,
                CallArgs {
                    this,
                    args,
                    new_target: None,
                },
            ),
            Some(Callee::Bound {
                target,
                this,
                args: mut bound,
            }) => {
                bound.extend_from_slice(args);
                self.call_function(target, this, &bound)
            }
            Some(Callee::Class(name)) => Err(self.type_error(format!(
                "Class constructor {name} cannot be invoked without 'new'"
            ))),
            None => Err(self.type_error("object is not a function")),
        }
    }

    /// Bind parameters and run a function body in an already prepared call scope.
    pub(crate) fn run_function_body(
        &mut self,
        def: &FunctionDef,
        call_scope: &ScopeRef,
        args: &[Value],
    ) -> Completion<Value> {
        self.checkpoint()?;
        for (i, param) in def.params.iter().enumerate() {
            let value = args.get(i).cloned().unwrap_or(Value::Undefined);
            self.bind_element(param, value, call_scope, BindMode::Initialize)?;
        }
        if let Some(rest) = &def.rest {
            let remaining = args.get(def.params.len()..).unwrap_or_default().to_vec();
            let array = self.new_array(remaining)?;
            self.bind_pattern(rest, Value::Object(array), call_scope, BindMode::Initialize)?;
        }
        match &def.body {
            FunctionBody::Expr(expr) => self.eval(expr, call_scope),
            FunctionBody::Block(body) => {
                self.hoist_declarations(body, call_scope)?;
                match self.exec_statements(body, call_scope)? {
                    Flow::Return(value) => Ok(value),
                    _ => Ok(Value::Undefined),
                }
            }
        }
    }

    /// `new callee(...args)`.
    pub fn construct(&mut self, callee: &Value, args: &[Value]) -> Completion<Value> {
        match callee {
            Value::Object(id) if self.heap.get(*id).is_constructor() => self.construct_with(*id, args, *id),
            other => {
                let shown = crate::runtime::intrinsics::inspect(self, other);
                Err(self.type_error(format!("{shown} is not a constructor")))
            }
        }
    }

    /// Construct `id` with an explicit `new.target` (differs from `id` for `super(...)`).
    pub(crate) fn construct_with(&mut self, id: ObjectId, args: &[Value], new_target: ObjectId) -> Completion<Value> {
        self.enter_call()?;
        let result = self.construct_inner(id, args, new_target);
        self.leave_call();
        result
    }

    fn construct_inner(&mut self, id: ObjectId, args: &[Value], new_target: ObjectId) -> Completion<Value> {
        if matches!(self.heap.get(id).kind, ObjectKind::Function(FunctionData::Class(_))) {
            return self.construct_class(id, args, new_target);
        }
        match self.callee(id) {
            Some(Callee::Script { def, scope, .. }) => {
                let fallback = self.realm.object_proto;
                let proto = self.prototype_from_constructor(new_target, fallback)?;
                let this = self.alloc(Object::new(ObjectKind::Ordinary, Some(proto)))?;
                let call_scope = Scope::function(
                    &scope,
                    FunctionFrame {
                        this: Some(Value::Object(this)),
                        new_target: Some(new_target),
                        ..FunctionFrame::default()
                    },
                );
                let result = self.run_function_body(&def, &call_scope, args)?;
                Ok(match result {
                    Value::Object(_) => result,
                    _ => Value::Object(this),
                })
            }
            Some(Callee::Native(f)) => f(
                self,
                CallArgs {
                    this: Value::Undefined,
                    args,
                    new_target: Some(new_target),
                },
            ),
            _ => Err(self.type_error("object is not a constructor")),
        }
    }

    /// `new_target.prototype` if it is an object, else `fallback`.
    pub fn prototype_from_constructor(&mut self, new_target: ObjectId, fallback: ObjectId) -> Completion<ObjectId> {
        Ok(self
            .get_property(new_target, "prototype")?
            .as_object()
            .unwrap_or(fallback))
    }

    /// `this` in `scope`, resolved through arrow functions to the nearest function frame.
    pub(crate) fn this_value(&mut self, scope: &ScopeRef) -> Completion<Value> {
        let frame = scope::current_frame(scope);
        match (frame.this, frame.class) {
            (Some(this), _) => Ok(this),
            (None, Some(_)) => Err(self.reference_error(
                "Must call super constructor in derived class before accessing 'this' or returning from derived constructor",
            )),
            (None, None) => Ok(Value::Undefined),
        }
    }

    /// `Function.prototype.bind`.
    pub fn bind_function(&mut self, target: ObjectId, this: Value, args: Vec<Value>) -> Completion<ObjectId> {
        let proto = self.realm.function_proto;
        self.alloc(Object::new(
            ObjectKind::Function(FunctionData::Bound(crate::runtime::object::BoundFunction { target, this, args })),
            Some(proto),
        ))
    }
}
