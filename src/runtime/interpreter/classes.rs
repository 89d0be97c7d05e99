//! Classes: definition, construction, fields and `super`.

use std::rc::Rc;

use proctor_syntax::ast::{ClassDef, ClassMember};

use super::Interpreter;
use crate::runtime::object::{ClassData, FunctionData, Object, ObjectKind, Property};
use crate::runtime::scope::{self, FunctionFrame, Scope, ScopeRef};
use crate::runtime::value::{ObjectId, Value};
use crate::runtime::Completion;

/// Construction inputs cloned out of a class object.
struct ClassParts {
    def: Rc<ClassDef>,
    scope: ScopeRef,
    parent: Option<ObjectId>,
    prototype: ObjectId,
}

impl Interpreter {
    pub(crate) fn eval_class(&mut self, def: &Rc<ClassDef>, scope: &ScopeRef) -> Completion<Value> {
        let parent = match &def.superclass {
            None => None,
            Some(expr) => {
                let value = self.eval(expr, scope)?;
                match value {
                    Value::Object(id) if self.heap.get(id).is_constructor() => Some(id),
                    other => {
                        return Err(self.type_error(format!(
                            "Class extends value {other} is not a constructor or null"
                        )));
                    }
                }
            }
        };
        let proto_parent = match parent {
            Some(p) => match self.get_property(p, "prototype")? {
                Value::Object(proto) => proto,
                _ => return Err(self.type_error("Class extends value does not have valid prototype property")),
            },
            None => self.realm.object_proto,
        };
        let class_scope = Scope::block(scope);
        let prototype = self.alloc(Object::new(ObjectKind::Ordinary, Some(proto_parent)))?;

        // Field keys are resolved once, at definition time.
        let mut fields = Vec::new();
        for (index, member) in def.members.iter().enumerate() {
            if let ClassMember::Field {
                key, is_static: false, ..
            } = member
            {
                let key = self.prop_key(key, &class_scope)?;
                fields.push((key, index));
            }
        }

        let constructor_proto = parent.unwrap_or(self.realm.function_proto);
        let class = self.alloc(Object::new(
            ObjectKind::Function(FunctionData::Class(ClassData {
                def: Rc::clone(def),
                scope: Rc::clone(&class_scope),
                parent,
                prototype,
                fields,
            })),
            Some(constructor_proto),
        ))?;
        self.heap
            .get_mut(class)
            .props
            .insert("prototype".into(), Property::frozen(Value::Object(prototype)));
        self.define_hidden(prototype, "constructor", Value::Object(class));
        if let Some(name) = &def.name {
            class_scope.borrow_mut().define_const(name, Value::Object(class));
        }

        for member in &def.members {
            match member {
                ClassMember::Method {
                    key,
                    function,
                    is_static,
                } => {
                    let target = if *is_static { class } else { prototype };
                    let key = self.prop_key(key, &class_scope)?;
                    let method = self.make_closure(function, &class_scope, Some(target))?;
                    self.name_anonymous_function(&Value::Object(method), &key);
                    self.define_hidden(target, &key, Value::Object(method));
                }
                ClassMember::Field {
                    key,
                    value,
                    is_static: true,
                } => {
                    let key = self.prop_key(key, &class_scope)?;
                    let v = match value {
                        Some(expr) => {
                            let field_scope = Scope::function(
                                &class_scope,
                                FunctionFrame {
                                    this: Some(Value::Object(class)),
                                    home_object: Some(class),
                                    ..FunctionFrame::default()
                                },
                            );
                            self.eval(expr, &field_scope)?
                        }
                        None => Value::Undefined,
                    };
                    self.define_data(class, &key, v);
                }
                ClassMember::Field { .. } => {}
            }
        }
        Ok(Value::Object(class))
    }

    fn class_parts(&self, class: ObjectId) -> Option<ClassParts> {
        match &self.heap.get(class).kind {
            ObjectKind::Function(FunctionData::Class(c)) => Some(ClassParts {
                def: Rc::clone(&c.def),
                scope: Rc::clone(&c.scope),
                parent: c.parent,
                prototype: c.prototype,
            }),
            _ => None,
        }
    }

    pub(crate) fn construct_class(&mut self, class: ObjectId, args: &[Value], new_target: ObjectId) -> Completion<Value> {
        let Some(parts) = self.class_parts(class) else {
            return Err(self.type_error("object is not a constructor"));
        };
        let this = match parts.parent {
            Some(_) => None,
            None => {
                let proto = self.prototype_from_constructor(new_target, parts.prototype)?;
                let object = self.alloc(Object::new(ObjectKind::Ordinary, Some(proto)))?;
                self.initialize_fields(class, object)?;
                Some(Value::Object(object))
            }
        };
        let Some(constructor) = &parts.def.constructor else {
            // Implicit constructor: a derived class forwards its arguments to the parent.
            return match (this, parts.parent) {
                (Some(this), _) => Ok(this),
                (None, Some(parent)) => {
                    let object = self.construct_with(parent, args, new_target)?;
                    if let Value::Object(id) = object {
                        self.initialize_fields(class, id)?;
                    }
                    Ok(object)
                }
                (None, None) => Ok(Value::Undefined),
            };
        };
        let call_scope = Scope::function(
            &parts.scope,
            FunctionFrame {
                this,
                home_object: Some(parts.prototype),
                new_target: Some(new_target),
                class: Some(class),
            },
        );
        let result = self.run_function_body(constructor, &call_scope, args)?;
        if let Value::Object(_) = result {
            return Ok(result);
        }
        let this = call_scope.borrow().frame().and_then(|f| f.this.clone());
        match this {
            Some(this) => Ok(this),
            None => Err(self.reference_error(
                "Must call super constructor in derived class before accessing 'this' or returning from derived constructor",
            )),
        }
    }

    /// Define the instance fields of `class` on `object`, in declaration order.
    fn initialize_fields(&mut self, class: ObjectId, object: ObjectId) -> Completion<()> {
        let (def, class_scope, prototype, fields) = match &self.heap.get(class).kind {
            ObjectKind::Function(FunctionData::Class(c)) if !c.fields.is_empty() => {
                (Rc::clone(&c.def), Rc::clone(&c.scope), c.prototype, c.fields.clone())
            }
            _ => return Ok(()),
        };
        let field_scope = Scope::function(
            &class_scope,
            FunctionFrame {
                this: Some(Value::Object(object)),
                home_object: Some(prototype),
                ..FunctionFrame::default()
            },
        );
        for (key, index) in fields {
            let value = match def.members.get(index) {
                Some(ClassMember::Field { value: Some(expr), .. }) => self.eval(expr, &field_scope)?,
                _ => Value::Undefined,
            };
            self.name_anonymous_function(&value, &key);
            self.define_data(object, &key, value);
        }
        Ok(())
    }

    /// `super(...args)` inside a derived constructor.
    pub(crate) fn super_call(&mut self, args: &[Value], scope: &ScopeRef) -> Completion<Value> {
        let frame = scope::current_frame(scope);
        let Some(class) = frame.class else {
            return Err(self.syntax_error("'super' keyword unexpected here"));
        };
        let parent = self.class_parts(class).and_then(|p| p.parent);
        let Some(parent) = parent else {
            return Err(self.syntax_error("'super' keyword unexpected here"));
        };
        if frame.this.is_some() {
            return Err(self.reference_error("Super constructor may only be called once"));
        }
        let new_target = frame.new_target.unwrap_or(class);
        let this = self.construct_with(parent, args, new_target)?;
        if let Some(f) = scope::frame_scope(scope).borrow_mut().frame_mut() {
            f.this = Some(this.clone());
        }
        if let Value::Object(id) = this {
            self.initialize_fields(class, id)?;
        }
        Ok(Value::Undefined)
    }

    /// `super[key]`: lookup starting at the prototype of the home object.
    pub(crate) fn super_get(&mut self, key: &str, scope: &ScopeRef) -> Completion<Value> {
        let frame = scope::current_frame(scope);
        let Some(home) = frame.home_object else {
            return Err(self.syntax_error("'super' keyword unexpected here"));
        };
        match self.heap.get(home).proto {
            Some(proto) => self.get_property(proto, key),
            None => Ok(Value::Undefined),
        }
    }
}
