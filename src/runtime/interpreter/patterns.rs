//! Destructuring.

use std::collections::HashSet;
use std::rc::Rc;

use proctor_syntax::ast::{Pattern, PatternElem, PropKey, Spanned};

use super::Interpreter;
use crate::runtime::scope::{self, BindingKind, ScopeError, ScopeRef};
use crate::runtime::value::Value;
use crate::runtime::Completion;

/// How a pattern's identifiers receive their values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindMode {
    /// Initialise a binding owned by the given scope, declaring it first if needed (parameters, `let`,
    /// `const`, `catch`).
    Initialize,
    /// Assign through the scope chain (`var` initialisers, plain assignment).
    Assign,
}

impl Interpreter {
    pub(crate) fn bind_pattern(
        &mut self,
        pattern: &Spanned<Pattern>,
        value: Value,
        scope: &ScopeRef,
        mode: BindMode,
    ) -> Completion<()> {
        match &pattern.node {
            Pattern::Ident(name) => self.bind_name(name, value, scope, mode),
            Pattern::Member(target) => {
                let reference = self.eval_reference(target, scope)?;
                self.put_reference(&reference, value, scope)
            }
            Pattern::Object { props, rest } => {
                if value.is_nullish() {
                    let first = props.first().and_then(|p| match &p.key {
                        PropKey::Named(n) => Some(n.clone()),
                        PropKey::Computed(_) => None,
                    });
                    return Err(match first {
                        Some(name) => self.type_error(format!(
                            "Cannot destructure property '{name}' of '{value}' as it is {value}."
                        )),
                        None => self.type_error(format!("Cannot destructure '{value}' as it is {value}.")),
                    });
                }
                let mut used: HashSet<Rc<str>> = HashSet::new();
                for prop in props {
                    let key: Rc<str> = match &prop.key {
                        PropKey::Named(n) => n.as_str().into(),
                        PropKey::Computed(e) => {
                            let k = self.eval(e, scope)?;
                            self.to_property_key(&k)?
                        }
                    };
                    let v = self.get(&value, &key)?;
                    used.insert(key);
                    self.bind_element(&prop.value, v, scope, mode)?;
                }
                if let Some(rest) = rest {
                    let collected = self.new_object()?;
                    if let Value::Object(source) = &value {
                        for (key, v) in self.own_entries(*source)? {
                            if !used.contains(&key) {
                                self.define_data(collected, &key, v);
                            }
                        }
                    }
                    self.bind_pattern(rest, Value::Object(collected), scope, mode)?;
                }
                Ok(())
            }
            Pattern::Array { elements, rest } => {
                let items = self.iterate_to_vec(&value)?;
                let mut iter = items.into_iter();
                for element in elements {
                    let v = iter.next().unwrap_or(Value::Undefined);
                    if let Some(element) = element {
                        self.bind_element(element, v, scope, mode)?;
                    }
                }
                if let Some(rest) = rest {
                    let remaining = self.new_array(iter.collect())?;
                    self.bind_pattern(rest, Value::Object(remaining), scope, mode)?;
                }
                Ok(())
            }
        }
    }

    /// Bind one element, applying its default when the value is `undefined`.
    pub(crate) fn bind_element(
        &mut self,
        element: &PatternElem,
        value: Value,
        scope: &ScopeRef,
        mode: BindMode,
    ) -> Completion<()> {
        let value = match (&element.default, value) {
            (Some(default), Value::Undefined) => {
                let v = self.eval(default, scope)?;
                if let Pattern::Ident(name) = &element.target.node {
                    self.name_anonymous_function(&v, name);
                }
                v
            }
            (_, v) => v,
        };
        self.bind_pattern(&element.target, value, scope, mode)
    }

    fn bind_name(&mut self, name: &str, value: Value, scope: &ScopeRef, mode: BindMode) -> Completion<()> {
        match mode {
            BindMode::Initialize => {
                let mut s = scope.borrow_mut();
                if !s.has_own(name) {
                    // Only fails on collisions, which `has_own` just ruled out.
                    let _ = s.declare(name, BindingKind::Function);
                }
                s.initialize(name, value);
                Ok(())
            }
            BindMode::Assign => {
                let result = scope::assign(scope, name, value);
                self.scope_result(result, name)
            }
        }
    }

    /// Translate a scope failure into the matching script error.
    pub(crate) fn scope_result<T>(&mut self, result: Result<T, ScopeError>, name: &str) -> Completion<T> {
        result.map_err(|err| match err {
            ScopeError::NotDefined => self.reference_error(format!("{name} is not defined")),
            ScopeError::Uninitialized => {
                self.reference_error(format!("Cannot access '{name}' before initialization"))
            }
            ScopeError::ConstAssignment => self.type_error("Assignment to constant variable."),
            ScopeError::AlreadyDeclared => {
                self.syntax_error(format!("Identifier '{name}' has already been declared"))
            }
        })
    }

    /// Materialise an iterable (arrays and strings) for spread and array destructuring.
    pub fn iterate_to_vec(&mut self, value: &Value) -> Completion<Vec<Value>> {
        match value {
            Value::String(s) => Ok(s.chars().map(|c| Value::from(c.to_string())).collect()),
            Value::Object(id) => match self.heap.get(*id).as_array() {
                Some(items) => Ok(items.clone()),
                None => {
                    let name = if self.is_callable(value) { "function" } else { "object" };
                    Err(self.type_error(format!("{name} is not iterable")))
                }
            },
            other => {
                let shown = match other {
                    Value::Undefined | Value::Null => other.primitive_to_string().to_string(),
                    _ => format!("{} {other}", self.type_of(other)),
                };
                Err(self.type_error(format!("{shown} is not iterable")))
            }
        }
    }
}
