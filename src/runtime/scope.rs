//! Lexical environments.
//!
//! Scopes form a parent chain. A scope created for a (non-arrow) function call also carries a
//! [`FunctionFrame`] holding `this`, the home object for `super` lookups, and `new.target`; arrow functions
//! resolve those by walking outward to the nearest frame.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::value::{ObjectId, Value};

pub type ScopeRef = Rc<RefCell<Scope>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    /// Function declarations and parameters: mutable, initialised on declaration.
    Function,
}

#[derive(Debug, Clone)]
struct Binding {
    /// `None` while in the temporal dead zone.
    value: Option<Value>,
    mutable: bool,
    kind: BindingKind,
}

/// Per-call state visible to `this`, `super` and `new.target`.
#[derive(Debug, Clone, Default)]
pub struct FunctionFrame {
    /// `None` in a derived constructor until `super(...)` returns.
    pub this: Option<Value>,
    pub home_object: Option<ObjectId>,
    pub new_target: Option<ObjectId>,
    /// The class whose constructor is running (fields are initialised after `super(...)`).
    pub class: Option<ObjectId>,
}

#[derive(Debug, Default)]
pub struct Scope {
    bindings: HashMap<Rc<str>, Binding>,
    parent: Option<ScopeRef>,
    frame: Option<FunctionFrame>,
}

/// Why a lookup or assignment failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    NotDefined,
    Uninitialized,
    ConstAssignment,
    AlreadyDeclared,
}

impl Scope {
    pub fn root() -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            frame: Some(FunctionFrame::default()),
            ..Scope::default()
        }))
    }

    pub fn block(parent: &ScopeRef) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            parent: Some(Rc::clone(parent)),
            ..Scope::default()
        }))
    }

    pub fn function(parent: &ScopeRef, frame: FunctionFrame) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            parent: Some(Rc::clone(parent)),
            frame: Some(frame),
            ..Scope::default()
        }))
    }

    /// Declare `name` in this scope.
    ///
    /// `var` and function declarations may be repeated; `let`/`const` may not collide with anything.
    pub fn declare(&mut self, name: &str, kind: BindingKind) -> Result<(), ScopeError> {
        if let Some(existing) = self.bindings.get(name) {
            let repeatable = |k| matches!(k, BindingKind::Var | BindingKind::Function);
            return if repeatable(existing.kind) && repeatable(kind) {
                Ok(())
            } else {
                Err(ScopeError::AlreadyDeclared)
            };
        }
        let binding = match kind {
            BindingKind::Var | BindingKind::Function => Binding {
                value: Some(Value::Undefined),
                mutable: true,
                kind,
            },
            BindingKind::Let => Binding {
                value: None,
                mutable: true,
                kind,
            },
            BindingKind::Const => Binding {
                value: None,
                mutable: false,
                kind,
            },
        };
        self.bindings.insert(name.into(), binding);
        Ok(())
    }

    /// Set the value of a binding declared in this scope, ending its dead zone.
    pub fn initialize(&mut self, name: &str, value: Value) {
        match self.bindings.get_mut(name) {
            Some(binding) => binding.value = Some(value),
            None => {
                self.bindings.insert(
                    name.into(),
                    Binding {
                        value: Some(value),
                        mutable: true,
                        kind: BindingKind::Let,
                    },
                );
            }
        }
    }

    /// Declare and initialise a constant in one step (intrinsics, parameters of host wrappers).
    pub fn define_const(&mut self, name: &str, value: Value) {
        self.bindings.insert(
            name.into(),
            Binding {
                value: Some(value),
                mutable: false,
                kind: BindingKind::Const,
            },
        );
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Value of a binding declared directly in this scope.
    pub fn get_own(&self, name: &str) -> Option<Result<Value, ScopeError>> {
        self.bindings
            .get(name)
            .map(|b| b.value.clone().ok_or(ScopeError::Uninitialized))
    }

    pub fn frame(&self) -> Option<&FunctionFrame> {
        self.frame.as_ref()
    }

    pub fn frame_mut(&mut self) -> Option<&mut FunctionFrame> {
        self.frame.as_mut()
    }
}

/// Resolve `name` along the scope chain.
pub fn lookup(scope: &ScopeRef, name: &str) -> Result<Value, ScopeError> {
    let mut current = Rc::clone(scope);
    loop {
        let parent = {
            let s = current.borrow();
            if let Some(result) = s.get_own(name) {
                return result;
            }
            s.parent.clone()
        };
        match parent {
            Some(p) => current = p,
            None => return Err(ScopeError::NotDefined),
        }
    }
}

/// Assign to an existing binding along the scope chain.
pub fn assign(scope: &ScopeRef, name: &str, value: Value) -> Result<(), ScopeError> {
    let mut current = Rc::clone(scope);
    loop {
        let parent = {
            let mut s = current.borrow_mut();
            if let Some(binding) = s.bindings.get_mut(name) {
                if binding.value.is_none() {
                    return Err(ScopeError::Uninitialized);
                }
                if !binding.mutable {
                    return Err(ScopeError::ConstAssignment);
                }
                binding.value = Some(value);
                return Ok(());
            }
            s.parent.clone()
        };
        match parent {
            Some(p) => current = p,
            None => return Err(ScopeError::NotDefined),
        }
    }
}

/// The nearest scope carrying a [`FunctionFrame`].
pub fn frame_scope(scope: &ScopeRef) -> ScopeRef {
    let mut current = Rc::clone(scope);
    loop {
        let parent = {
            let s = current.borrow();
            if s.frame.is_some() {
                break;
            }
            s.parent.clone()
        };
        match parent {
            Some(p) => current = p,
            None => break,
        }
    }
    current
}

/// Snapshot of the nearest function frame.
pub fn current_frame(scope: &ScopeRef) -> FunctionFrame {
    frame_scope(scope).borrow().frame.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_let_starts_in_dead_zone() {
        let scope = Scope::root();
        scope.borrow_mut().declare("x", BindingKind::Let).unwrap();
        assert_eq!(lookup(&scope, "x").unwrap_err(), ScopeError::Uninitialized);
        scope.borrow_mut().initialize("x", Value::from(1.0));
        assert!(matches!(lookup(&scope, "x"), Ok(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn test_const_rejects_assignment() {
        let scope = Scope::root();
        scope.borrow_mut().declare("k", BindingKind::Const).unwrap();
        scope.borrow_mut().initialize("k", Value::Null);
        assert_eq!(assign(&scope, "k", Value::Undefined), Err(ScopeError::ConstAssignment));
    }

    #[test]
    fn test_redeclaration_rules() {
        let scope = Scope::root();
        let mut s = scope.borrow_mut();
        s.declare("v", BindingKind::Var).unwrap();
        assert!(s.declare("v", BindingKind::Var).is_ok());
        s.declare("l", BindingKind::Let).unwrap();
        assert_eq!(s.declare("l", BindingKind::Let), Err(ScopeError::AlreadyDeclared));
        assert_eq!(s.declare("v", BindingKind::Const), Err(ScopeError::AlreadyDeclared));
    }

    #[test]
    fn test_assignment_walks_to_outer_scope() {
        let outer = Scope::root();
        outer.borrow_mut().declare("n", BindingKind::Let).unwrap();
        outer.borrow_mut().initialize("n", Value::from(1.0));
        let inner = Scope::block(&outer);
        assign(&inner, "n", Value::from(2.0)).unwrap();
        assert!(matches!(lookup(&outer, "n"), Ok(Value::Number(n)) if n == 2.0));
        assert_eq!(assign(&inner, "missing", Value::Null), Err(ScopeError::NotDefined));
    }

    #[test]
    fn test_frame_lookup_skips_block_scopes() {
        let root = Scope::root();
        let f = Scope::function(
            &root,
            FunctionFrame {
                this: Some(Value::from("me")),
                ..FunctionFrame::default()
            },
        );
        let block = Scope::block(&f);
        assert!(matches!(current_frame(&block).this, Some(Value::String(s)) if &*s == "me"));
    }
}
