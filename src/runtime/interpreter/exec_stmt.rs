//! Statement execution.

use std::rc::Rc;

use proctor_syntax::ast::{
    CatchClause, DeclKind, ForBinding, ForInit, Pattern, Spanned, Stmt, SwitchCase, VarDecl,
};

use super::hoist::{binding_kind, declares_lexically};
use super::{BindMode, Interpreter};
use crate::runtime::scope::{Scope, ScopeRef};
use crate::runtime::value::{strict_equals, Value};
use crate::runtime::{Abrupt, Completion};

/// How a statement completed when it did not throw.
#[derive(Debug, Clone)]
pub(crate) enum Flow {
    Normal,
    Return(Value),
    Break(Option<Rc<str>>),
    Continue(Option<Rc<str>>),
}

/// What a loop does after one iteration of its body.
enum LoopStep {
    Next,
    Exit,
    Propagate(Flow),
}

fn loop_step(flow: Flow, labels: &[Rc<str>]) -> LoopStep {
    match flow {
        Flow::Normal | Flow::Continue(None) => LoopStep::Next,
        Flow::Continue(Some(l)) if labels.contains(&l) => LoopStep::Next,
        Flow::Break(None) => LoopStep::Exit,
        Flow::Break(Some(l)) if labels.contains(&l) => LoopStep::Exit,
        other => LoopStep::Propagate(other),
    }
}

fn is_loop(stmt: &Stmt) -> bool {
    matches!(
        stmt,
        Stmt::For { .. } | Stmt::ForOf { .. } | Stmt::ForIn { .. } | Stmt::While { .. } | Stmt::DoWhile { .. }
    )
}

/// Source of values for `for...of`: arrays are read live, everything else is materialised up front.
enum ForOfSource {
    Array(crate::runtime::value::ObjectId),
    Items(Vec<Value>),
}

impl Interpreter {
    pub(crate) fn exec_statements(&mut self, body: &[Spanned<Stmt>], scope: &ScopeRef) -> Completion<Flow> {
        for stmt in body {
            match self.exec_stmt(stmt, scope)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    /// Run a block, giving it a scope of its own only when it declares block-scoped bindings.
    pub(crate) fn exec_block(&mut self, body: &[Spanned<Stmt>], scope: &ScopeRef) -> Completion<Flow> {
        if declares_lexically(body) {
            let block = Scope::block(scope);
            self.declare_lexical(body, &block)?;
            self.exec_statements(body, &block)
        } else {
            self.exec_statements(body, scope)
        }
    }

    pub(crate) fn exec_stmt(&mut self, stmt: &Spanned<Stmt>, scope: &ScopeRef) -> Completion<Flow> {
        match &stmt.node {
            Stmt::VarDecl(decl) => {
                self.exec_var_decl(decl, scope)?;
                Ok(Flow::Normal)
            }
            Stmt::Function(_) | Stmt::Empty => Ok(Flow::Normal),
            Stmt::Class(class) => {
                let value = self.eval_class(class, scope)?;
                if let Some(name) = &class.name {
                    scope.borrow_mut().initialize(name, value);
                }
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval(expr, scope)?;
                Ok(Flow::Normal)
            }
            Stmt::Block(body) => self.exec_block(body, scope),
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, scope)?.truthy() {
                    self.exec_stmt(consequent, scope)
                } else if let Some(alt) = alternate {
                    self.exec_stmt(alt, scope)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::For { .. } | Stmt::ForOf { .. } | Stmt::ForIn { .. } | Stmt::While { .. } | Stmt::DoWhile { .. } => {
                self.exec_loop(stmt, scope, &[])
            }
            Stmt::Labeled { .. } => {
                let mut labels: Vec<Rc<str>> = Vec::new();
                let mut inner = stmt;
                while let Stmt::Labeled { label, body } = &inner.node {
                    labels.push(label.as_str().into());
                    inner = body;
                }
                let flow = if is_loop(&inner.node) {
                    self.exec_loop(inner, scope, &labels)?
                } else {
                    self.exec_stmt(inner, scope)?
                };
                Ok(match flow {
                    Flow::Break(Some(l)) if labels.contains(&l) => Flow::Normal,
                    other => other,
                })
            }
            Stmt::Break(label) => Ok(Flow::Break(label.as_deref().map(Rc::from))),
            Stmt::Continue(label) => Ok(Flow::Continue(label.as_deref().map(Rc::from))),
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(e) => self.eval(e, scope)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Throw(expr) => {
                let value = self.eval(expr, scope)?;
                Err(Abrupt::Throw(value))
            }
            Stmt::Try {
                block,
                handler,
                finalizer,
            } => self.exec_try(block, handler.as_ref(), finalizer.as_deref(), scope),
            Stmt::Switch { discriminant, cases } => self.exec_switch(discriminant, cases, scope),
        }
    }

    pub(crate) fn exec_var_decl(&mut self, decl: &VarDecl, scope: &ScopeRef) -> Completion<()> {
        let mode = match decl.kind {
            DeclKind::Var => BindMode::Assign,
            DeclKind::Let | DeclKind::Const => BindMode::Initialize,
        };
        for d in &decl.declarations {
            let value = match &d.init {
                Some(init) => {
                    let v = self.eval(init, scope)?;
                    if let Pattern::Ident(name) = &d.target.node {
                        self.name_anonymous_function(&v, name);
                    }
                    v
                }
                // `var x;` leaves an existing value alone.
                None if decl.kind == DeclKind::Var => continue,
                None => Value::Undefined,
            };
            self.bind_pattern(&d.target, value, scope, mode)?;
        }
        Ok(())
    }

    fn exec_loop(&mut self, stmt: &Spanned<Stmt>, scope: &ScopeRef, labels: &[Rc<str>]) -> Completion<Flow> {
        match &stmt.node {
            Stmt::While { test, body } => {
                loop {
                    self.checkpoint()?;
                    if !self.eval(test, scope)?.truthy() {
                        break;
                    }
                    match loop_step(self.exec_stmt(body, scope)?, labels) {
                        LoopStep::Next => {}
                        LoopStep::Exit => break,
                        LoopStep::Propagate(flow) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::DoWhile { body, test } => {
                loop {
                    self.checkpoint()?;
                    match loop_step(self.exec_stmt(body, scope)?, labels) {
                        LoopStep::Next => {}
                        LoopStep::Exit => break,
                        LoopStep::Propagate(flow) => return Ok(flow),
                    }
                    if !self.eval(test, scope)?.truthy() {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => self.exec_for(init.as_ref(), test.as_ref(), update.as_ref(), body, scope, labels),
            Stmt::ForOf {
                binding,
                iterable,
                body,
            } => {
                let subject = self.eval(iterable, scope)?;
                let source = match &subject {
                    Value::Object(id) if self.heap.get(*id).as_array().is_some() => ForOfSource::Array(*id),
                    other => ForOfSource::Items(self.iterate_to_vec(other)?),
                };
                let mut index = 0;
                loop {
                    self.checkpoint()?;
                    let item = match &source {
                        ForOfSource::Array(id) => self.heap.get(*id).as_array().and_then(|a| a.get(index).cloned()),
                        ForOfSource::Items(items) => items.get(index).cloned(),
                    };
                    let Some(item) = item else { break };
                    index += 1;
                    match loop_step(self.exec_for_each_body(binding, item, body, scope)?, labels) {
                        LoopStep::Next => {}
                        LoopStep::Exit => break,
                        LoopStep::Propagate(flow) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::ForIn { binding, object, body } => {
                let subject = self.eval(object, scope)?;
                let keys: Vec<Rc<str>> = match &subject {
                    Value::Object(id) => self.for_in_keys(*id),
                    Value::String(s) => (0..proctor_core::strings::utf16_len(s))
                        .map(|i| Rc::from(i.to_string()))
                        .collect(),
                    _ => Vec::new(),
                };
                for key in keys {
                    self.checkpoint()?;
                    match loop_step(self.exec_for_each_body(binding, Value::String(key), body, scope)?, labels) {
                        LoopStep::Next => {}
                        LoopStep::Exit => break,
                        LoopStep::Propagate(flow) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            _ => self.exec_stmt(stmt, scope),
        }
    }

    /// One iteration of `for...of` / `for...in`: bind the item, then run the body.
    fn exec_for_each_body(
        &mut self,
        binding: &ForBinding,
        item: Value,
        body: &Spanned<Stmt>,
        scope: &ScopeRef,
    ) -> Completion<Flow> {
        match binding.kind {
            Some(kind @ (DeclKind::Let | DeclKind::Const)) => {
                let iteration = Scope::block(scope);
                let mut names = Vec::new();
                binding.target.node.bound_names(&mut names);
                for name in &names {
                    // A fresh scope cannot already hold the name.
                    let _ = iteration.borrow_mut().declare(name, binding_kind(kind));
                }
                self.bind_pattern(&binding.target, item, &iteration, BindMode::Initialize)?;
                self.exec_stmt(body, &iteration)
            }
            Some(DeclKind::Var) | None => {
                self.bind_pattern(&binding.target, item, scope, BindMode::Assign)?;
                self.exec_stmt(body, scope)
            }
        }
    }

    fn exec_for(
        &mut self,
        init: Option<&ForInit>,
        test: Option<&Spanned<proctor_syntax::ast::Expr>>,
        update: Option<&Spanned<proctor_syntax::ast::Expr>>,
        body: &Spanned<Stmt>,
        scope: &ScopeRef,
        labels: &[Rc<str>],
    ) -> Completion<Flow> {
        // `let` bindings get a fresh copy per iteration so closures capture that iteration's value.
        let mut per_iteration: Vec<String> = Vec::new();
        let mut constant = false;
        let mut current = scope.clone();
        match init {
            Some(ForInit::VarDecl(decl)) if decl.kind != DeclKind::Var => {
                current = Scope::block(scope);
                for d in &decl.declarations {
                    d.target.node.bound_names(&mut per_iteration);
                }
                constant = decl.kind == DeclKind::Const;
                let kind = binding_kind(decl.kind);
                for name in &per_iteration {
                    if current.borrow_mut().declare(name, kind).is_err() {
                        return Err(self.syntax_error(format!("Identifier '{name}' has already been declared")));
                    }
                }
                self.exec_var_decl(decl, &current)?;
            }
            Some(ForInit::VarDecl(decl)) => self.exec_var_decl(decl, scope)?,
            Some(ForInit::Expr(e)) => {
                self.eval(e, scope)?;
            }
            None => {}
        }
        if !per_iteration.is_empty() {
            current = self.copy_iteration_scope(&current, &per_iteration, constant, scope);
        }
        loop {
            self.checkpoint()?;
            if let Some(t) = test {
                if !self.eval(t, &current)?.truthy() {
                    break;
                }
            }
            match loop_step(self.exec_stmt(body, &current)?, labels) {
                LoopStep::Next => {}
                LoopStep::Exit => break,
                LoopStep::Propagate(flow) => return Ok(flow),
            }
            if !per_iteration.is_empty() {
                current = self.copy_iteration_scope(&current, &per_iteration, constant, scope);
            }
            if let Some(u) = update {
                self.eval(u, &current)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn copy_iteration_scope(&self, from: &ScopeRef, names: &[String], constant: bool, parent: &ScopeRef) -> ScopeRef {
        let next = Scope::block(parent);
        {
            let source = from.borrow();
            let mut target = next.borrow_mut();
            for name in names {
                let value = source.get_own(name).and_then(Result::ok).unwrap_or(Value::Undefined);
                if constant {
                    target.define_const(name, value);
                } else {
                    target.initialize(name, value);
                }
            }
        }
        next
    }

    fn exec_try(
        &mut self,
        block: &[Spanned<Stmt>],
        handler: Option<&CatchClause>,
        finalizer: Option<&[Spanned<Stmt>]>,
        scope: &ScopeRef,
    ) -> Completion<Flow> {
        let mut result = self.exec_block(block, scope);
        if let (Err(Abrupt::Throw(thrown)), Some(handler)) = (&result, handler) {
            let thrown = thrown.clone();
            let catch_scope = Scope::block(scope);
            result = match &handler.param {
                Some(param) => self
                    .bind_pattern(param, thrown, &catch_scope, BindMode::Initialize)
                    .and_then(|()| self.exec_block(&handler.body, &catch_scope)),
                None => self.exec_block(&handler.body, &catch_scope),
            };
        }
        if let Some(finalizer) = finalizer {
            // Interrupts unwind straight to the host without running script code.
            if matches!(result, Err(Abrupt::Interrupt(_))) {
                return result;
            }
            match self.exec_block(finalizer, scope)? {
                Flow::Normal => {}
                overriding => return Ok(overriding),
            }
        }
        result
    }

    fn exec_switch(
        &mut self,
        discriminant: &Spanned<proctor_syntax::ast::Expr>,
        cases: &[SwitchCase],
        scope: &ScopeRef,
    ) -> Completion<Flow> {
        let value = self.eval(discriminant, scope)?;
        let block = Scope::block(scope);
        for case in cases {
            self.declare_lexical(&case.body, &block)?;
        }
        let mut start = None;
        for (i, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                let candidate = self.eval(test, &block)?;
                if strict_equals(&value, &candidate) {
                    start = Some(i);
                    break;
                }
            }
        }
        let start = start.or_else(|| cases.iter().position(|c| c.test.is_none()));
        let Some(start) = start else {
            return Ok(Flow::Normal);
        };
        for case in &cases[start..] {
            match self.exec_statements(&case.body, &block)? {
                Flow::Normal => {}
                Flow::Break(None) => return Ok(Flow::Normal),
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }
}
