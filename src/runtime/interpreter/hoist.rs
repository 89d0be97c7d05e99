//! Declaration instantiation.
//!
//! Before a function body runs, every `var` it contains (outside nested functions) is declared in the
//! function scope and every function declaration is instantiated. Each block then declares its own `let`,
//! `const` and `class` bindings in the dead zone, plus its block-scoped function declarations.

use proctor_syntax::ast::{self, DeclKind, ForInit, Spanned, Stmt, Visitor};

use super::Interpreter;
use crate::runtime::scope::{BindingKind, ScopeError, ScopeRef};
use crate::runtime::value::Value;
use crate::runtime::Completion;

/// Collects `var`-declared names, stopping at function boundaries.
#[derive(Default)]
struct VarNames {
    names: Vec<String>,
}

impl VarNames {
    fn add(&mut self, kind: Option<DeclKind>, target: &Spanned<ast::Pattern>) {
        if kind == Some(DeclKind::Var) {
            target.node.bound_names(&mut self.names);
        }
    }
}

impl Visitor for VarNames {
    fn visit_stmt(&mut self, stmt: &Spanned<Stmt>) {
        match &stmt.node {
            Stmt::VarDecl(decl) => {
                for d in &decl.declarations {
                    self.add(Some(decl.kind), &d.target);
                }
            }
            Stmt::For {
                init: Some(ForInit::VarDecl(decl)),
                ..
            } => {
                for d in &decl.declarations {
                    self.add(Some(decl.kind), &d.target);
                }
            }
            Stmt::ForOf { binding, .. } | Stmt::ForIn { binding, .. } => self.add(binding.kind, &binding.target),
            Stmt::Function(_) | Stmt::Class(_) => return,
            _ => {}
        }
        ast::walk_stmt(self, stmt);
    }

    // Expressions cannot declare `var`s outside a nested function body.
    fn visit_expr(&mut self, _expr: &Spanned<ast::Expr>) {}

    fn visit_function(&mut self, _function: &ast::FunctionDef) {}
}

impl Interpreter {
    /// Instantiate the declarations of a function body (or script) in its own `scope`.
    pub(crate) fn hoist_declarations(&mut self, body: &[Spanned<Stmt>], scope: &ScopeRef) -> Completion<()> {
        let mut vars = VarNames::default();
        for stmt in body {
            vars.visit_stmt(stmt);
        }
        for name in &vars.names {
            let declared = scope.borrow_mut().declare(name, BindingKind::Var);
            self.declaration_result(declared, name)?;
        }
        self.declare_lexical(body, scope)
    }

    /// Declare the block-scoped bindings that appear directly in `body`.
    pub(crate) fn declare_lexical(&mut self, body: &[Spanned<Stmt>], scope: &ScopeRef) -> Completion<()> {
        for stmt in body {
            match &stmt.node {
                Stmt::VarDecl(decl) if decl.kind != DeclKind::Var => {
                    let kind = binding_kind(decl.kind);
                    let mut names = Vec::new();
                    for d in &decl.declarations {
                        d.target.node.bound_names(&mut names);
                    }
                    for name in &names {
                        let declared = scope.borrow_mut().declare(name, kind);
                        self.declaration_result(declared, name)?;
                    }
                }
                Stmt::Class(class) => {
                    if let Some(name) = &class.name {
                        let declared = scope.borrow_mut().declare(name, BindingKind::Let);
                        self.declaration_result(declared, name)?;
                    }
                }
                Stmt::Function(function) => {
                    let Some(name) = &function.name else { continue };
                    let declared = scope.borrow_mut().declare(name, BindingKind::Function);
                    self.declaration_result(declared, name)?;
                    let closure = self.make_closure(function, scope, None)?;
                    scope.borrow_mut().initialize(name, Value::Object(closure));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn declaration_result(&mut self, result: Result<(), ScopeError>, name: &str) -> Completion<()> {
        match result {
            Ok(()) => Ok(()),
            Err(_) => Err(self.syntax_error(format!("Identifier '{name}' has already been declared"))),
        }
    }
}

pub(crate) fn binding_kind(kind: DeclKind) -> BindingKind {
    match kind {
        DeclKind::Var => BindingKind::Var,
        DeclKind::Let => BindingKind::Let,
        DeclKind::Const => BindingKind::Const,
    }
}

/// Whether a block needs its own scope: only if it declares something block-scoped.
pub(crate) fn declares_lexically(body: &[Spanned<Stmt>]) -> bool {
    body.iter().any(|stmt| match &stmt.node {
        Stmt::VarDecl(decl) => decl.kind != DeclKind::Var,
        Stmt::Class(_) | Stmt::Function(_) => true,
        _ => false,
    })
}
