//! Abstract Syntax Tree definitions for the script subset.
//!
//! Function and class bodies are held behind `Rc` so the runtime can keep closures alive without cloning
//! whole subtrees.

use std::rc::Rc;

/// Source location span (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

pub type Ident = String;

/// A script is a function body: a statement list where top-level `return` is allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Spanned<Stmt>>,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl(VarDecl),
    Function(Rc<FunctionDef>),
    Class(Rc<ClassDef>),
    Expr(Spanned<Expr>),
    Block(Vec<Spanned<Stmt>>),
    If {
        test: Spanned<Expr>,
        consequent: Box<Spanned<Stmt>>,
        alternate: Option<Box<Spanned<Stmt>>>,
    },
    For {
        init: Option<ForInit>,
        test: Option<Spanned<Expr>>,
        update: Option<Spanned<Expr>>,
        body: Box<Spanned<Stmt>>,
    },
    ForOf {
        binding: ForBinding,
        iterable: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
    ForIn {
        binding: ForBinding,
        object: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
    While {
        test: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
    DoWhile {
        body: Box<Spanned<Stmt>>,
        test: Spanned<Expr>,
    },
    Break(Option<Ident>),
    Continue(Option<Ident>),
    Labeled {
        label: Ident,
        body: Box<Spanned<Stmt>>,
    },
    Return(Option<Spanned<Expr>>),
    Throw(Spanned<Expr>),
    Try {
        block: Vec<Spanned<Stmt>>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<Spanned<Stmt>>>,
    },
    Switch {
        discriminant: Spanned<Expr>,
        cases: Vec<SwitchCase>,
    },
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: DeclKind,
    pub declarations: Vec<VarDeclarator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclarator {
    pub target: Spanned<Pattern>,
    pub init: Option<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    VarDecl(VarDecl),
    Expr(Spanned<Expr>),
}

/// Left side of `for (... of x)` / `for (... in x)`.
///
/// `kind == None` assigns to an existing target instead of declaring a fresh binding.
#[derive(Debug, Clone, PartialEq)]
pub struct ForBinding {
    pub kind: Option<DeclKind>,
    pub target: Spanned<Pattern>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Spanned<Pattern>>,
    pub body: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub test: Option<Spanned<Expr>>,
    pub body: Vec<Spanned<Stmt>>,
}

// ============================================================================
// Patterns (binding and assignment targets)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Ident(Ident),
    Object {
        props: Vec<ObjectPatternProp>,
        rest: Option<Box<Spanned<Pattern>>>,
    },
    Array {
        elements: Vec<Option<PatternElem>>,
        rest: Option<Box<Spanned<Pattern>>>,
    },
    /// A member expression target; only valid in assignments, never in declarations.
    Member(Box<Spanned<Expr>>),
}

impl Pattern {
    /// Collect every identifier this pattern binds, in source order.
    pub fn bound_names(&self, out: &mut Vec<Ident>) {
        match self {
            Pattern::Ident(name) => out.push(name.clone()),
            Pattern::Object { props, rest } => {
                for p in props {
                    p.value.target.node.bound_names(out);
                }
                if let Some(r) = rest {
                    r.node.bound_names(out);
                }
            }
            Pattern::Array { elements, rest } => {
                for e in elements.iter().flatten() {
                    e.target.node.bound_names(out);
                }
                if let Some(r) = rest {
                    r.node.bound_names(out);
                }
            }
            Pattern::Member(_) => {}
        }
    }
}

/// A pattern with an optional `= default`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternElem {
    pub target: Spanned<Pattern>,
    pub default: Option<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPatternProp {
    pub key: PropKey,
    pub value: PatternElem,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropKey {
    Named(String),
    Computed(Box<Spanned<Expr>>),
}

// ============================================================================
// Functions and classes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// `function` declarations and expressions: own `this`, constructible.
    Normal,
    /// Arrow functions: lexical `this`, not constructible.
    Arrow,
    /// Object and class methods: own `this`, not constructible, `super` allowed.
    Method,
    /// A class constructor body.
    Constructor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Option<Ident>,
    pub params: Vec<PatternElem>,
    pub rest: Option<Spanned<Pattern>>,
    pub body: FunctionBody,
    pub kind: FunctionKind,
    pub span: Span,
}

impl FunctionDef {
    /// Number of parameters before the first default or rest (`Function.prototype.length`).
    pub fn arity(&self) -> usize {
        self.params.iter().take_while(|p| p.default.is_none()).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Vec<Spanned<Stmt>>),
    /// Concise arrow body: `x => x * 2`.
    Expr(Box<Spanned<Expr>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: Option<Ident>,
    pub superclass: Option<Box<Spanned<Expr>>>,
    pub constructor: Option<Rc<FunctionDef>>,
    pub members: Vec<ClassMember>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Method {
        key: PropKey,
        function: Rc<FunctionDef>,
        is_static: bool,
    },
    Field {
        key: PropKey,
        value: Option<Spanned<Expr>>,
        is_static: bool,
    },
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    String(String),
    Template(Vec<TemplatePart>),
    Bool(bool),
    Null,
    Ident(Ident),
    This,
    Array(Vec<ArrayElement>),
    Object(Vec<ObjectProp>),
    Function(Rc<FunctionDef>),
    Class(Rc<ClassDef>),
    Unary(UnaryOp, Box<Spanned<Expr>>),
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Spanned<Expr>>,
    },
    Binary(Box<Spanned<Expr>>, BinaryOp, Box<Spanned<Expr>>),
    Logical(Box<Spanned<Expr>>, LogicalOp, Box<Spanned<Expr>>),
    Assign {
        op: AssignOp,
        target: Box<Spanned<Pattern>>,
        value: Box<Spanned<Expr>>,
    },
    Conditional {
        test: Box<Spanned<Expr>>,
        consequent: Box<Spanned<Expr>>,
        alternate: Box<Spanned<Expr>>,
    },
    Call {
        callee: Box<Spanned<Expr>>,
        args: Vec<Argument>,
        optional: bool,
    },
    New {
        callee: Box<Spanned<Expr>>,
        args: Vec<Argument>,
    },
    Member {
        object: Box<Spanned<Expr>>,
        property: MemberProp,
        optional: bool,
    },
    SuperCall(Vec<Argument>),
    SuperMember(MemberProp),
    Sequence(Vec<Spanned<Expr>>),
    /// Boundary of an optional chain: a short-circuit anywhere inside yields `undefined` here.
    OptionalChain(Box<Spanned<Expr>>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Expr(Spanned<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElement {
    Expr(Spanned<Expr>),
    Spread(Spanned<Expr>),
    Hole,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProp {
    KeyValue(PropKey, Spanned<Expr>),
    Shorthand(Ident),
    Method(PropKey, Rc<FunctionDef>),
    Spread(Spanned<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Expr(Spanned<Expr>),
    Spread(Spanned<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProp {
    /// `obj.name`
    Named(Ident),
    /// `obj[expr]`
    Computed(Box<Spanned<Expr>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
    Typeof,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    In,
    Instanceof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Compound(BinaryOp),
    Logical(LogicalOp),
}

// ============================================================================
// Visitor
// ============================================================================

/// Read-only traversal over statements and expressions.
///
/// Default methods recurse into children; override the ones you care about and call the `walk_*` helpers to
/// keep descending.
pub trait Visitor {
    fn visit_stmt(&mut self, stmt: &Spanned<Stmt>) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Spanned<Expr>) {
        walk_expr(self, expr);
    }

    fn visit_function(&mut self, function: &FunctionDef) {
        walk_function(self, function);
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, stmt: &Spanned<Stmt>) {
    match &stmt.node {
        Stmt::VarDecl(decl) => walk_var_decl(v, decl),
        Stmt::Function(f) => v.visit_function(f),
        Stmt::Class(c) => walk_class(v, c),
        Stmt::Expr(e) | Stmt::Throw(e) => v.visit_expr(e),
        Stmt::Block(body) => body.iter().for_each(|s| v.visit_stmt(s)),
        Stmt::If {
            test,
            consequent,
            alternate,
        } => {
            v.visit_expr(test);
            v.visit_stmt(consequent);
            if let Some(alt) = alternate {
                v.visit_stmt(alt);
            }
        }
        Stmt::For {
            init,
            test,
            update,
            body,
        } => {
            match init {
                Some(ForInit::VarDecl(decl)) => walk_var_decl(v, decl),
                Some(ForInit::Expr(e)) => v.visit_expr(e),
                None => {}
            }
            if let Some(t) = test {
                v.visit_expr(t);
            }
            if let Some(u) = update {
                v.visit_expr(u);
            }
            v.visit_stmt(body);
        }
        Stmt::ForOf {
            binding,
            iterable: subject,
            body,
        }
        | Stmt::ForIn {
            binding,
            object: subject,
            body,
        } => {
            walk_pattern(v, &binding.target);
            v.visit_expr(subject);
            v.visit_stmt(body);
        }
        Stmt::While { test, body } | Stmt::DoWhile { body, test } => {
            v.visit_expr(test);
            v.visit_stmt(body);
        }
        Stmt::Labeled { body, .. } => v.visit_stmt(body),
        Stmt::Return(e) => {
            if let Some(e) = e {
                v.visit_expr(e);
            }
        }
        Stmt::Try {
            block,
            handler,
            finalizer,
        } => {
            block.iter().for_each(|s| v.visit_stmt(s));
            if let Some(h) = handler {
                if let Some(p) = &h.param {
                    walk_pattern(v, p);
                }
                h.body.iter().for_each(|s| v.visit_stmt(s));
            }
            if let Some(f) = finalizer {
                f.iter().for_each(|s| v.visit_stmt(s));
            }
        }
        Stmt::Switch { discriminant, cases } => {
            v.visit_expr(discriminant);
            for case in cases {
                if let Some(t) = &case.test {
                    v.visit_expr(t);
                }
                case.body.iter().for_each(|s| v.visit_stmt(s));
            }
        }
        Stmt::Break(_) | Stmt::Continue(_) | Stmt::Empty => {}
    }
}

fn walk_var_decl<V: Visitor + ?Sized>(v: &mut V, decl: &VarDecl) {
    for d in &decl.declarations {
        walk_pattern(v, &d.target);
        if let Some(init) = &d.init {
            v.visit_expr(init);
        }
    }
}

fn walk_pattern<V: Visitor + ?Sized>(v: &mut V, pattern: &Spanned<Pattern>) {
    match &pattern.node {
        Pattern::Ident(_) => {}
        Pattern::Member(e) => v.visit_expr(e),
        Pattern::Object { props, rest } => {
            for p in props {
                if let PropKey::Computed(k) = &p.key {
                    v.visit_expr(k);
                }
                walk_pattern_elem(v, &p.value);
            }
            if let Some(r) = rest {
                walk_pattern(v, r);
            }
        }
        Pattern::Array { elements, rest } => {
            for e in elements.iter().flatten() {
                walk_pattern_elem(v, e);
            }
            if let Some(r) = rest {
                walk_pattern(v, r);
            }
        }
    }
}

fn walk_pattern_elem<V: Visitor + ?Sized>(v: &mut V, elem: &PatternElem) {
    walk_pattern(v, &elem.target);
    if let Some(d) = &elem.default {
        v.visit_expr(d);
    }
}

pub fn walk_function<V: Visitor + ?Sized>(v: &mut V, function: &FunctionDef) {
    for p in &function.params {
        walk_pattern_elem(v, p);
    }
    if let Some(r) = &function.rest {
        walk_pattern(v, r);
    }
    match &function.body {
        FunctionBody::Block(body) => body.iter().for_each(|s| v.visit_stmt(s)),
        FunctionBody::Expr(e) => v.visit_expr(e),
    }
}

fn walk_class<V: Visitor + ?Sized>(v: &mut V, class: &ClassDef) {
    if let Some(s) = &class.superclass {
        v.visit_expr(s);
    }
    if let Some(c) = &class.constructor {
        v.visit_function(c);
    }
    for m in &class.members {
        match m {
            ClassMember::Method { key, function, .. } => {
                if let PropKey::Computed(k) = key {
                    v.visit_expr(k);
                }
                v.visit_function(function);
            }
            ClassMember::Field { key, value, .. } => {
                if let PropKey::Computed(k) = key {
                    v.visit_expr(k);
                }
                if let Some(val) = value {
                    v.visit_expr(val);
                }
            }
        }
    }
}

fn walk_args<V: Visitor + ?Sized>(v: &mut V, args: &[Argument]) {
    for a in args {
        match a {
            Argument::Expr(e) | Argument::Spread(e) => v.visit_expr(e),
        }
    }
}

fn walk_member_prop<V: Visitor + ?Sized>(v: &mut V, prop: &MemberProp) {
    if let MemberProp::Computed(e) = prop {
        v.visit_expr(e);
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(v: &mut V, expr: &Spanned<Expr>) {
    match &expr.node {
        Expr::Number(_) | Expr::String(_) | Expr::Bool(_) | Expr::Null | Expr::Ident(_) | Expr::This => {}
        Expr::Template(parts) => {
            for p in parts {
                if let TemplatePart::Expr(e) = p {
                    v.visit_expr(e);
                }
            }
        }
        Expr::Array(elements) => {
            for el in elements {
                match el {
                    ArrayElement::Expr(e) | ArrayElement::Spread(e) => v.visit_expr(e),
                    ArrayElement::Hole => {}
                }
            }
        }
        Expr::Object(props) => {
            for p in props {
                match p {
                    ObjectProp::KeyValue(key, value) => {
                        if let PropKey::Computed(k) = key {
                            v.visit_expr(k);
                        }
                        v.visit_expr(value);
                    }
                    ObjectProp::Shorthand(_) => {}
                    ObjectProp::Method(key, f) => {
                        if let PropKey::Computed(k) = key {
                            v.visit_expr(k);
                        }
                        v.visit_function(f);
                    }
                    ObjectProp::Spread(e) => v.visit_expr(e),
                }
            }
        }
        Expr::Function(f) => v.visit_function(f),
        Expr::Class(c) => walk_class(v, c),
        Expr::Unary(_, e) | Expr::OptionalChain(e) => v.visit_expr(e),
        Expr::Update { target, .. } => v.visit_expr(target),
        Expr::Binary(l, _, r) | Expr::Logical(l, _, r) => {
            v.visit_expr(l);
            v.visit_expr(r);
        }
        Expr::Assign { target, value, .. } => {
            walk_pattern(v, target);
            v.visit_expr(value);
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            v.visit_expr(test);
            v.visit_expr(consequent);
            v.visit_expr(alternate);
        }
        Expr::Call { callee, args, .. } | Expr::New { callee, args } => {
            v.visit_expr(callee);
            walk_args(v, args);
        }
        Expr::Member { object, property, .. } => {
            v.visit_expr(object);
            walk_member_prop(v, property);
        }
        Expr::SuperCall(args) => walk_args(v, args),
        Expr::SuperMember(prop) => walk_member_prop(v, prop),
        Expr::Sequence(items) => items.iter().for_each(|e| v.visit_expr(e)),
    }
}
