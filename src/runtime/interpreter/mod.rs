//! Tree-walking evaluator.
//!
//! The evaluator is split the same way the statement/expression grammar is:
//!
//! - `hoist`: declaration instantiation for function bodies and blocks
//! - `exec_stmt`: statements and loop control ([`Flow`])
//! - `eval_expr`: expressions, references and optional chains
//! - `calls`: closures, calls and `new`
//! - `classes`: class definitions, construction and `super`
//! - `patterns`: destructuring for declarations, parameters and assignment
//! - `properties`: property access, including array and DOM exotic behaviour
//! - `ops`: conversions and operators

mod calls;
mod classes;
mod eval_expr;
mod exec_stmt;
mod hoist;
mod ops;
mod patterns;
mod properties;

#[cfg(test)]
mod tests;

use std::rc::Rc;
use std::time::Instant;

use proctor_core::strings::utf16_len;
use proctor_syntax::ast::Program;

use super::intrinsics;
use super::object::{CallArgs, FunctionData, Heap, NativeFunction, Object, ObjectKind, Property};
use super::scope::{Scope, ScopeRef};
use super::value::{ObjectId, Value};
use super::{Abrupt, Completion, Interrupt, InterruptHandle, Limits};

pub(crate) use exec_stmt::Flow;
pub(crate) use ops::js_pow;
pub use ops::PreferredType;
pub(crate) use patterns::BindMode;

/// Nesting limit for host-side recursion over script data (`JSON.stringify`, `toEqual`, `join`).
pub const MAX_NATIVE_NESTING: usize = 1024;

/// Lines of console output forwarded to `tracing` per evaluation.
const MAX_CONSOLE_LINES: usize = 1000;

/// How many checkpoints pass between wall-clock reads.
const CLOCK_INTERVAL: u32 = 256;

/// Prototypes shared by every object an interpreter creates.
#[derive(Debug, Clone, Copy)]
pub struct Realm {
    pub object_proto: ObjectId,
    pub function_proto: ObjectId,
    pub array_proto: ObjectId,
    pub string_proto: ObjectId,
    pub number_proto: ObjectId,
    pub boolean_proto: ObjectId,
    pub error_proto: ObjectId,
    pub type_error_proto: ObjectId,
    pub range_error_proto: ObjectId,
    pub syntax_error_proto: ObjectId,
    pub reference_error_proto: ObjectId,
    pub node_proto: ObjectId,
    pub element_proto: ObjectId,
    pub text_proto: ObjectId,
    pub event_proto: ObjectId,
}

impl Realm {
    fn allocate(heap: &mut Heap) -> Result<Self, Abrupt> {
        let mut alloc = |kind: ObjectKind, proto: Option<ObjectId>| {
            heap.alloc(Object::new(kind, proto))
                .map_err(|_| Abrupt::Interrupt(Interrupt::HeapExhausted))
        };
        let object_proto = alloc(ObjectKind::Ordinary, None)?;
        let noop: super::object::NativeFn = Rc::new(|_: &mut Interpreter, _: CallArgs<'_>| Ok(Value::Undefined));
        let function_proto = alloc(
            ObjectKind::Function(FunctionData::Native(NativeFunction {
                call: noop,
                constructor: false,
            })),
            Some(object_proto),
        )?;
        let array_proto = alloc(ObjectKind::Ordinary, Some(object_proto))?;
        let string_proto = alloc(ObjectKind::Ordinary, Some(object_proto))?;
        let number_proto = alloc(ObjectKind::Ordinary, Some(object_proto))?;
        let boolean_proto = alloc(ObjectKind::Ordinary, Some(object_proto))?;
        let error_proto = alloc(ObjectKind::Ordinary, Some(object_proto))?;
        let type_error_proto = alloc(ObjectKind::Ordinary, Some(error_proto))?;
        let range_error_proto = alloc(ObjectKind::Ordinary, Some(error_proto))?;
        let syntax_error_proto = alloc(ObjectKind::Ordinary, Some(error_proto))?;
        let reference_error_proto = alloc(ObjectKind::Ordinary, Some(error_proto))?;
        let node_proto = alloc(ObjectKind::Ordinary, Some(object_proto))?;
        let element_proto = alloc(ObjectKind::Ordinary, Some(node_proto))?;
        let text_proto = alloc(ObjectKind::Ordinary, Some(node_proto))?;
        let event_proto = alloc(ObjectKind::Ordinary, Some(object_proto))?;
        Ok(Self {
            object_proto,
            function_proto,
            array_proto,
            string_proto,
            number_proto,
            boolean_proto,
            error_proto,
            type_error_proto,
            range_error_proto,
            syntax_error_proto,
            reference_error_proto,
            node_proto,
            element_proto,
            text_proto,
            event_proto,
        })
    }
}

/// The built-in error classes the runtime throws itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    Error,
    TypeError,
    RangeError,
    SyntaxError,
    ReferenceError,
}

impl ErrorType {
    pub const ALL: [ErrorType; 5] = [
        ErrorType::Error,
        ErrorType::TypeError,
        ErrorType::RangeError,
        ErrorType::SyntaxError,
        ErrorType::ReferenceError,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ErrorType::Error => "Error",
            ErrorType::TypeError => "TypeError",
            ErrorType::RangeError => "RangeError",
            ErrorType::SyntaxError => "SyntaxError",
            ErrorType::ReferenceError => "ReferenceError",
        }
    }
}

/// Severity of a `console` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Debug,
    Log,
    Warn,
    Error,
}

/// One script realm plus its execution state.
pub struct Interpreter {
    pub(crate) heap: Heap,
    pub(crate) realm: Realm,
    global: ScopeRef,
    limits: Limits,
    interrupt: InterruptHandle,
    /// Active script and native calls.
    depth: usize,
    native_depth: usize,
    ticks: u32,
    console_lines: usize,
    rng_state: u64,
    /// Arrays currently being joined; a cycle joins as the empty string.
    pub(crate) join_stack: Vec<ObjectId>,
}

impl Interpreter {
    /// Build a fresh realm with every intrinsic installed.
    ///
    /// ## Errors
    /// Only fails when `limits.max_objects` is too small to hold the intrinsics.
    pub fn new(limits: Limits, interrupt: InterruptHandle) -> Completion<Self> {
        let mut heap = Heap::new(limits.max_objects);
        let realm = Realm::allocate(&mut heap)?;
        let mut interp = Self {
            heap,
            realm,
            global: Scope::root(),
            limits,
            interrupt,
            depth: 0,
            native_depth: 0,
            ticks: 0,
            console_lines: 0,
            rng_state: 0x2545_F491_4F6C_DD1D,
            join_stack: Vec::new(),
        };
        intrinsics::install(&mut interp)?;
        Ok(interp)
    }

    pub fn global_scope(&self) -> &ScopeRef {
        &self.global
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Bind `name` in the global scope.
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.global.borrow_mut().define_const(name, value);
    }

    /// Run `program` as a function body in `scope`, returning the value of a top-level `return`.
    #[tracing::instrument(level = "debug", skip_all, fields(statements = program.body.len()))]
    pub fn run_program(&mut self, program: &Program, scope: &ScopeRef) -> Completion<Value> {
        self.checkpoint()?;
        self.hoist_declarations(&program.body, scope)?;
        match self.exec_statements(&program.body, scope)? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }

    // ---- allocation ------------------------------------------------------------------------------------------

    pub(crate) fn alloc(&mut self, object: Object) -> Completion<ObjectId> {
        self.heap
            .alloc(object)
            .map_err(|_| Abrupt::Interrupt(Interrupt::HeapExhausted))
    }

    pub fn new_object(&mut self) -> Completion<ObjectId> {
        let proto = self.realm.object_proto;
        self.alloc(Object::new(ObjectKind::Ordinary, Some(proto)))
    }

    pub fn new_array(&mut self, items: Vec<Value>) -> Completion<ObjectId> {
        self.check_array_len(items.len())?;
        let proto = self.realm.array_proto;
        self.alloc(Object::new(ObjectKind::Array(items), Some(proto)))
    }

    /// Wrap a host closure as a callable script function.
    pub fn new_native<F>(&mut self, name: &str, arity: usize, f: F) -> Completion<ObjectId>
    where
        F: Fn(&mut Interpreter, CallArgs<'_>) -> Completion<Value> + 'static,
    {
        self.native_with(name, arity, Rc::new(f), false)
    }

    pub(crate) fn native_with(
        &mut self,
        name: &str,
        arity: usize,
        call: super::object::NativeFn,
        constructor: bool,
    ) -> Completion<ObjectId> {
        let proto = self.realm.function_proto;
        let id = self.alloc(Object::new(
            ObjectKind::Function(FunctionData::Native(NativeFunction { call, constructor })),
            Some(proto),
        ))?;
        let props = &mut self.heap.get_mut(id).props;
        props.insert("name".into(), Property::frozen(Value::from(name)));
        props.insert("length".into(), Property::frozen(Value::from(arity)));
        Ok(id)
    }

    /// Install a non-enumerable method on `target`.
    pub fn define_method<F>(&mut self, target: ObjectId, name: &str, arity: usize, f: F) -> Completion<()>
    where
        F: Fn(&mut Interpreter, CallArgs<'_>) -> Completion<Value> + 'static,
    {
        let function = self.new_native(name, arity, f)?;
        self.heap
            .get_mut(target)
            .props
            .insert(name.into(), Property::hidden(function.into()));
        Ok(())
    }

    /// Set an own enumerable data property without running any exotic behaviour.
    pub fn define_data(&mut self, target: ObjectId, key: &str, value: Value) {
        self.heap.get_mut(target).props.insert(key.into(), Property::data(value));
    }

    pub fn define_hidden(&mut self, target: ObjectId, key: &str, value: Value) {
        self.heap.get_mut(target).props.insert(key.into(), Property::hidden(value));
    }

    // ---- errors ----------------------------------------------------------------------------------------------

    pub fn error_proto(&self, kind: ErrorType) -> ObjectId {
        match kind {
            ErrorType::Error => self.realm.error_proto,
            ErrorType::TypeError => self.realm.type_error_proto,
            ErrorType::RangeError => self.realm.range_error_proto,
            ErrorType::SyntaxError => self.realm.syntax_error_proto,
            ErrorType::ReferenceError => self.realm.reference_error_proto,
        }
    }

    /// Allocate an error instance with `proto`, `message` and a `stack` line.
    pub(crate) fn new_error_object(&mut self, proto: ObjectId, name: &str, message: &str) -> Completion<ObjectId> {
        let id = self.alloc(Object::new(ObjectKind::Error, Some(proto)))?;
        self.define_hidden(id, "message", Value::from(message));
        let head = if message.is_empty() {
            name.to_string()
        } else {
            format!("{name}: {message}")
        };
        self.define_hidden(id, "stack", Value::from(format!("{head}\n    at <anonymous>")));
        Ok(id)
    }

    /// Build a throwable error of `kind`. Heap exhaustion surfaces as the interrupt instead.
    pub fn throw_error(&mut self, kind: ErrorType, message: impl AsRef<str>) -> Abrupt {
        let proto = self.error_proto(kind);
        match self.new_error_object(proto, kind.name(), message.as_ref()) {
            Ok(id) => Abrupt::Throw(id.into()),
            Err(abrupt) => abrupt,
        }
    }

    pub fn type_error(&mut self, message: impl AsRef<str>) -> Abrupt {
        self.throw_error(ErrorType::TypeError, message)
    }

    pub fn range_error(&mut self, message: impl AsRef<str>) -> Abrupt {
        self.throw_error(ErrorType::RangeError, message)
    }

    pub fn reference_error(&mut self, message: impl AsRef<str>) -> Abrupt {
        self.throw_error(ErrorType::ReferenceError, message)
    }

    pub fn syntax_error(&mut self, message: impl AsRef<str>) -> Abrupt {
        self.throw_error(ErrorType::SyntaxError, message)
    }

    /// Learner-facing text for a thrown value: `error.message` for errors, the string form otherwise.
    ///
    /// Never runs script code, so it is safe to call after an interrupt.
    pub fn thrown_message(&self, value: &Value) -> String {
        match value {
            Value::Object(id) => {
                let object = self.heap.get(*id);
                let mut current = Some(*id);
                while let Some(cur) = current {
                    let o = self.heap.get(cur);
                    if let Some(p) = o.props.get("message") {
                        return match &p.value {
                            Value::Object(_) => "[object Object]".to_string(),
                            other => other.primitive_to_string().to_string(),
                        };
                    }
                    current = o.proto;
                }
                match object.kind {
                    ObjectKind::Array(_) => "[object Array]".to_string(),
                    ObjectKind::Function(_) => "[object Function]".to_string(),
                    _ => "[object Object]".to_string(),
                }
            }
            other => other.primitive_to_string().to_string(),
        }
    }

    // ---- resource checks -------------------------------------------------------------------------------------

    /// Loop and call boundary: observe the interrupt flag and, periodically, the deadline.
    pub fn checkpoint(&mut self) -> Completion<()> {
        self.ticks = self.ticks.wrapping_add(1);
        if self.interrupt.is_triggered() {
            return Err(Abrupt::Interrupt(Interrupt::Timeout));
        }
        if self.ticks % CLOCK_INTERVAL == 0 && self.limits.deadline.is_some_and(|d| Instant::now() >= d) {
            self.interrupt.trigger();
            return Err(Abrupt::Interrupt(Interrupt::Timeout));
        }
        Ok(())
    }

    pub(crate) fn enter_call(&mut self) -> Completion<()> {
        if self.depth >= self.limits.max_call_depth {
            return Err(self.range_error("Maximum call stack size exceeded"));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave_call(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Run `f` one level deeper in host recursion over script data.
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Completion<T>) -> Completion<T> {
        if self.native_depth >= MAX_NATIVE_NESTING {
            return Err(self.range_error("Maximum call stack size exceeded"));
        }
        self.native_depth += 1;
        let result = f(self);
        self.native_depth -= 1;
        result
    }

    pub fn check_string_len(&mut self, len: usize) -> Completion<()> {
        if len > self.limits.max_string_len {
            return Err(self.range_error("Invalid string length"));
        }
        Ok(())
    }

    pub fn check_array_len(&mut self, len: usize) -> Completion<()> {
        if len > self.limits.max_array_len {
            return Err(self.range_error("Invalid array length"));
        }
        Ok(())
    }

    /// Concatenate two strings under the string length cap.
    pub fn concat_strings(&mut self, a: &str, b: &str) -> Completion<Value> {
        self.check_string_len(utf16_len(a) + utf16_len(b))?;
        let mut out = String::with_capacity(a.len() + b.len());
        out.push_str(a);
        out.push_str(b);
        Ok(Value::from(out))
    }

    // ---- host services ---------------------------------------------------------------------------------------

    /// Forward one line of script console output to `tracing`.
    pub fn console_write(&mut self, level: ConsoleLevel, line: &str) {
        self.console_lines += 1;
        if self.console_lines > MAX_CONSOLE_LINES {
            if self.console_lines == MAX_CONSOLE_LINES + 1 {
                tracing::warn!(target: "proctor::console", "console output truncated after {MAX_CONSOLE_LINES} lines");
            }
            return;
        }
        match level {
            ConsoleLevel::Debug => tracing::debug!(target: "proctor::console", "{line}"),
            ConsoleLevel::Log => tracing::info!(target: "proctor::console", "{line}"),
            ConsoleLevel::Warn => tracing::warn!(target: "proctor::console", "{line}"),
            ConsoleLevel::Error => tracing::error!(target: "proctor::console", "{line}"),
        }
    }

    /// Deterministic `Math.random`: xorshift64* with a fixed seed, so repeated evaluations agree.
    pub fn next_random(&mut self) -> f64 {
        let mut x = self.rng_state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.rng_state = x;
        let bits = x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11;
        bits as f64 / (1u64 << 53) as f64
    }
}
