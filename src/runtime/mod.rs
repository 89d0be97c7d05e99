//! The script runtime: a tree-walking interpreter over the `proctor_syntax` AST.
//!
//! ## Notes
//! - Each evaluation builds its own [`Interpreter`] (heap, intrinsics, global scope) and drops it whole.
//! - The interpreter has no timers, storage, network or dynamic evaluation. The only host surface it exposes
//!   is what the sandbox installs on top of the intrinsics.
//! - Every loop iteration and function entry is a checkpoint: the interrupt flag, the wall-clock deadline and
//!   the call-depth limit are enforced there.

pub mod dom;
pub mod interpreter;
pub mod intrinsics;
pub mod object;
pub mod scope;
pub mod value;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

pub use interpreter::Interpreter;
pub use value::{ObjectId, Value};

/// Why execution stopped without the script being able to observe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    /// The deadline passed or the guard raised the interrupt flag.
    Timeout,
    /// The object heap is full.
    HeapExhausted,
}

/// A non-normal completion that unwinds the Rust stack.
///
/// `Throw` is visible to script `try/catch`; `Interrupt` is not, and always reaches the host.
#[derive(Debug, Clone)]
pub enum Abrupt {
    Throw(Value),
    Interrupt(Interrupt),
}

pub type Completion<T> = Result<T, Abrupt>;

/// Resource limits for one evaluation.
#[derive(Debug, Clone)]
pub struct Limits {
    pub max_call_depth: usize,
    /// Longest string (in UTF-16 code units) a script may build.
    pub max_string_len: usize,
    pub max_array_len: usize,
    pub max_objects: usize,
    pub deadline: Option<Instant>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_call_depth: 256,
            max_string_len: 8 * 1024 * 1024,
            max_array_len: 1_000_000,
            max_objects: 2_000_000,
            deadline: None,
        }
    }
}

/// Shared flag that asks a running interpreter to stop at its next checkpoint.
///
/// Cloning shares the flag; the handle is `Send` so a guard on another thread can raise it.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_handle_is_shared_between_clones() {
        let handle = InterruptHandle::new();
        let seen_by_worker = handle.clone();
        assert!(!seen_by_worker.is_triggered());
        handle.trigger();
        assert!(seen_by_worker.is_triggered());
    }

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_call_depth, 256);
        assert!(limits.deadline.is_none());
    }
}
