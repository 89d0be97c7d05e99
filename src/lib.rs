#![forbid(unsafe_code)]
//! Proctor: sandboxed evaluation and grading of learner-submitted scripts.
//!
//! Learner code and an instructor test script go in; a [`SuiteResult`] comes out. Each evaluation screens
//! the source against a [`policy`], runs it in a fresh realm of the built-in [`runtime`] (a tree-walking
//! interpreter with no host access beyond what the sandbox grants), and collects `test`/`it`/`describe`
//! outcomes through the [`harness`] and [`matchers`].
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module
//!   enforces `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//! - **Script errors** never panic the host: they are `Abrupt::Throw` values, and resource exhaustion is an
//!   `Abrupt::Interrupt` that unwinds to the sandbox boundary.
//!
//! ## Examples
//! ```rust
//! let result = proctor::evaluate(
//!     "exports.add = (a, b) => a + b",
//!     "test('adds', () => expect(userCode.add(2, 3)).toBe(5))",
//!     5000,
//! );
//! assert!(result.passed);
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod harness;
pub mod matchers;
pub mod policy;
pub mod preview;
pub mod report;
pub mod runtime;
pub mod sandbox;

pub use config::EngineConfig;
pub use engine::{Engine, evaluate};
pub use error::EngineError;
pub use policy::{Policy, PolicyVerdict};
pub use preview::{IsolatedDocument, PreviewTemplate};
pub use report::{AssertionOutcome, FatalKind, SuiteResult};
pub use sandbox::{Capabilities, EvaluationRequest};
