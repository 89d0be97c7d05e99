//! Script frontend for proctor: lexer, parser, AST, diagnostics.
//!
//! The accepted language is the JavaScript subset learners write in lessons: bindings, functions, arrows,
//! classes, destructuring, spread, template literals and optional chaining. Everything outside that subset is
//! rejected with a [`diagnostics::CompileError`] pointing at the offending source.
//!
//! ## Notes
//! - This crate is syntax-only: it does not resolve names or evaluate anything.
//! - Vocabulary identity (keywords/operators/punctuation) comes from `proctor_core::lang` registries.
//!
//! ## Examples
//! ```rust
//! use proctor_syntax::{lexer, parser};
//!
//! let tokens = lexer::lex("const x = 1\nreturn x * 2").unwrap();
//! let program = parser::parse(&tokens).unwrap();
//! assert_eq!(program.body.len(), 2);
//! ```

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod token_helpers;

use ast::Program;
use diagnostics::CompileError;

/// Lex and parse `source` in one step.
///
/// ## Errors
/// Returns every lexer error if lexing fails, otherwise every parser error.
pub fn parse_source(source: &str) -> Result<Program, Vec<CompileError>> {
    let tokens = lexer::lex(source)?;
    parser::parse(&tokens)
}
