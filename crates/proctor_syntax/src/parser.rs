//! Parser for the script subset.
//!
//! Converts a token stream into an AST [`Program`]. The grammar is an ES2020 subset; see the crate docs for
//! what is accepted. Constructs outside the subset that learners commonly reach for (generators, `async`,
//! getters/setters, modules) are rejected with an `UnsupportedSyntax` error naming the construct.
//!
//! ## Examples
//!
//! ```rust
//! use proctor_syntax::{lexer, parser};
//!
//! let source = "function add(a, b) {\n  return a + b\n}\nmodule.exports = { add }\n";
//! let tokens = lexer::lex(source).unwrap();
//! let ast = parser::parse(&tokens).unwrap();
//! assert_eq!(ast.body.len(), 2);
//! ```

use std::rc::Rc;

use crate::ast::*;
use crate::diagnostics::CompileError;
use crate::lexer::{Lexer, TemplateChunk, Token, TokenKind};
use proctor_core::lang::keywords::KeywordId;
use proctor_core::lang::operators::{self, Associativity, OperatorId};
use proctor_core::lang::punctuation::PunctuationId;
use proctor_core::numbers::number_to_string;

// NOTE: This module is split across multiple files using `include!` to keep all parser
// methods in the same Rust module (preserving privacy + call patterns) while avoiding
// a single large source file.

include!("parser/core.rs");
include!("parser/helpers.rs");
include!("parser/stmts.rs");
include!("parser/decl.rs");
include!("parser/patterns.rs");
include!("parser/expr.rs");
include!("parser/api.rs");
include!("parser/tests.rs");
