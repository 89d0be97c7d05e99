//! Token types for the script lexer.
//!
//! The lexer uses **registry-backed IDs** for language vocabulary:
//! - `Keyword(KeywordId)` for reserved words (including word operators like `typeof`)
//! - `Operator(OperatorId)` for symbol operators
//! - `Punctuation(PunctuationId)` for punctuation tokens
//!
//! ## Notes
//! - There are no newline tokens. Each token instead records whether a line break preceded it, which is all
//!   automatic semicolon insertion and the restricted productions (`return`, `throw`, postfix `++`) need.
//! - Use `crate::token_helpers` for ergonomic token matching at call sites.

use crate::ast::Span;
use proctor_core::lang::keywords::{self, KeywordId};
use proctor_core::lang::operators::OperatorId;
use proctor_core::lang::punctuation::PunctuationId;

// ============================================================================
// TOKEN TYPES
// ============================================================================

/// Kind of token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ========== Keyword / operator / punctuation (ID-based) ==========
    Keyword(KeywordId),
    Operator(OperatorId),
    Punctuation(PunctuationId),

    // ========== Identifiers and Literals ==========
    Ident(String),
    Number(f64),
    String(String),
    Template(Vec<TemplateChunk>),

    // ========== Special ==========
    Eof,
}

/// Part of a template literal.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateChunk {
    /// Cooked text between substitutions.
    Literal(String),
    /// Raw source of a `${...}` substitution; the parser lexes and parses it. `offset` is the absolute byte
    /// position of `source` in the original input.
    Expr { source: String, offset: usize },
}

/// A token with its kind, source span, and line-break flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// `true` if at least one line terminator separates this token from the previous one.
    pub newline_before: bool,
}

impl Token {
    /// Construct a new token.
    pub fn new(kind: TokenKind, span: Span, newline_before: bool) -> Self {
        Self {
            kind,
            span,
            newline_before,
        }
    }
}

/// Resolve an identifier spelling to a keyword id, if reserved.
pub fn keyword_id(name: &str) -> Option<KeywordId> {
    keywords::from_str(name)
}
