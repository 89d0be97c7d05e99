//! Small helper APIs for working with `Token` / `TokenKind`.
//!
//! These helpers exist to reduce repetitive `matches!(...)` at call sites in the parser and the policy
//! scanner, both of which walk ID-based tokens.

use crate::lexer::{Token, TokenKind};
use proctor_core::lang::keywords::{self, KeywordId};
use proctor_core::lang::operators::OperatorId;
use proctor_core::lang::punctuation::PunctuationId;

impl TokenKind {
    /// Return the keyword id, if this is a keyword token.
    pub fn keyword_id(&self) -> Option<KeywordId> {
        match self {
            TokenKind::Keyword(id) => Some(*id),
            _ => None,
        }
    }

    /// Return `true` if this is the given keyword.
    pub fn is_keyword(&self, id: KeywordId) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == id)
    }

    /// Return the operator id, if this is an operator token.
    pub fn operator_id(&self) -> Option<OperatorId> {
        match self {
            TokenKind::Operator(id) => Some(*id),
            _ => None,
        }
    }

    /// Return `true` if this is the given operator.
    pub fn is_operator(&self, id: OperatorId) -> bool {
        matches!(self, TokenKind::Operator(o) if *o == id)
    }

    /// Return the punctuation id, if this is a punctuation token.
    pub fn punctuation_id(&self) -> Option<PunctuationId> {
        match self {
            TokenKind::Punctuation(id) => Some(*id),
            _ => None,
        }
    }

    /// Return `true` if this is the given punctuation.
    pub fn is_punctuation(&self, id: PunctuationId) -> bool {
        matches!(self, TokenKind::Punctuation(p) if *p == id)
    }

    /// Return the spelling usable as a property name after `.`: identifiers and every keyword (`a.default`,
    /// `x.new`, `el.class`).
    pub fn property_name(&self) -> Option<&str> {
        match self {
            TokenKind::Ident(name) => Some(name),
            TokenKind::Keyword(id) => Some(keywords::as_str(*id)),
            _ => None,
        }
    }

    /// Short human-readable rendering for error messages (`'}'`, `identifier 'x'`, `end of input`).
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Keyword(id) => format!("'{}'", keywords::as_str(*id)),
            TokenKind::Operator(id) => format!("'{}'", proctor_core::lang::operators::as_str(*id)),
            TokenKind::Punctuation(id) => format!("'{}'", proctor_core::lang::punctuation::as_str(*id)),
            TokenKind::Ident(name) => format!("identifier '{name}'"),
            TokenKind::Number(n) => format!("number {}", proctor_core::numbers::number_to_string(*n)),
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::Template(_) => "template literal".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

impl Token {
    /// Convenience wrapper for `self.kind.keyword_id()`.
    pub fn keyword_id(&self) -> Option<KeywordId> {
        self.kind.keyword_id()
    }

    /// Convenience wrapper for `self.kind.operator_id()`.
    pub fn operator_id(&self) -> Option<OperatorId> {
        self.kind.operator_id()
    }

    /// Convenience wrapper for `self.kind.punctuation_id()`.
    pub fn punctuation_id(&self) -> Option<PunctuationId> {
        self.kind.punctuation_id()
    }

    /// Return `true` if this token is the identifier `name` (contextual keywords like `of` and `static`).
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(n) if n == name)
    }
}
