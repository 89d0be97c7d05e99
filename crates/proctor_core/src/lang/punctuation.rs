//! Punctuation vocabulary.
//!
//! This module defines the canonical set of non-operator punctuation tokens used by the lexer/parser:
//! delimiters, separators, access markers, and a few structural markers.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - This module is vocabulary only (spellings + metadata). It does not tokenize source text.
//!
//! ## Examples
//! ```rust
//! use proctor_core::lang::punctuation::{self, PunctuationId};
//!
//! assert_eq!(punctuation::from_str("?."), Some(PunctuationId::QuestionDot));
//! assert_eq!(punctuation::as_str(PunctuationId::FatArrow), "=>");
//! ```

use super::registry::{Edition, Example};

/// Broad syntactic grouping for punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunctuationCategory {
    /// Brackets and braces.
    Delimiter,
    /// Separators like `,`, `;` and `:`.
    Separator,
    /// Access markers like `.` and `?.`.
    Access,
    /// The arrow-function marker `=>`.
    Arrow,
    /// Misc markers like `?` and `...`.
    Marker,
}

/// Stable identifier for punctuation tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunctuationId {
    // Separators / markers
    Comma,
    Semicolon,
    Colon,
    Question,

    // Access
    Dot,
    QuestionDot,

    // Structural arrows
    FatArrow,

    // Special markers
    Ellipsis,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
}

/// Metadata for a punctuation token.
#[derive(Debug, Clone, Copy)]
pub struct PunctuationInfo {
    pub id: PunctuationId,
    pub canonical: &'static str,
    pub category: PunctuationCategory,
    pub edition: Edition,
    pub examples: &'static [Example],
}

/// Registry of all punctuation tokens.
pub const PUNCTUATION: &[PunctuationInfo] = &[
    // Separators / markers
    info(PunctuationId::Comma, ",", PunctuationCategory::Separator, Edition::Es5),
    info(PunctuationId::Semicolon, ";", PunctuationCategory::Separator, Edition::Es5),
    info(PunctuationId::Colon, ":", PunctuationCategory::Separator, Edition::Es5),
    info(PunctuationId::Question, "?", PunctuationCategory::Marker, Edition::Es5),
    // Access
    info(PunctuationId::Dot, ".", PunctuationCategory::Access, Edition::Es5),
    info(PunctuationId::QuestionDot, "?.", PunctuationCategory::Access, Edition::Es2020),
    // Arrows
    info(PunctuationId::FatArrow, "=>", PunctuationCategory::Arrow, Edition::Es2015),
    // Markers
    info(PunctuationId::Ellipsis, "...", PunctuationCategory::Marker, Edition::Es2015),
    // Delimiters
    info(PunctuationId::LParen, "(", PunctuationCategory::Delimiter, Edition::Es5),
    info(PunctuationId::RParen, ")", PunctuationCategory::Delimiter, Edition::Es5),
    info(PunctuationId::LBracket, "[", PunctuationCategory::Delimiter, Edition::Es5),
    info(PunctuationId::RBracket, "]", PunctuationCategory::Delimiter, Edition::Es5),
    info(PunctuationId::LBrace, "{", PunctuationCategory::Delimiter, Edition::Es5),
    info(PunctuationId::RBrace, "}", PunctuationCategory::Delimiter, Edition::Es5),
];

/// Return the canonical spelling for a punctuation token.
pub fn as_str(id: PunctuationId) -> &'static str {
    info_for(id).canonical
}

/// Return the category for a punctuation token.
pub fn category(id: PunctuationId) -> PunctuationCategory {
    info_for(id).category
}

/// Return the full metadata entry for a punctuation token.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: PunctuationId) -> &'static PunctuationInfo {
    PUNCTUATION
        .iter()
        .find(|p| p.id == id)
        .expect("punctuation info missing")
}

/// Resolve a punctuation spelling to its identifier.
pub fn from_str(s: &str) -> Option<PunctuationId> {
    PUNCTUATION.iter().find(|p| p.canonical == s).map(|p| p.id)
}

const fn info(
    id: PunctuationId,
    canonical: &'static str,
    category: PunctuationCategory,
    edition: Edition,
) -> PunctuationInfo {
    PunctuationInfo {
        id,
        canonical,
        category,
        edition,
        examples: &[],
    }
}
