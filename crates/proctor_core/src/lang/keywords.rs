//! Define the reserved keyword vocabulary for the script language.
//!
//! This module is the single source of truth for reserved words: a stable identifier ([`KeywordId`]) plus a
//! const metadata table ([`KEYWORDS`]) that records canonical spellings, categories, the edition that
//! introduced each word, and whether the sandbox interpreter supports it.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive** (`Const` is an identifier, `const` is a keyword).
//! - Contextual words (`of`, `static`, `get`, `set`) are deliberately absent: the lexer emits them as
//!   identifiers and the parser recognises them by position.
//! - Some reserved words are also “word operators” (e.g. `typeof`). If you need operator precedence, use
//!   [`crate::lang::operators`].
//!
//! ## Examples
//! ```rust
//! use proctor_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("function"), Some(KeywordId::Function));
//! assert_eq!(keywords::as_str(KeywordId::Typeof), "typeof");
//! assert_eq!(keywords::from_str("of"), None);
//! ```

use super::registry::{Edition, Example, Support};

/// Stable identifier for every reserved keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    // Control flow / statements
    If,
    Else,
    For,
    While,
    Do,
    Break,
    Continue,
    Return,
    Switch,
    Case,
    Default,
    Throw,
    Try,
    Catch,
    Finally,

    // Declarations
    Var,
    Let,
    Const,
    Function,
    Class,
    Extends,

    // Word operators
    New,
    Delete,
    Typeof,
    Instanceof,
    In,
    Void,

    // Receivers
    This,
    Super,

    // Literals
    True,
    False,
    Null,

    // Reserved but rejected by the sandbox parser
    Import,
    Export,
    Async,
    Await,
    Yield,
    With,
    Debugger,
    Enum,
}

/// High-level grouping for documentation and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    ControlFlow,
    Declaration,
    Operator,
    Receiver,
    Literal,
    Reserved,
}

/// Metadata for a keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub id: KeywordId,
    pub canonical: &'static str,
    pub category: KeywordCategory,
    pub edition: Edition,
    pub support: Support,
    pub examples: &'static [Example],
}

/// Registry of all keywords.
///
/// ## Notes
/// - The ordering is not semantically meaningful, but is grouped for readability.
pub const KEYWORDS: &[KeywordInfo] = &[
    // Control flow / statements
    info(KeywordId::If, "if", KeywordCategory::ControlFlow, Edition::Es5),
    info(KeywordId::Else, "else", KeywordCategory::ControlFlow, Edition::Es5),
    info(KeywordId::For, "for", KeywordCategory::ControlFlow, Edition::Es5),
    info(KeywordId::While, "while", KeywordCategory::ControlFlow, Edition::Es5),
    info(KeywordId::Do, "do", KeywordCategory::ControlFlow, Edition::Es5),
    info(KeywordId::Break, "break", KeywordCategory::ControlFlow, Edition::Es5),
    info(KeywordId::Continue, "continue", KeywordCategory::ControlFlow, Edition::Es5),
    info(KeywordId::Return, "return", KeywordCategory::ControlFlow, Edition::Es5),
    info(KeywordId::Switch, "switch", KeywordCategory::ControlFlow, Edition::Es5),
    info(KeywordId::Case, "case", KeywordCategory::ControlFlow, Edition::Es5),
    info(KeywordId::Default, "default", KeywordCategory::ControlFlow, Edition::Es5),
    info(KeywordId::Throw, "throw", KeywordCategory::ControlFlow, Edition::Es5),
    info(KeywordId::Try, "try", KeywordCategory::ControlFlow, Edition::Es5),
    info(KeywordId::Catch, "catch", KeywordCategory::ControlFlow, Edition::Es5),
    info(KeywordId::Finally, "finally", KeywordCategory::ControlFlow, Edition::Es5),
    // Declarations
    info(KeywordId::Var, "var", KeywordCategory::Declaration, Edition::Es5),
    info(KeywordId::Let, "let", KeywordCategory::Declaration, Edition::Es2015),
    info(KeywordId::Const, "const", KeywordCategory::Declaration, Edition::Es2015),
    info(KeywordId::Function, "function", KeywordCategory::Declaration, Edition::Es5),
    info(KeywordId::Class, "class", KeywordCategory::Declaration, Edition::Es2015),
    info(KeywordId::Extends, "extends", KeywordCategory::Declaration, Edition::Es2015),
    // Word operators
    info(KeywordId::New, "new", KeywordCategory::Operator, Edition::Es5),
    info(KeywordId::Delete, "delete", KeywordCategory::Operator, Edition::Es5),
    info(KeywordId::Typeof, "typeof", KeywordCategory::Operator, Edition::Es5),
    info(KeywordId::Instanceof, "instanceof", KeywordCategory::Operator, Edition::Es5),
    info(KeywordId::In, "in", KeywordCategory::Operator, Edition::Es5),
    info(KeywordId::Void, "void", KeywordCategory::Operator, Edition::Es5),
    // Receivers
    info(KeywordId::This, "this", KeywordCategory::Receiver, Edition::Es5),
    info(KeywordId::Super, "super", KeywordCategory::Receiver, Edition::Es2015),
    // Literals
    info(KeywordId::True, "true", KeywordCategory::Literal, Edition::Es5),
    info(KeywordId::False, "false", KeywordCategory::Literal, Edition::Es5),
    info(KeywordId::Null, "null", KeywordCategory::Literal, Edition::Es5),
    // Reserved
    reserved(KeywordId::Import, "import", Edition::Es2015),
    reserved(KeywordId::Export, "export", Edition::Es2015),
    reserved(KeywordId::Async, "async", Edition::Es2020),
    reserved(KeywordId::Await, "await", Edition::Es2020),
    reserved(KeywordId::Yield, "yield", Edition::Es2015),
    reserved(KeywordId::With, "with", Edition::Es5),
    reserved(KeywordId::Debugger, "debugger", Edition::Es5),
    reserved(KeywordId::Enum, "enum", Edition::Es5),
];

/// Canonical spelling.
pub fn as_str(id: KeywordId) -> &'static str {
    info_for(id).canonical
}

/// Category.
pub fn category(id: KeywordId) -> KeywordCategory {
    info_for(id).category
}

/// Return `true` if the sandbox parser accepts this keyword.
pub fn is_supported(id: KeywordId) -> bool {
    info_for(id).support == Support::Supported
}

/// Full metadata.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: KeywordId) -> &'static KeywordInfo {
    KEYWORDS.iter().find(|k| k.id == id).expect("keyword info missing")
}

/// Lookup by spelling.
///
/// ## Returns
/// - `Some(KeywordId)` if the spelling is a reserved word.
/// - `None` otherwise (including contextual words such as `of`).
pub fn from_str(s: &str) -> Option<KeywordId> {
    KEYWORDS.iter().find(|k| k.canonical == s).map(|k| k.id)
}

// --- helpers -----------------------------------------------------------------

const fn info(id: KeywordId, canonical: &'static str, category: KeywordCategory, edition: Edition) -> KeywordInfo {
    KeywordInfo {
        id,
        canonical,
        category,
        edition,
        support: Support::Supported,
        examples: &[],
    }
}

const fn reserved(id: KeywordId, canonical: &'static str, edition: Edition) -> KeywordInfo {
    KeywordInfo {
        id,
        canonical,
        category: KeywordCategory::Reserved,
        edition,
        support: Support::Reserved,
        examples: &[],
    }
}
