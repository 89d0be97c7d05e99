//! Operator vocabulary.
//!
//! This module defines the canonical operator set (symbol operators like `+` and word operators like
//! `typeof`) along with precedence, associativity, and fixity. The parser's binary-expression loop reads
//! precedence straight from this table, so the table *is* the grammar for infix operators.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - Word operators (`typeof`, `instanceof`, `in`, `delete`, `void`) have [`OperatorInfo::is_keyword_spelling`]
//!   set; the lexer emits them as keywords.
//! - Assignment operators carry precedence [`ASSIGNMENT_PRECEDENCE`] but are parsed by a dedicated rule (their
//!   left side must be a valid target).
//!
//! ## Examples
//! ```rust
//! use proctor_core::lang::operators::{self, OperatorId};
//!
//! assert_eq!(operators::from_str("==="), Some(OperatorId::EqEqEq));
//! assert!(operators::info_for(OperatorId::Star).precedence > operators::info_for(OperatorId::Plus).precedence);
//! ```

use super::registry::{Edition, Example};

/// Precedence shared by every assignment operator.
pub const ASSIGNMENT_PRECEDENCE: u8 = 10;

/// Define how operators associate when chained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
    None,
}

/// Define whether an operator is infix (binary), prefix, or usable as both prefix and postfix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Infix,
    Prefix,
    PrefixOrPostfix,
}

/// Stable identifier for every operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorId {
    // Arithmetic
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,

    // Equality / comparison
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Bitwise
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,
    UShr,

    // Logical
    AmpAmp,
    PipePipe,
    QuestionQuestion,
    Bang,

    // Update
    PlusPlus,
    MinusMinus,

    // Assignment
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    StarStarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,
    UShrEq,
    AmpAmpEq,
    PipePipeEq,
    QuestionQuestionEq,

    // Word operators
    Typeof,
    Instanceof,
    In,
    Delete,
    Void,
}

/// Metadata for an operator.
///
/// ## Notes
/// - `precedence` is a relative ordering where higher binds tighter. The absolute scale is an implementation
///   detail, but must be consistent across the parser.
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    pub id: OperatorId,
    pub spellings: &'static [&'static str],
    pub precedence: u8,
    pub associativity: Associativity,
    pub fixity: Fixity,
    pub is_keyword_spelling: bool,
    pub edition: Edition,
    pub examples: &'static [Example],
}

/// Registry of all operators.
pub const OPERATORS: &[OperatorInfo] = &[
    // Arithmetic
    infix(OperatorId::Plus, &["+"], 100, Edition::Es5),
    infix(OperatorId::Minus, &["-"], 100, Edition::Es5),
    infix(OperatorId::Star, &["*"], 110, Edition::Es5),
    op(
        OperatorId::StarStar,
        &["**"],
        120,
        Associativity::Right,
        Fixity::Infix,
        false,
        Edition::Es2016,
    ),
    infix(OperatorId::Slash, &["/"], 110, Edition::Es5),
    infix(OperatorId::Percent, &["%"], 110, Edition::Es5),
    // Equality / comparison
    infix(OperatorId::EqEq, &["=="], 70, Edition::Es5),
    infix(OperatorId::NotEq, &["!="], 70, Edition::Es5),
    infix(OperatorId::EqEqEq, &["==="], 70, Edition::Es5),
    infix(OperatorId::NotEqEq, &["!=="], 70, Edition::Es5),
    infix(OperatorId::Lt, &["<"], 80, Edition::Es5),
    infix(OperatorId::LtEq, &["<="], 80, Edition::Es5),
    infix(OperatorId::Gt, &[">"], 80, Edition::Es5),
    infix(OperatorId::GtEq, &[">="], 80, Edition::Es5),
    // Bitwise
    infix(OperatorId::Amp, &["&"], 60, Edition::Es5),
    infix(OperatorId::Pipe, &["|"], 50, Edition::Es5),
    infix(OperatorId::Caret, &["^"], 55, Edition::Es5),
    prefix(OperatorId::Tilde, &["~"], false, Edition::Es5),
    infix(OperatorId::Shl, &["<<"], 90, Edition::Es5),
    infix(OperatorId::Shr, &[">>"], 90, Edition::Es5),
    infix(OperatorId::UShr, &[">>>"], 90, Edition::Es5),
    // Logical
    infix(OperatorId::AmpAmp, &["&&"], 40, Edition::Es5),
    infix(OperatorId::PipePipe, &["||"], 30, Edition::Es5),
    infix(OperatorId::QuestionQuestion, &["??"], 30, Edition::Es2020),
    prefix(OperatorId::Bang, &["!"], false, Edition::Es5),
    // Update
    op(
        OperatorId::PlusPlus,
        &["++"],
        130,
        Associativity::None,
        Fixity::PrefixOrPostfix,
        false,
        Edition::Es5,
    ),
    op(
        OperatorId::MinusMinus,
        &["--"],
        130,
        Associativity::None,
        Fixity::PrefixOrPostfix,
        false,
        Edition::Es5,
    ),
    // Assignment
    assign(OperatorId::Eq, &["="], Edition::Es5),
    assign(OperatorId::PlusEq, &["+="], Edition::Es5),
    assign(OperatorId::MinusEq, &["-="], Edition::Es5),
    assign(OperatorId::StarEq, &["*="], Edition::Es5),
    assign(OperatorId::StarStarEq, &["**="], Edition::Es2016),
    assign(OperatorId::SlashEq, &["/="], Edition::Es5),
    assign(OperatorId::PercentEq, &["%="], Edition::Es5),
    assign(OperatorId::AmpEq, &["&="], Edition::Es5),
    assign(OperatorId::PipeEq, &["|="], Edition::Es5),
    assign(OperatorId::CaretEq, &["^="], Edition::Es5),
    assign(OperatorId::ShlEq, &["<<="], Edition::Es5),
    assign(OperatorId::ShrEq, &[">>="], Edition::Es5),
    assign(OperatorId::UShrEq, &[">>>="], Edition::Es5),
    assign(OperatorId::AmpAmpEq, &["&&="], Edition::Es2021),
    assign(OperatorId::PipePipeEq, &["||="], Edition::Es2021),
    assign(OperatorId::QuestionQuestionEq, &["??="], Edition::Es2021),
    // Word operators (keyword spellings)
    prefix(OperatorId::Typeof, &["typeof"], true, Edition::Es5),
    op(
        OperatorId::Instanceof,
        &["instanceof"],
        80,
        Associativity::Left,
        Fixity::Infix,
        true,
        Edition::Es5,
    ),
    op(
        OperatorId::In,
        &["in"],
        80,
        Associativity::Left,
        Fixity::Infix,
        true,
        Edition::Es5,
    ),
    prefix(OperatorId::Delete, &["delete"], true, Edition::Es5),
    prefix(OperatorId::Void, &["void"], true, Edition::Es5),
];

/// Return the full metadata entry for an operator.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: OperatorId) -> &'static OperatorInfo {
    OPERATORS.iter().find(|o| o.id == id).expect("operator info missing")
}

/// Return the canonical (first) spelling of an operator.
pub fn as_str(id: OperatorId) -> &'static str {
    info_for(id).spellings[0]
}

/// Return the binary precedence of `id`, or `None` if it is not an infix operator.
///
/// ## Notes
/// - Assignment operators return `None`: they are handled by the assignment rule, not the binary loop.
pub fn binary_precedence(id: OperatorId) -> Option<u8> {
    let info = info_for(id);
    (info.fixity == Fixity::Infix && info.precedence > ASSIGNMENT_PRECEDENCE).then_some(info.precedence)
}

/// Return `true` if `id` is an assignment operator (`=`, `+=`, `??=`, ...).
pub fn is_assignment(id: OperatorId) -> bool {
    let info = info_for(id);
    info.fixity == Fixity::Infix && info.precedence == ASSIGNMENT_PRECEDENCE
}

/// Resolve an operator spelling to its identifier.
///
/// ## Notes
/// - Matching is **case-sensitive**.
pub fn from_str(spelling: &str) -> Option<OperatorId> {
    OPERATORS
        .iter()
        .find(|o| {
            let spellings: &[&str] = o.spellings;
            spellings.contains(&spelling)
        })
        .map(|o| o.id)
}

// --- helpers -----------------------------------------------------------------

const fn op(
    id: OperatorId,
    spellings: &'static [&'static str],
    precedence: u8,
    associativity: Associativity,
    fixity: Fixity,
    is_keyword_spelling: bool,
    edition: Edition,
) -> OperatorInfo {
    OperatorInfo {
        id,
        spellings,
        precedence,
        associativity,
        fixity,
        is_keyword_spelling,
        edition,
        examples: &[],
    }
}

const fn infix(id: OperatorId, spellings: &'static [&'static str], precedence: u8, edition: Edition) -> OperatorInfo {
    op(id, spellings, precedence, Associativity::Left, Fixity::Infix, false, edition)
}

const fn prefix(id: OperatorId, spellings: &'static [&'static str], keyword: bool, edition: Edition) -> OperatorInfo {
    op(id, spellings, 130, Associativity::Right, Fixity::Prefix, keyword, edition)
}

const fn assign(id: OperatorId, spellings: &'static [&'static str], edition: Edition) -> OperatorInfo {
    op(
        id,
        spellings,
        ASSIGNMENT_PRECEDENCE,
        Associativity::Right,
        Fixity::Infix,
        false,
        edition,
    )
}
