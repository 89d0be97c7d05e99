//! Shareable metadata for `proctor_core::lang` registries.
//!
//! The `proctor_core::lang` module is a set of **registry-first** vocabularies: keywords, operators and
//! punctuation. This submodule provides the small, dependency-free metadata types reused across all of them.
//!
//! ## Notes
//! - These types are intentionally lightweight and `Copy`-friendly so registries can live in `const` tables.
//! - Metadata is meant for tooling/diagnostics; enforcement of syntax rules still lives in the lexer/parser.

/// Identify the language edition that introduced a vocabulary item.
///
/// ## Examples
/// ```rust
/// use proctor_core::lang::registry::Edition;
///
/// assert!(Edition::Es2015 > Edition::Es5);
/// assert_eq!(Edition::Es2020.as_str(), "ES2020");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Edition {
    Es5,
    Es2015,
    Es2016,
    Es2020,
    Es2021,
}

impl Edition {
    /// Return the conventional display name for the edition.
    pub const fn as_str(self) -> &'static str {
        match self {
            Edition::Es5 => "ES5",
            Edition::Es2015 => "ES2015",
            Edition::Es2016 => "ES2016",
            Edition::Es2020 => "ES2020",
            Edition::Es2021 => "ES2021",
        }
    }
}

/// Describe whether the sandbox interpreter accepts a vocabulary item.
///
/// ## Notes
/// - `Reserved` items are recognised by the lexer so the parser can report a precise
///   “not supported” diagnostic instead of treating them as identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Support {
    Supported,
    Reserved,
}

/// Represent a small example snippet for documentation.
#[derive(Debug, Clone, Copy)]
pub struct Example {
    pub code: &'static str,
    pub note: Option<&'static str>,
}
