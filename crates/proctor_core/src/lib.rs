//! Provide shared, pure semantic helpers and canonical vocabulary for the Proctor script language.
//!
//! This crate is intentionally small and dependency-free. It contains deterministic helpers that both:
//! - the syntax frontend uses to recognise keywords, operators and punctuation, and
//! - the runtime uses to convert between numbers and strings with script semantics.
//!
//! ## Notes
//!
//! - This is a “semantic core” crate: **no IO**, no global state, and no AST or runtime types.
//! - Current scope: number formatting/parsing and integer coercions ([`numbers`]), UTF-16 aware string helpers
//!   ([`strings`]), and canonical language vocabulary ([`lang`]).

pub mod lang;
pub mod numbers;
pub mod strings;
