//! Lexer for the script subset.
//!
//! Handles tokenization including:
//! - Keywords and identifiers (`$` and `_` allowed, Unicode letters accepted)
//! - Numeric literals (decimal, hex/octal/binary, `_` separators)
//! - String and template literals (with `${...}` substitutions kept as raw source)
//! - Operators and punctuation, longest match first
//! - Line and block comments
//!
//! ## Module Structure
//!
//! - `tokens` - Token types (TokenKind, Token, TemplateChunk)
//! - `strings` - String/template scanning and escape decoding
//! - `numbers` - Numeric literal scanning
//!
//! ## Notes
//! - Regular expression literals are outside the supported subset. A `/` where an operand is expected is
//!   reported as unsupported instead of being mis-lexed as division.

mod numbers;
mod strings;
pub mod tokens;

pub use tokens::{TemplateChunk, Token, TokenKind, keyword_id};

use crate::ast::Span;
use crate::diagnostics::CompileError;
use proctor_core::lang::keywords::KeywordId;
use proctor_core::lang::operators::OperatorId;
use proctor_core::lang::punctuation::PunctuationId;

// ============================================================================
// LEXER STATE
// ----------------------------------------------------------------------------
// Line breaks never become tokens. They set `newline_pending`, which is
// copied onto the next token as `newline_before` and then cleared:
//
//   a \n b   →  Ident(a){nl=false}  Ident(b){nl=true}
//   a /* \n */ b  →  same (block comments spanning a line count as a break)
// ============================================================================

/// Lexer for script source code.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    /// Absolute offset of `source` within the original input (non-zero for template substitutions).
    base_offset: usize,
    newline_pending: bool,
    /// Bracket depth; closing an unopened bracket is an error.
    bracket_depth: usize,
    tokens: Vec<Token>,
    errors: Vec<CompileError>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self::with_offset(source, 0)
    }

    /// Create a lexer whose spans are shifted by `base_offset` bytes.
    pub fn with_offset(source: &'a str, base_offset: usize) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            base_offset,
            newline_pending: false,
            bracket_depth: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire source code.
    ///
    /// Returns a vector of tokens on success, or a vector of errors on failure.
    /// The token stream always ends with an `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<CompileError>> {
        while !self.is_at_end() {
            self.scan_token();
        }

        let end = self.base_offset + self.current_pos;
        self.tokens
            .push(Token::new(TokenKind::Eof, Span::new(end, end), self.newline_pending));

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.current_pos..].chars();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((pos, c)) = self.chars.next() {
            self.current_pos = pos + c.len_utf8();
            Some(c)
        } else {
            None
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.base_offset + start, self.base_offset + self.current_pos)
    }

    fn error(&mut self, message: impl Into<String>, start: usize) {
        let span = self.span_from(start);
        self.errors.push(CompileError::syntax(message.into(), span));
    }

    fn unsupported(&mut self, message: impl Into<String>, start: usize) {
        let span = self.span_from(start);
        self.errors.push(CompileError::unsupported(message.into(), span));
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self) {
        let start = self.current_pos;

        let Some(c) = self.advance() else {
            return;
        };

        match c {
            // Line terminators
            '\n' | '\u{2028}' | '\u{2029}' => self.newline_pending = true,

            // Whitespace
            ' ' | '\t' | '\r' | '\u{000B}' | '\u{000C}' | '\u{00A0}' | '\u{FEFF}' => {}
            _ if c.is_whitespace() => {}

            // Comments or slash operators
            '/' => self.scan_slash(start),

            // Operators
            '+' => self.longest(start, OperatorId::Plus, &[("+", OperatorId::PlusPlus), ("=", OperatorId::PlusEq)]),
            '-' => self.longest(
                start,
                OperatorId::Minus,
                &[("-", OperatorId::MinusMinus), ("=", OperatorId::MinusEq)],
            ),
            '*' => self.longest(
                start,
                OperatorId::Star,
                &[("*=", OperatorId::StarStarEq), ("*", OperatorId::StarStar), ("=", OperatorId::StarEq)],
            ),
            '%' => self.longest(start, OperatorId::Percent, &[("=", OperatorId::PercentEq)]),
            '=' => {
                if self.match_str("==") {
                    self.add_op(OperatorId::EqEqEq, start);
                } else if self.match_char('=') {
                    self.add_op(OperatorId::EqEq, start);
                } else if self.match_char('>') {
                    self.add_punct(PunctuationId::FatArrow, start);
                } else {
                    self.add_op(OperatorId::Eq, start);
                }
            }
            '!' => self.longest(start, OperatorId::Bang, &[("==", OperatorId::NotEqEq), ("=", OperatorId::NotEq)]),
            '<' => self.longest(
                start,
                OperatorId::Lt,
                &[("<=", OperatorId::ShlEq), ("<", OperatorId::Shl), ("=", OperatorId::LtEq)],
            ),
            '>' => self.longest(
                start,
                OperatorId::Gt,
                &[
                    (">>=", OperatorId::UShrEq),
                    (">>", OperatorId::UShr),
                    (">=", OperatorId::ShrEq),
                    (">", OperatorId::Shr),
                    ("=", OperatorId::GtEq),
                ],
            ),
            '&' => self.longest(
                start,
                OperatorId::Amp,
                &[("&=", OperatorId::AmpAmpEq), ("&", OperatorId::AmpAmp), ("=", OperatorId::AmpEq)],
            ),
            '|' => self.longest(
                start,
                OperatorId::Pipe,
                &[("|=", OperatorId::PipePipeEq), ("|", OperatorId::PipePipe), ("=", OperatorId::PipeEq)],
            ),
            '^' => self.longest(start, OperatorId::Caret, &[("=", OperatorId::CaretEq)]),
            '~' => self.add_op(OperatorId::Tilde, start),
            '?' => self.scan_question(start),

            // Punctuation
            '.' => {
                if self.peek().is_some_and(|d| d.is_ascii_digit()) {
                    self.scan_number(start, c);
                } else if self.match_str("..") {
                    self.add_punct(PunctuationId::Ellipsis, start);
                } else {
                    self.add_punct(PunctuationId::Dot, start);
                }
            }
            ',' => self.add_punct(PunctuationId::Comma, start),
            ';' => self.add_punct(PunctuationId::Semicolon, start),
            ':' => self.add_punct(PunctuationId::Colon, start),
            '(' => self.open_bracket(PunctuationId::LParen, start),
            ')' => self.close_bracket(PunctuationId::RParen, start),
            '[' => self.open_bracket(PunctuationId::LBracket, start),
            ']' => self.close_bracket(PunctuationId::RBracket, start),
            '{' => self.open_bracket(PunctuationId::LBrace, start),
            '}' => self.close_bracket(PunctuationId::RBrace, start),

            // Strings
            '"' | '\'' => self.scan_string(start, c),
            '`' => self.scan_template(start),

            // Numbers
            '0'..='9' => self.scan_number(start, c),

            // Identifiers and keywords
            _ if is_ident_start(c) => self.scan_identifier(start),

            '#' => {
                self.consume_ident_tail();
                self.unsupported("Private class members (#name) are not supported", start);
            }
            '@' => self.unsupported("Decorators are not supported", start),

            _ => self.error(format!("Unexpected character '{}'", c), start),
        }
    }

    // ========================================================================
    // Operator helpers
    // ========================================================================

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume `s` if the remaining input starts with it.
    fn match_str(&mut self, s: &str) -> bool {
        if self.source[self.current_pos..].starts_with(s) {
            for _ in s.chars() {
                self.advance();
            }
            true
        } else {
            false
        }
    }

    fn add_token(&mut self, kind: TokenKind, start: usize) {
        let span = self.span_from(start);
        let newline_before = std::mem::take(&mut self.newline_pending);
        self.tokens.push(Token::new(kind, span, newline_before));
    }

    fn add_op(&mut self, id: OperatorId, start: usize) {
        self.add_token(TokenKind::Operator(id), start);
    }

    fn add_punct(&mut self, id: PunctuationId, start: usize) {
        self.add_token(TokenKind::Punctuation(id), start);
    }

    /// Try each compound continuation in order (longest first), fallback to `simple`.
    fn longest(&mut self, start: usize, simple: OperatorId, compounds: &[(&str, OperatorId)]) {
        for (rest, id) in compounds {
            if self.match_str(rest) {
                self.add_op(*id, start);
                return;
            }
        }
        self.add_op(simple, start);
    }

    /// Scan `?`, `?.`, `??`, `??=`.
    ///
    /// `a?.5:1` is a conditional, not optional chaining, so `?.` followed by a digit stays `?`.
    fn scan_question(&mut self, start: usize) {
        if self.match_str("?=") {
            self.add_op(OperatorId::QuestionQuestionEq, start);
        } else if self.match_char('?') {
            self.add_op(OperatorId::QuestionQuestion, start);
        } else if self.peek() == Some('.') && !self.peek_next().is_some_and(|d| d.is_ascii_digit()) {
            self.advance();
            self.add_punct(PunctuationId::QuestionDot, start);
        } else {
            self.add_punct(PunctuationId::Question, start);
        }
    }

    /// Scan comments and slash operators: `//`, `/* */`, `/=`, `/`.
    fn scan_slash(&mut self, start: usize) {
        if self.match_char('/') {
            while let Some(c) = self.peek() {
                if matches!(c, '\n' | '\u{2028}' | '\u{2029}') {
                    break;
                }
                self.advance();
            }
        } else if self.match_char('*') {
            self.scan_block_comment(start);
        } else if !self.previous_ends_operand() {
            self.skip_regex_body();
            self.unsupported("Regular expression literals are not supported", start);
        } else if self.match_char('=') {
            self.add_op(OperatorId::SlashEq, start);
        } else {
            self.add_op(OperatorId::Slash, start);
        }
    }

    fn scan_block_comment(&mut self, start: usize) {
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return;
                }
                Some('\n' | '\u{2028}' | '\u{2029}') => self.newline_pending = true,
                Some(_) => {}
                None => {
                    self.error("Unterminated block comment", start);
                    return;
                }
            }
        }
    }

    /// Skip to the closing `/` and flags of a regex literal so one error is reported, not a cascade.
    fn skip_regex_body(&mut self) {
        let mut in_class = false;
        while let Some(c) = self.peek() {
            match c {
                '\n' => return,
                '\\' => {
                    self.advance();
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => {
                    self.advance();
                    self.consume_ident_tail();
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Return `true` if the last token can end an operand, making a following `/` a division.
    fn previous_ends_operand(&self) -> bool {
        match self.tokens.last().map(|t| &t.kind) {
            Some(TokenKind::Ident(_) | TokenKind::Number(_) | TokenKind::String(_) | TokenKind::Template(_)) => {
                true
            }
            Some(TokenKind::Keyword(k)) => matches!(
                k,
                KeywordId::This | KeywordId::Super | KeywordId::True | KeywordId::False | KeywordId::Null
            ),
            Some(TokenKind::Punctuation(p)) => {
                matches!(p, PunctuationId::RParen | PunctuationId::RBracket | PunctuationId::RBrace)
            }
            Some(TokenKind::Operator(o)) => matches!(o, OperatorId::PlusPlus | OperatorId::MinusMinus),
            Some(TokenKind::Eof) | None => false,
        }
    }

    /// Emit a bracket token and track bracket depth.
    fn open_bracket(&mut self, kind: PunctuationId, start: usize) {
        self.bracket_depth += 1;
        self.add_punct(kind, start);
    }

    /// Emit a closing bracket token and decrement bracket depth.
    /// Produces an error if there's no matching opening bracket.
    fn close_bracket(&mut self, kind: PunctuationId, start: usize) {
        if self.bracket_depth == 0 {
            self.errors.push(CompileError::syntax(
                "Unmatched closing bracket".to_string(),
                self.span_from(start),
            ));
        } else {
            self.bracket_depth -= 1;
        }
        self.add_punct(kind, start);
    }

    // ========================================================================
    // Identifier scanning
    // ========================================================================

    fn consume_ident_tail(&mut self) {
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn scan_identifier(&mut self, start: usize) {
        self.consume_ident_tail();
        let spelling = &self.source[start..self.current_pos];

        // Look up identifier spelling in the reserved-word registry (no allocation for keywords).
        if let Some(id) = keyword_id(spelling) {
            self.add_token(TokenKind::Keyword(id), start);
        } else {
            let name = spelling.to_string();
            self.add_token(TokenKind::Ident(name), start);
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Check if a character can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

/// Check if a character can continue an identifier.
fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Convenience function to lex a source string.
///
/// This is a shorthand for `Lexer::new(source).tokenize()`.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<CompileError>> {
    Lexer::new(source).tokenize()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .unwrap_or_else(|errs| panic!("lex({source:?}) failed: {errs:?}"))
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_punctuation_registry_parity() {
        use proctor_core::lang::punctuation;

        for p in punctuation::PUNCTUATION {
            let source = match p.id {
                PunctuationId::LParen | PunctuationId::RParen => "()",
                PunctuationId::LBracket | PunctuationId::RBracket => "[]",
                PunctuationId::LBrace | PunctuationId::RBrace => "{}",
                _ => p.canonical,
            };
            let tokens = lex(source).unwrap_or_else(|errs| panic!("lex({source:?}) failed: {errs:?}"));
            assert!(
                tokens.iter().any(|t| t.kind.is_punctuation(p.id)),
                "lex({source:?}) did not produce {:?}: {tokens:?}",
                p.id
            );
        }
    }

    #[test]
    fn test_keyword_registry_parity() {
        use proctor_core::lang::keywords;

        for k in keywords::KEYWORDS {
            let tokens = lex(k.canonical).unwrap_or_else(|errs| panic!("lex({:?}) failed: {:?}", k.canonical, errs));
            assert_eq!(tokens.len(), 2, "expected token + EOF for keyword {:?}, got {:?}", k.id, tokens);
            assert!(tokens[0].kind.is_keyword(k.id));
        }
    }

    #[test]
    fn test_operator_registry_parity() {
        use proctor_core::lang::operators;

        for o in operators::OPERATORS {
            for &spelling in o.spellings {
                // Prefix the spelling with an operand so `/` is division, not a regex.
                let source = format!("a {spelling} b");
                let tokens = lex(&source).unwrap_or_else(|errs| panic!("lex({source:?}) failed: {errs:?}"));
                assert_eq!(tokens.len(), 4, "expected a, op, b, EOF for {spelling:?}: {tokens:?}");
                if o.is_keyword_spelling {
                    assert!(tokens[1].kind.keyword_id().is_some(), "{spelling:?} should lex as keyword");
                } else {
                    assert!(tokens[1].kind.is_operator(o.id), "{spelling:?} lexed as {:?}", tokens[1].kind);
                }
            }
        }
    }

    #[test]
    fn test_newline_before_flag() {
        let tokens = lex("a\nb c /* x\n */ d").unwrap();
        let flags: Vec<bool> = tokens.iter().map(|t| t.newline_before).collect();
        assert_eq!(flags, vec![false, true, false, true, false]);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("x // trailing\n/* block */ y"),
            vec![TokenKind::Ident("x".into()), TokenKind::Ident("y".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_optional_chain_vs_conditional_number() {
        let ks = kinds("a?.b");
        assert!(ks[1].is_punctuation(PunctuationId::QuestionDot));
        let ks = kinds("a?.5:1");
        assert!(ks[1].is_punctuation(PunctuationId::Question));
        assert_eq!(ks[2], TokenKind::Number(0.5));
    }

    #[test]
    fn test_dollar_and_unicode_identifiers() {
        assert_eq!(
            kinds("$el _x café"),
            vec![
                TokenKind::Ident("$el".into()),
                TokenKind::Ident("_x".into()),
                TokenKind::Ident("café".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_regex_literal_is_unsupported() {
        let errs = lex("const r = /ab+c/gi;").unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("Regular expression"));
        assert_eq!(errs[0].kind, crate::diagnostics::ErrorKind::Unsupported);
    }

    #[test]
    fn test_division_after_operand() {
        let ks = kinds("(a) / 2");
        assert!(ks[3].is_operator(OperatorId::Slash));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let errs = lex("a /* never closed").unwrap_err();
        assert!(errs[0].message.contains("Unterminated block comment"));
    }

    #[test]
    fn test_unmatched_closing_bracket() {
        let errs = lex("a)").unwrap_err();
        assert_eq!(errs[0].message, "Unmatched closing bracket");
        assert_eq!(errs[0].span, Span::new(1, 2));
    }

    #[test]
    fn test_offset_lexer_shifts_spans() {
        let tokens = Lexer::with_offset("x", 10).tokenize().unwrap();
        assert_eq!(tokens[0].span, Span::new(10, 11));
    }
}
