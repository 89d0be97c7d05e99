//! Numeric literal scanning.

use super::{Lexer, TokenKind, is_ident_start};

impl<'a> Lexer<'a> {
    /// Scan a numeric literal whose first character (`first`) has already been consumed.
    ///
    /// Accepts `123`, `1_000`, `1.5`, `.5`, `1e-3`, `0xff`, `0o17`, `0b1010`.
    pub(super) fn scan_number(&mut self, start: usize, first: char) {
        if first == '0' {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                self.scan_radix_number(start, radix);
                return;
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.consume_digits();
                self.error("Legacy octal literals are not allowed; remove the leading zero", start);
                return;
            }
        }

        if first != '.' {
            self.consume_digits();
            if self.peek() == Some('.') {
                self.advance();
                self.consume_digits();
            }
        } else {
            self.consume_digits();
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let after = self.peek_next();
            let signed = matches!(after, Some('+' | '-'));
            let has_digits = if signed {
                self.source[self.current_pos..].chars().nth(2).is_some_and(|c| c.is_ascii_digit())
            } else {
                after.is_some_and(|c| c.is_ascii_digit())
            };
            if has_digits {
                self.advance();
                if signed {
                    self.advance();
                }
                self.consume_digits();
            }
        }

        if self.check_literal_suffix(start) {
            return;
        }

        let text: String = self.source[start..self.current_pos].chars().filter(|c| *c != '_').collect();
        match text.parse::<f64>() {
            Ok(value) => self.add_token(TokenKind::Number(value), start),
            Err(_) => self.error(format!("Invalid number literal '{}'", text), start),
        }
    }

    fn scan_radix_number(&mut self, start: usize, radix: u32) {
        let digits_start = self.current_pos;
        while let Some(c) = self.peek() {
            if c.is_digit(radix) || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        if self.check_literal_suffix(start) {
            return;
        }
        let mut value = 0.0f64;
        let mut any = false;
        for c in self.source[digits_start..self.current_pos].chars() {
            if let Some(d) = c.to_digit(radix) {
                value = value * radix as f64 + d as f64;
                any = true;
            }
        }
        if any {
            self.add_token(TokenKind::Number(value), start);
        } else {
            self.error("Expected digits after numeric prefix", start);
        }
    }

    fn consume_digits(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Reject `10n` (BigInt) and `3in` (identifier glued to a number). Returns `true` if an error was reported.
    fn check_literal_suffix(&mut self, start: usize) -> bool {
        match self.peek() {
            Some('n') if !self.peek_next().is_some_and(super::is_ident_continue) => {
                self.advance();
                self.unsupported("BigInt literals are not supported", start);
                true
            }
            Some(c) if is_ident_start(c) || c.is_ascii_digit() => {
                self.consume_ident_tail();
                self.error("Identifier starts immediately after numeric literal", start);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::{TokenKind, lex};

    fn number(source: &str) -> f64 {
        match lex(source).unwrap()[0].kind {
            TokenKind::Number(n) => n,
            ref other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn test_decimal_forms() {
        assert_eq!(number("42"), 42.0);
        assert_eq!(number("1_000_000"), 1_000_000.0);
        assert_eq!(number("3.25"), 3.25);
        assert_eq!(number(".5"), 0.5);
        assert_eq!(number("1e3"), 1000.0);
        assert_eq!(number("2.5E-1"), 0.25);
        assert_eq!(number("0"), 0.0);
    }

    #[test]
    fn test_radix_forms() {
        assert_eq!(number("0xff"), 255.0);
        assert_eq!(number("0o17"), 15.0);
        assert_eq!(number("0b1010"), 10.0);
    }

    #[test]
    fn test_member_access_on_integer_literal() {
        // `1.toString()` is a syntax error in scripts, but `1..toString()` is a number then `.`.
        let tokens = lex("1..toString").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number(1.0));
    }

    #[test]
    fn test_bad_suffixes() {
        assert!(lex("10n").unwrap_err()[0].message.contains("BigInt"));
        assert!(lex("3in").unwrap_err()[0].message.contains("immediately after"));
        assert!(lex("012").unwrap_err()[0].message.contains("Legacy octal"));
    }
}
