//! String and template literal scanning.
//!
//! Template substitutions are not tokenized here: the raw text between `${` and its matching `}` is stored in
//! a [`TemplateChunk::Expr`] with its absolute offset, and the parser lexes it with [`Lexer::with_offset`].

use super::{Lexer, TemplateChunk, TokenKind};

impl<'a> Lexer<'a> {
    /// Scan a `'...'` or `"..."` literal; the opening quote has been consumed.
    pub(super) fn scan_string(&mut self, start: usize, quote: char) {
        let mut value = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => {
                    self.add_token(TokenKind::String(value), start);
                    return;
                }
                Some('\\') => {
                    if let Some(decoded) = self.scan_escape(start) {
                        value.push_str(&decoded);
                    }
                }
                Some('\n') | None => {
                    self.error("Unterminated string literal", start);
                    return;
                }
                Some(c) => value.push(c),
            }
        }
    }

    /// Scan a template literal; the opening backtick has been consumed.
    pub(super) fn scan_template(&mut self, start: usize) {
        let mut chunks = Vec::new();
        let mut literal = String::new();
        loop {
            match self.advance() {
                Some('`') => break,
                Some('\\') => {
                    if let Some(decoded) = self.scan_escape(start) {
                        literal.push_str(&decoded);
                    }
                }
                Some('$') if self.peek() == Some('{') => {
                    self.advance();
                    if !literal.is_empty() {
                        chunks.push(TemplateChunk::Literal(std::mem::take(&mut literal)));
                    }
                    let expr_start = self.current_pos;
                    if !self.skip_balanced_substitution() {
                        self.error("Unterminated template substitution", start);
                        return;
                    }
                    // `current_pos` is just past the closing `}`.
                    let source = self.source[expr_start..self.current_pos - 1].to_string();
                    if source.trim().is_empty() {
                        self.error("Empty template substitution", start);
                    }
                    chunks.push(TemplateChunk::Expr {
                        source,
                        offset: self.base_offset + expr_start,
                    });
                }
                Some('\r') => {
                    if self.peek() == Some('\n') {
                        self.advance();
                    }
                    literal.push('\n');
                }
                Some(c) => literal.push(c),
                None => {
                    self.error("Unterminated template literal", start);
                    return;
                }
            }
        }
        if !literal.is_empty() || chunks.is_empty() {
            chunks.push(TemplateChunk::Literal(literal));
        }
        self.add_token(TokenKind::Template(chunks), start);
    }

    /// Advance past a `${ ... }` body up to and including its closing brace.
    ///
    /// Nested braces, strings, templates and comments inside the substitution are skipped so that a `}` inside
    /// them does not end the substitution early.
    fn skip_balanced_substitution(&mut self) -> bool {
        let mut depth = 0usize;
        while let Some(c) = self.advance() {
            match c {
                '{' => depth += 1,
                '}' if depth == 0 => return true,
                '}' => depth -= 1,
                '"' | '\'' => self.skip_quoted(c),
                '`' => {
                    if !self.skip_nested_template() {
                        return false;
                    }
                }
                '/' if self.peek() == Some('/') => {
                    while let Some(n) = self.peek() {
                        if n == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                '/' if self.peek() == Some('*') => {
                    self.advance();
                    while let Some(n) = self.advance() {
                        if n == '*' && self.peek() == Some('/') {
                            self.advance();
                            break;
                        }
                    }
                }
                _ => {}
            }
        }
        false
    }

    fn skip_quoted(&mut self, quote: char) {
        while let Some(c) = self.advance() {
            match c {
                '\\' => {
                    self.advance();
                }
                '\n' => return,
                c if c == quote => return,
                _ => {}
            }
        }
    }

    fn skip_nested_template(&mut self) -> bool {
        while let Some(c) = self.advance() {
            match c {
                '\\' => {
                    self.advance();
                }
                '`' => return true,
                '$' if self.peek() == Some('{') => {
                    self.advance();
                    if !self.skip_balanced_substitution() {
                        return false;
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// Decode one escape sequence; the backslash has been consumed.
    ///
    /// Returns `None` for a line continuation or after reporting an invalid escape.
    fn scan_escape(&mut self, literal_start: usize) -> Option<String> {
        let escape_start = self.current_pos - 1;
        let c = self.advance()?;
        let decoded = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{0008}',
            'f' => '\u{000C}',
            'v' => '\u{000B}',
            '0' if !self.peek().is_some_and(|d| d.is_ascii_digit()) => '\0',
            'x' => {
                let code = self.read_hex_digits(2, escape_start)?;
                return char::from_u32(code).map(String::from);
            }
            'u' => return self.scan_unicode_escape(escape_start),
            '\r' => {
                if self.peek() == Some('\n') {
                    self.advance();
                }
                return None;
            }
            '\n' | '\u{2028}' | '\u{2029}' => return None,
            '1'..='9' | '0' => {
                self.error("Octal escape sequences are not allowed", literal_start);
                return None;
            }
            other => other,
        };
        Some(decoded.to_string())
    }

    fn scan_unicode_escape(&mut self, escape_start: usize) -> Option<String> {
        if self.match_char('{') {
            let mut code = 0u32;
            let mut digits = 0;
            while let Some(c) = self.peek() {
                if c == '}' {
                    break;
                }
                match c.to_digit(16) {
                    Some(d) if code <= 0x10FFFF => {
                        code = code * 16 + d;
                        digits += 1;
                        self.advance();
                    }
                    _ => break,
                }
            }
            if digits == 0 || !self.match_char('}') || code > 0x10FFFF {
                self.error("Invalid Unicode escape sequence", escape_start);
                return None;
            }
            return char::from_u32(code).map(String::from).or(Some("\u{FFFD}".to_string()));
        }

        let high = self.read_hex_digits(4, escape_start)?;
        if (0xD800..0xDC00).contains(&high) && self.source[self.current_pos..].starts_with("\\u") {
            // Surrogate pair spelled as two escapes: `\uD83D\uDE00`.
            let rest = &self.source[self.current_pos + 2..];
            let low = rest.get(..4).and_then(|h| u32::from_str_radix(h, 16).ok());
            if let Some(low) = low.filter(|l| (0xDC00..0xE000).contains(l)) {
                self.match_str("\\u");
                for _ in 0..4 {
                    self.advance();
                }
                let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(combined).map(String::from);
            }
        }
        Some(char::from_u32(high).map(String::from).unwrap_or_else(|| "\u{FFFD}".to_string()))
    }

    fn read_hex_digits(&mut self, count: usize, escape_start: usize) -> Option<u32> {
        let mut code = 0u32;
        for _ in 0..count {
            match self.peek().and_then(|c| c.to_digit(16)) {
                Some(d) => {
                    code = code * 16 + d;
                    self.advance();
                }
                None => {
                    self.error("Invalid hexadecimal escape sequence", escape_start);
                    return None;
                }
            }
        }
        Some(code)
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::{TemplateChunk, TokenKind, lex};

    fn string(source: &str) -> String {
        match &lex(source).unwrap()[0].kind {
            TokenKind::String(s) => s.clone(),
            other => panic!("expected string, got {other:?}"),
        }
    }

    fn template(source: &str) -> Vec<TemplateChunk> {
        match &lex(source).unwrap()[0].kind {
            TokenKind::Template(parts) => parts.clone(),
            other => panic!("expected template, got {other:?}"),
        }
    }

    #[test]
    fn test_simple_escapes() {
        assert_eq!(string(r#""a\nb\t\"q\"""#), "a\nb\t\"q\"");
        assert_eq!(string(r"'it\'s'"), "it's");
        assert_eq!(string(r"'\x41B\u{43}'"), "ABC");
        assert_eq!(string(r"'\uD83D\uDE00'"), "😀");
        assert_eq!(string("'a\\\nb'"), "ab");
    }

    #[test]
    fn test_unterminated_string() {
        let errs = lex("'abc\n'").unwrap_err();
        assert!(errs[0].message.contains("Unterminated string literal"));
    }

    #[test]
    fn test_template_chunks() {
        let parts = template("`Hello, ${name}!`");
        assert_eq!(
            parts,
            vec![
                TemplateChunk::Literal("Hello, ".into()),
                TemplateChunk::Expr {
                    source: "name".into(),
                    offset: 10
                },
                TemplateChunk::Literal("!".into()),
            ]
        );
    }

    #[test]
    fn test_template_nested_braces_and_strings() {
        let parts = template("`${ {a: '}'}.a }${`in ${x}`}`");
        match &parts[..] {
            [TemplateChunk::Expr { source: a, .. }, TemplateChunk::Expr { source: b, .. }] => {
                assert_eq!(a, " {a: '}'}.a ");
                assert_eq!(b, "`in ${x}`");
            }
            other => panic!("unexpected chunks {other:?}"),
        }
    }

    #[test]
    fn test_empty_template_is_single_literal() {
        assert_eq!(template("``"), vec![TemplateChunk::Literal(String::new())]);
    }

    #[test]
    fn test_unterminated_template() {
        assert!(lex("`abc").unwrap_err()[0].message.contains("Unterminated template"));
        assert!(lex("`${abc`").unwrap_err()[0].message.contains("Unterminated template"));
    }
}
