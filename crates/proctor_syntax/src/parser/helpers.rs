/// Token-stream helpers and error recovery.
///
/// This chunk contains the low-level primitives used throughout parsing:
/// - Peeking/consuming tokens (`peek`, `advance`)
/// - Matching / expecting keywords, operators, and punctuation
/// - Automatic semicolon insertion (`consume_semicolon`)
/// - Error recovery (`synchronize`)
impl<'a> Parser<'a> {
    // ========================================================================
    // Helpers
    // ========================================================================

    /// Return `true` if the current token is [`TokenKind::Eof`].
    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    /// Return the current token without consuming it.
    fn peek(&self) -> &'a Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Return the token `n` positions ahead without consuming anything.
    fn peek_at(&self, n: usize) -> &'a Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    /// Advance to the next token and return the token we just consumed.
    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    /// Return `true` if the current token is the given keyword.
    fn check_keyword(&self, id: KeywordId) -> bool {
        self.peek().kind.is_keyword(id)
    }

    /// Return `true` if the current token is the given punctuation.
    fn check_punct(&self, id: PunctuationId) -> bool {
        self.peek().kind.is_punctuation(id)
    }

    /// Return `true` if the current token is the given operator.
    fn check_op(&self, id: OperatorId) -> bool {
        self.peek().kind.is_operator(id)
    }

    fn match_keyword(&mut self, id: KeywordId) -> bool {
        if self.check_keyword(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_punct(&mut self, id: PunctuationId) -> bool {
        if self.check_punct(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_op(&mut self, id: OperatorId) -> bool {
        if self.check_op(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, id: KeywordId, msg: &str) -> Result<&'a Token, CompileError> {
        if self.check_keyword(id) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(msg))
        }
    }

    fn expect_punct(&mut self, id: PunctuationId, msg: &str) -> Result<&'a Token, CompileError> {
        if self.check_punct(id) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(msg))
        }
    }

    /// Consume a statement terminator, inserting one where the script grammar allows.
    ///
    /// A `;` is implied before `}`, at end of input, and before a token that starts a new line.
    fn consume_semicolon(&mut self) -> Result<(), CompileError> {
        if self.match_punct(PunctuationId::Semicolon) {
            return Ok(());
        }
        if self.check_punct(PunctuationId::RBrace) || self.is_at_end() || self.peek().newline_before {
            return Ok(());
        }
        Err(self.unexpected("Expected ';'"))
    }

    /// Build a syntax error at the current token: `"<msg>, found <token>"`.
    fn unexpected(&self, msg: &str) -> CompileError {
        CompileError::syntax(
            format!("{}, found {}", msg, self.peek().kind.describe()),
            self.current_span(),
        )
    }

    fn unsupported_here(&self, what: &str) -> CompileError {
        CompileError::unsupported(format!("{what} are not supported"), self.current_span())
    }

    /// Skip tokens until a likely statement boundary.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.tokens[self.pos - 1].kind.is_punctuation(PunctuationId::Semicolon) || self.peek().newline_before {
                return;
            }
            if let Some(
                KeywordId::Var
                | KeywordId::Let
                | KeywordId::Const
                | KeywordId::Function
                | KeywordId::Class
                | KeywordId::If
                | KeywordId::For
                | KeywordId::While
                | KeywordId::Return
                | KeywordId::Try
                | KeywordId::Throw
                | KeywordId::Switch,
            ) = self.peek().keyword_id()
            {
                return;
            }
            self.advance();
        }
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    /// End offset of the most recently consumed token.
    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn spanned<T>(&self, node: T, start: usize) -> Spanned<T> {
        Spanned::new(node, Span::new(start, self.prev_end()))
    }

    /// Run `f` one nesting level deeper, failing once [`MAX_NESTING`] is exceeded.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, CompileError>) -> Result<T, CompileError> {
        if self.depth >= MAX_NESTING {
            return Err(self.too_deep());
        }
        self.depth += 1;
        self.peak = self.peak.max(self.depth);
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn too_deep(&self) -> CompileError {
        CompileError::syntax("Code is nested too deeply".to_string(), self.current_span())
    }

    /// Run `f` and also return how many levels below the current depth its result reaches.
    fn measured<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<(T, usize), CompileError> {
        let saved = std::mem::replace(&mut self.peak, self.depth);
        let result = f(self);
        let height = self.peak.saturating_sub(self.depth);
        self.peak = self.peak.max(saved);
        result.map(|value| (value, height))
    }

    /// Record a node `height` levels below the current depth, failing past [`MAX_NESTING`].
    fn reach(&mut self, height: usize) -> Result<(), CompileError> {
        let level = self.depth + height;
        if level > MAX_NESTING {
            return Err(self.too_deep());
        }
        self.peak = self.peak.max(level);
        Ok(())
    }

    /// Run `f` with the `in` operator re-enabled (inside brackets, parens, and function bodies).
    fn allow_in<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, CompileError>) -> Result<T, CompileError> {
        let saved = std::mem::replace(&mut self.no_in, false);
        let result = f(self);
        self.no_in = saved;
        result
    }

    /// Run `f` with `in` treated as a terminator (the head of a `for` statement).
    fn forbid_in<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, CompileError>) -> Result<T, CompileError> {
        let saved = std::mem::replace(&mut self.no_in, true);
        let result = f(self);
        self.no_in = saved;
        result
    }

    fn identifier(&mut self) -> Result<Ident, CompileError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name.clone())
            }
            _ => Err(self.unexpected("Expected identifier")),
        }
    }

    /// Parse a property name after `.` (identifiers and keywords).
    fn property_name(&mut self) -> Result<Ident, CompileError> {
        match self.peek().kind.property_name() {
            Some(name) => {
                let name = name.to_string();
                self.advance();
                Ok(name)
            }
            None => Err(self.unexpected("Expected property name")),
        }
    }

    /// Parse an object/class property key: `name`, `"str"`, `42`, or `[computed]`.
    fn property_key(&mut self) -> Result<PropKey, CompileError> {
        let token = self.peek();
        match &token.kind {
            TokenKind::String(s) => {
                self.advance();
                Ok(PropKey::Named(s.clone()))
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(PropKey::Named(number_to_string(*n)))
            }
            TokenKind::Punctuation(PunctuationId::LBracket) => {
                self.advance();
                let expr = self.allow_in(|p| p.assignment_expr())?;
                self.expect_punct(PunctuationId::RBracket, "Expected ']' after computed key")?;
                Ok(PropKey::Computed(Box::new(expr)))
            }
            _ => self.property_name().map(PropKey::Named),
        }
    }

    /// Return `true` if the current token can begin a property key (used to spot `get x()` / `set x(v)`).
    fn at_property_key_start(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Ident(_) | TokenKind::Keyword(_) | TokenKind::String(_) | TokenKind::Number(_)
        ) || self.check_punct(PunctuationId::LBracket)
    }
}
