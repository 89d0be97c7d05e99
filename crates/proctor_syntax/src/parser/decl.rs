/// Function and class parsing.
///
/// This chunk parses `function` declarations/expressions, arrow functions, methods, and class bodies.
impl<'a> Parser<'a> {
    // ========================================================================
    // Functions
    // ========================================================================

    fn function_declaration(&mut self) -> Result<Rc<FunctionDef>, CompileError> {
        let start = self.advance().span.start;
        self.reject_generator_star()?;
        let name = self.identifier()?;
        self.function_rest(Some(name), FunctionKind::Normal, start).map(Rc::new)
    }

    fn function_expression(&mut self) -> Result<Rc<FunctionDef>, CompileError> {
        let start = self.advance().span.start;
        self.reject_generator_star()?;
        let name = if matches!(self.peek().kind, TokenKind::Ident(_)) {
            Some(self.identifier()?)
        } else {
            None
        };
        self.function_rest(name, FunctionKind::Normal, start).map(Rc::new)
    }

    fn reject_generator_star(&self) -> Result<(), CompileError> {
        if self.check_op(OperatorId::Star) {
            return Err(self.unsupported_here("Generator functions"));
        }
        Ok(())
    }

    /// Parse `(params) { body }` for a function whose head has already been consumed.
    fn function_rest(
        &mut self,
        name: Option<Ident>,
        kind: FunctionKind,
        start: usize,
    ) -> Result<FunctionDef, CompileError> {
        let (params, rest) = self.formal_params()?;
        let body = self.allow_in(|p| p.block())?;
        Ok(FunctionDef {
            name,
            params,
            rest,
            body: FunctionBody::Block(body),
            kind,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn formal_params(&mut self) -> Result<(Vec<PatternElem>, Option<Spanned<Pattern>>), CompileError> {
        self.expect_punct(PunctuationId::LParen, "Expected '(' before parameters")?;
        let mut params = Vec::new();
        let mut rest = None;
        while !self.check_punct(PunctuationId::RParen) {
            if self.match_punct(PunctuationId::Ellipsis) {
                rest = Some(self.binding_target()?);
                if !self.check_punct(PunctuationId::RParen) {
                    return Err(self.unexpected("Rest parameter must be last"));
                }
                break;
            }
            params.push(self.allow_in(|p| p.binding_element())?);
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(PunctuationId::RParen, "Expected ')' after parameters")?;
        Ok((params, rest))
    }

    /// Return `true` if the tokens at the cursor begin an arrow function (`x =>` or `(...) =>`).
    fn at_arrow_function(&self) -> bool {
        match &self.peek().kind {
            TokenKind::Ident(_) => {
                let next = self.peek_at(1);
                next.kind.is_punctuation(PunctuationId::FatArrow) && !next.newline_before
            }
            TokenKind::Punctuation(PunctuationId::LParen) => {
                let mut depth = 0usize;
                let mut i = self.pos;
                while i < self.tokens.len() {
                    match self.tokens[i].punctuation_id() {
                        Some(PunctuationId::LParen | PunctuationId::LBracket | PunctuationId::LBrace) => depth += 1,
                        Some(PunctuationId::RParen | PunctuationId::RBracket | PunctuationId::RBrace) => {
                            depth = depth.saturating_sub(1);
                            if depth == 0 {
                                return self.tokens.get(i + 1).is_some_and(|t| {
                                    t.kind.is_punctuation(PunctuationId::FatArrow) && !t.newline_before
                                });
                            }
                        }
                        _ => {}
                    }
                    if matches!(self.tokens[i].kind, TokenKind::Eof) {
                        return false;
                    }
                    i += 1;
                }
                false
            }
            _ => false,
        }
    }

    fn arrow_function(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.current_span().start;
        let (params, rest) = if let TokenKind::Ident(name) = &self.peek().kind {
            let span = self.advance().span;
            (
                vec![PatternElem {
                    target: Spanned::new(Pattern::Ident(name.clone()), span),
                    default: None,
                }],
                None,
            )
        } else {
            self.formal_params()?
        };
        self.expect_punct(PunctuationId::FatArrow, "Expected '=>'")?;
        let body = if self.check_punct(PunctuationId::LBrace) {
            FunctionBody::Block(self.allow_in(|p| p.block())?)
        } else {
            FunctionBody::Expr(Box::new(self.assignment_expr()?))
        };
        let function = FunctionDef {
            name: None,
            params,
            rest,
            body,
            kind: FunctionKind::Arrow,
            span: Span::new(start, self.prev_end()),
        };
        Ok(self.spanned(Expr::Function(Rc::new(function)), start))
    }

    /// Parse a method body after its key; `name` becomes the function's `name`.
    fn method_definition(
        &mut self,
        key: &PropKey,
        kind: FunctionKind,
        start: usize,
    ) -> Result<Rc<FunctionDef>, CompileError> {
        let name = match key {
            PropKey::Named(name) => Some(name.clone()),
            PropKey::Computed(_) => None,
        };
        self.function_rest(name, kind, start).map(Rc::new)
    }

    /// Reject `get x()`, `set x(v)`, `async m()` and `*m()` member forms.
    fn reject_unsupported_member_prefix(&self) -> Result<(), CompileError> {
        let token = self.peek();
        let followed_by_key = {
            let next = self.peek_at(1);
            matches!(
                next.kind,
                TokenKind::Ident(_) | TokenKind::Keyword(_) | TokenKind::String(_) | TokenKind::Number(_)
            ) || next.kind.is_punctuation(PunctuationId::LBracket)
        };
        if (token.is_ident("get") || token.is_ident("set")) && followed_by_key {
            return Err(self.unsupported_here("Getters and setters"));
        }
        if token.kind.is_keyword(KeywordId::Async) && followed_by_key {
            return Err(self.unsupported_here("Async functions"));
        }
        if token.kind.is_operator(OperatorId::Star) {
            return Err(self.unsupported_here("Generator methods"));
        }
        Ok(())
    }

    // ========================================================================
    // Classes
    // ========================================================================

    fn class_definition(&mut self, require_name: bool) -> Result<Rc<ClassDef>, CompileError> {
        let start = self.advance().span.start;
        let name = if matches!(self.peek().kind, TokenKind::Ident(_)) {
            Some(self.identifier()?)
        } else if require_name {
            return Err(self.unexpected("Expected class name"));
        } else {
            None
        };
        let superclass = if self.match_keyword(KeywordId::Extends) {
            Some(Box::new(self.call_member()?))
        } else {
            None
        };

        self.expect_punct(PunctuationId::LBrace, "Expected '{' to open class body")?;
        let mut constructor = None;
        let mut members = Vec::new();
        while !self.check_punct(PunctuationId::RBrace) && !self.is_at_end() {
            if self.match_punct(PunctuationId::Semicolon) {
                continue;
            }
            let member_start = self.current_span().start;
            let next = self.peek_at(1);
            let is_static = self.peek().is_ident("static")
                && !next.kind.is_punctuation(PunctuationId::LParen)
                && !next.kind.is_operator(OperatorId::Eq);
            if is_static {
                self.advance();
            }
            self.reject_unsupported_member_prefix()?;
            if self.check_punct(PunctuationId::LBrace) {
                return Err(self.unsupported_here("Static initialization blocks"));
            }

            let key_span = self.current_span();
            let key = self.property_key()?;
            if self.check_punct(PunctuationId::LParen) {
                let is_constructor = !is_static && matches!(&key, PropKey::Named(n) if n == "constructor");
                if is_constructor {
                    if constructor.is_some() {
                        return Err(CompileError::syntax(
                            "A class may only have one constructor".to_string(),
                            key_span,
                        ));
                    }
                    constructor = Some(self.method_definition(&key, FunctionKind::Constructor, member_start)?);
                } else {
                    let function = self.method_definition(&key, FunctionKind::Method, member_start)?;
                    members.push(ClassMember::Method {
                        key,
                        function,
                        is_static,
                    });
                }
            } else {
                let value = if self.match_op(OperatorId::Eq) {
                    Some(self.allow_in(|p| p.assignment_expr())?)
                } else {
                    None
                };
                self.consume_semicolon()?;
                members.push(ClassMember::Field { key, value, is_static });
            }
        }
        self.expect_punct(PunctuationId::RBrace, "Expected '}' to close class body")?;

        Ok(Rc::new(ClassDef {
            name,
            superclass,
            constructor,
            members,
            span: Span::new(start, self.prev_end()),
        }))
    }
}
