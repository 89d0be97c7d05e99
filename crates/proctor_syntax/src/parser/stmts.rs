/// Statement parsing methods.
///
/// This chunk parses statement forms (`if`, loops, `switch`, `try`, declarations, ...) and blocks.
///
/// ## Notes
/// - Statement terminators go through `consume_semicolon`, which implements automatic semicolon insertion.
/// - `return` is accepted at the top level: learner and test sources are evaluated as function bodies.
impl<'a> Parser<'a> {
    // ========================================================================
    // Statements
    // ========================================================================

    fn block(&mut self) -> Result<Vec<Spanned<Stmt>>, CompileError> {
        self.expect_punct(PunctuationId::LBrace, "Expected '{'")?;
        let mut stmts = Vec::new();
        while !self.check_punct(PunctuationId::RBrace) && !self.is_at_end() {
            stmts.push(self.statement()?);
        }
        self.expect_punct(PunctuationId::RBrace, "Expected '}' to close block")?;
        Ok(stmts)
    }

    fn statement(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        self.nested(|p| p.statement_inner())
    }

    fn statement_inner(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        let start = self.current_span().start;
        let token = self.peek();

        let stmt = match &token.kind {
            TokenKind::Punctuation(PunctuationId::LBrace) => Stmt::Block(self.block()?),
            TokenKind::Punctuation(PunctuationId::Semicolon) => {
                self.advance();
                Stmt::Empty
            }
            TokenKind::Keyword(KeywordId::Var | KeywordId::Let | KeywordId::Const) => {
                let decl = self.var_decl()?;
                self.consume_semicolon()?;
                Stmt::VarDecl(decl)
            }
            TokenKind::Keyword(KeywordId::Function) => Stmt::Function(self.function_declaration()?),
            TokenKind::Keyword(KeywordId::Class) => Stmt::Class(self.class_definition(true)?),
            TokenKind::Keyword(KeywordId::If) => self.if_stmt()?,
            TokenKind::Keyword(KeywordId::For) => self.for_stmt()?,
            TokenKind::Keyword(KeywordId::While) => self.while_stmt()?,
            TokenKind::Keyword(KeywordId::Do) => self.do_while_stmt()?,
            TokenKind::Keyword(KeywordId::Return) => self.return_stmt()?,
            TokenKind::Keyword(KeywordId::Break) => {
                self.advance();
                let label = self.optional_label()?;
                self.consume_semicolon()?;
                Stmt::Break(label)
            }
            TokenKind::Keyword(KeywordId::Continue) => {
                self.advance();
                let label = self.optional_label()?;
                self.consume_semicolon()?;
                Stmt::Continue(label)
            }
            TokenKind::Keyword(KeywordId::Throw) => self.throw_stmt()?,
            TokenKind::Keyword(KeywordId::Try) => self.try_stmt()?,
            TokenKind::Keyword(KeywordId::Switch) => self.switch_stmt()?,
            TokenKind::Keyword(KeywordId::Debugger) => {
                self.advance();
                self.consume_semicolon()?;
                Stmt::Empty
            }
            TokenKind::Keyword(KeywordId::Import | KeywordId::Export) => {
                return Err(self
                    .unsupported_here("Module declarations (import/export)")
                    .with_hint("assign to `module.exports` instead"));
            }
            TokenKind::Keyword(KeywordId::With) => return Err(self.unsupported_here("`with` statements")),
            TokenKind::Ident(label) if self.peek_at(1).kind.is_punctuation(PunctuationId::Colon) => {
                self.advance();
                self.advance();
                let body = self.statement()?;
                Stmt::Labeled {
                    label: label.clone(),
                    body: Box::new(body),
                }
            }
            _ => {
                let expr = self.expression()?;
                self.consume_semicolon()?;
                Stmt::Expr(expr)
            }
        };

        Ok(self.spanned(stmt, start))
    }

    fn optional_label(&mut self) -> Result<Option<Ident>, CompileError> {
        if matches!(self.peek().kind, TokenKind::Ident(_)) && !self.peek().newline_before {
            return self.identifier().map(Some);
        }
        Ok(None)
    }

    fn decl_kind(&mut self) -> Result<DeclKind, CompileError> {
        let kind = match self.peek().keyword_id() {
            Some(KeywordId::Var) => DeclKind::Var,
            Some(KeywordId::Let) => DeclKind::Let,
            Some(KeywordId::Const) => DeclKind::Const,
            _ => return Err(self.unexpected("Expected 'var', 'let' or 'const'")),
        };
        self.advance();
        Ok(kind)
    }

    fn var_decl(&mut self) -> Result<VarDecl, CompileError> {
        let kind = self.decl_kind()?;
        let first = self.binding_target()?;
        self.var_decl_rest(kind, first)
    }

    /// Parse the remainder of a declaration list once the kind and first target are known.
    fn var_decl_rest(&mut self, kind: DeclKind, first: Spanned<Pattern>) -> Result<VarDecl, CompileError> {
        let mut declarations = Vec::new();
        let mut target = first;
        loop {
            let init = if self.match_op(OperatorId::Eq) {
                Some(self.assignment_expr()?)
            } else {
                None
            };
            if init.is_none() {
                if kind == DeclKind::Const {
                    return Err(CompileError::syntax(
                        "Missing initializer in const declaration".to_string(),
                        target.span,
                    ));
                }
                if !matches!(target.node, Pattern::Ident(_)) {
                    return Err(CompileError::syntax(
                        "Missing initializer in destructuring declaration".to_string(),
                        target.span,
                    ));
                }
            }
            declarations.push(VarDeclarator { target, init });
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
            target = self.binding_target()?;
        }
        Ok(VarDecl { kind, declarations })
    }

    fn if_stmt(&mut self) -> Result<Stmt, CompileError> {
        self.advance();
        let test = self.paren_condition("if")?;
        let consequent = Box::new(self.statement()?);
        let alternate = if self.match_keyword(KeywordId::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            test,
            consequent,
            alternate,
        })
    }

    fn paren_condition(&mut self, context: &str) -> Result<Spanned<Expr>, CompileError> {
        self.expect_punct(PunctuationId::LParen, &format!("Expected '(' after '{context}'"))?;
        let test = self.allow_in(|p| p.expression())?;
        self.expect_punct(PunctuationId::RParen, "Expected ')' after condition")?;
        Ok(test)
    }

    fn while_stmt(&mut self) -> Result<Stmt, CompileError> {
        self.advance();
        let test = self.paren_condition("while")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { test, body })
    }

    fn do_while_stmt(&mut self) -> Result<Stmt, CompileError> {
        self.advance();
        let body = Box::new(self.statement()?);
        self.expect_keyword(KeywordId::While, "Expected 'while' after do-block")?;
        let test = self.paren_condition("while")?;
        // The `;` after `do ... while (x)` is always optional.
        self.match_punct(PunctuationId::Semicolon);
        Ok(Stmt::DoWhile { body, test })
    }

    fn for_stmt(&mut self) -> Result<Stmt, CompileError> {
        self.advance();
        if self.check_keyword(KeywordId::Await) {
            return Err(self.unsupported_here("`for await` loops"));
        }
        self.expect_punct(PunctuationId::LParen, "Expected '(' after 'for'")?;

        let init = if self.check_punct(PunctuationId::Semicolon) {
            None
        } else if matches!(
            self.peek().keyword_id(),
            Some(KeywordId::Var | KeywordId::Let | KeywordId::Const)
        ) {
            let kind = self.decl_kind()?;
            let target = self.binding_target()?;
            if let Some(iteration) = self.for_iteration_head(Some(kind), target.clone())? {
                return Ok(iteration);
            }
            Some(ForInit::VarDecl(self.forbid_in(|p| p.var_decl_rest(kind, target))?))
        } else {
            let expr = self.forbid_in(|p| p.expression())?;
            if self.peek().is_ident("of") || self.check_keyword(KeywordId::In) {
                let target = self.expr_to_pattern(expr)?;
                return self
                    .for_iteration_head(None, target)?
                    .ok_or_else(|| self.unexpected("Expected 'of' or 'in'"));
            }
            Some(ForInit::Expr(expr))
        };

        self.expect_punct(PunctuationId::Semicolon, "Expected ';' after for-loop initializer")?;
        let test = if self.check_punct(PunctuationId::Semicolon) {
            None
        } else {
            Some(self.allow_in(|p| p.expression())?)
        };
        self.expect_punct(PunctuationId::Semicolon, "Expected ';' after for-loop condition")?;
        let update = if self.check_punct(PunctuationId::RParen) {
            None
        } else {
            Some(self.allow_in(|p| p.expression())?)
        };
        self.expect_punct(PunctuationId::RParen, "Expected ')' after for-loop clauses")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::For {
            init,
            test,
            update,
            body,
        })
    }

    /// If the next token is `of` or `in`, parse the rest of a `for-of`/`for-in` loop.
    fn for_iteration_head(
        &mut self,
        kind: Option<DeclKind>,
        target: Spanned<Pattern>,
    ) -> Result<Option<Stmt>, CompileError> {
        let is_of = self.peek().is_ident("of");
        if !is_of && !self.check_keyword(KeywordId::In) {
            return Ok(None);
        }
        self.advance();
        let subject = if is_of {
            self.allow_in(|p| p.assignment_expr())?
        } else {
            self.allow_in(|p| p.expression())?
        };
        self.expect_punct(PunctuationId::RParen, "Expected ')' after for-loop head")?;
        let body = Box::new(self.statement()?);
        let binding = ForBinding { kind, target };
        Ok(Some(if is_of {
            Stmt::ForOf {
                binding,
                iterable: subject,
                body,
            }
        } else {
            Stmt::ForIn {
                binding,
                object: subject,
                body,
            }
        }))
    }

    fn return_stmt(&mut self) -> Result<Stmt, CompileError> {
        self.advance();
        let value = if self.check_punct(PunctuationId::Semicolon)
            || self.check_punct(PunctuationId::RBrace)
            || self.is_at_end()
            || self.peek().newline_before
        {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume_semicolon()?;
        Ok(Stmt::Return(value))
    }

    fn throw_stmt(&mut self) -> Result<Stmt, CompileError> {
        self.advance();
        if self.peek().newline_before {
            return Err(CompileError::syntax(
                "Illegal newline after throw".to_string(),
                self.current_span(),
            ));
        }
        let value = self.expression()?;
        self.consume_semicolon()?;
        Ok(Stmt::Throw(value))
    }

    fn try_stmt(&mut self) -> Result<Stmt, CompileError> {
        let start = self.advance().span;
        let block = self.block()?;
        let handler = if self.match_keyword(KeywordId::Catch) {
            let param = if self.match_punct(PunctuationId::LParen) {
                let param = self.binding_target()?;
                self.expect_punct(PunctuationId::RParen, "Expected ')' after catch parameter")?;
                Some(param)
            } else {
                None
            };
            let body = self.block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };
        let finalizer = if self.match_keyword(KeywordId::Finally) {
            Some(self.block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(CompileError::syntax(
                "Missing catch or finally after try".to_string(),
                start,
            ));
        }
        Ok(Stmt::Try {
            block,
            handler,
            finalizer,
        })
    }

    fn switch_stmt(&mut self) -> Result<Stmt, CompileError> {
        self.advance();
        let discriminant = self.paren_condition("switch")?;
        self.expect_punct(PunctuationId::LBrace, "Expected '{' after switch")?;
        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.check_punct(PunctuationId::RBrace) && !self.is_at_end() {
            let test = if self.match_keyword(KeywordId::Case) {
                Some(self.expression()?)
            } else if self.check_keyword(KeywordId::Default) {
                if seen_default {
                    return Err(CompileError::syntax(
                        "More than one default clause in switch statement".to_string(),
                        self.current_span(),
                    ));
                }
                self.advance();
                seen_default = true;
                None
            } else {
                return Err(self.unexpected("Expected 'case' or 'default'"));
            };
            self.expect_punct(PunctuationId::Colon, "Expected ':' after case")?;
            let mut body = Vec::new();
            while !self.check_keyword(KeywordId::Case)
                && !self.check_keyword(KeywordId::Default)
                && !self.check_punct(PunctuationId::RBrace)
                && !self.is_at_end()
            {
                body.push(self.statement()?);
            }
            cases.push(SwitchCase { test, body });
        }
        self.expect_punct(PunctuationId::RBrace, "Expected '}' to close switch")?;
        Ok(Stmt::Switch { discriminant, cases })
    }
}
