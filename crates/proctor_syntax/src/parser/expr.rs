/// Expression parsing methods.
///
/// Precedence, lowest first:
/// sequence → assignment/arrow → conditional → binary (table-driven) → unary → postfix → call/member → primary
///
/// ## Notes
/// - Binary precedence and associativity come from `proctor_core::lang::operators`; the loop in
///   `binary_expr` is generic over that table.
impl<'a> Parser<'a> {
    // ========================================================================
    // Expressions
    // ========================================================================

    fn expression(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.current_span().start;
        let first = self.assignment_expr()?;
        if !self.check_punct(PunctuationId::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.match_punct(PunctuationId::Comma) {
            items.push(self.assignment_expr()?);
        }
        Ok(self.spanned(Expr::Sequence(items), start))
    }

    fn assignment_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        self.nested(|p| p.assignment_expr_inner())
    }

    fn assignment_expr_inner(&mut self) -> Result<Spanned<Expr>, CompileError> {
        if self.at_arrow_function() {
            return self.arrow_function();
        }
        if self.check_keyword(KeywordId::Async) && self.peek_at(1).kind.is_keyword(KeywordId::Function) {
            return Err(self.unsupported_here("Async functions"));
        }
        if self.check_keyword(KeywordId::Yield) {
            return Err(self.unsupported_here("`yield` expressions"));
        }

        let start = self.current_span().start;
        let lhs = self.conditional_expr()?;

        let Some(op_id) = self.peek().operator_id().filter(|id| operators::is_assignment(*id)) else {
            return Ok(lhs);
        };
        self.advance();
        let op = assign_op(op_id).ok_or_else(|| self.unexpected("Expected assignment operator"))?;
        let target = if op == AssignOp::Assign {
            self.expr_to_pattern(lhs)?
        } else {
            let target = self.simple_target(lhs, "assignment")?;
            let span = target.span;
            match target.node {
                Expr::Ident(name) => Spanned::new(Pattern::Ident(name), span),
                node => Spanned::new(Pattern::Member(Box::new(Spanned::new(node, span))), span),
            }
        };
        let value = self.assignment_expr()?;
        Ok(self.spanned(
            Expr::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            start,
        ))
    }

    fn conditional_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.current_span().start;
        let test = self.binary_expr(0)?;
        if !self.match_punct(PunctuationId::Question) {
            return Ok(test);
        }
        let consequent = self.allow_in(|p| p.assignment_expr())?;
        self.expect_punct(PunctuationId::Colon, "Expected ':' in conditional expression")?;
        let alternate = self.assignment_expr()?;
        Ok(self.spanned(
            Expr::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            start,
        ))
    }

    /// Return the binary operator at the cursor with its precedence, honoring `no_in`.
    fn peek_binary_op(&self) -> Option<(OperatorId, u8)> {
        let id = match &self.peek().kind {
            TokenKind::Operator(id) => *id,
            TokenKind::Keyword(KeywordId::Instanceof) => OperatorId::Instanceof,
            TokenKind::Keyword(KeywordId::In) if !self.no_in => OperatorId::In,
            _ => return None,
        };
        operators::binary_precedence(id).map(|prec| (id, prec))
    }

    /// Precedence-climbing loop over the operator registry.
    fn binary_expr(&mut self, min_prec: u8) -> Result<Spanned<Expr>, CompileError> {
        let start = self.current_span().start;
        let (mut left, mut height) = self.measured(|p| p.unary_expr())?;

        while let Some((id, prec)) = self.peek_binary_op() {
            if prec < min_prec {
                break;
            }
            self.advance();
            let next_min = match operators::info_for(id).associativity {
                Associativity::Right => prec,
                Associativity::Left | Associativity::None => prec + 1,
            };
            let (right, right_height) = self.measured(|p| p.nested(|p| p.binary_expr(next_min)))?;
            // `a + b + c` nests to the left: each link sits one level above the last.
            height = height.max(right_height) + 1;
            self.reach(height)?;
            let node = match (logical_op(id), binary_op(id)) {
                (Some(op), _) => Expr::Logical(Box::new(left), op, Box::new(right)),
                (None, Some(op)) => Expr::Binary(Box::new(left), op, Box::new(right)),
                (None, None) => {
                    return Err(CompileError::syntax(
                        format!("Unexpected operator '{}'", operators::as_str(id)),
                        left.span.merge(right.span),
                    ));
                }
            };
            left = self.spanned(node, start);
        }
        Ok(left)
    }

    fn unary_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.current_span().start;
        let token = self.peek();

        let op = match &token.kind {
            TokenKind::Operator(OperatorId::Bang) => Some(UnaryOp::Not),
            TokenKind::Operator(OperatorId::Minus) => Some(UnaryOp::Neg),
            TokenKind::Operator(OperatorId::Plus) => Some(UnaryOp::Plus),
            TokenKind::Operator(OperatorId::Tilde) => Some(UnaryOp::BitNot),
            TokenKind::Keyword(KeywordId::Typeof) => Some(UnaryOp::Typeof),
            TokenKind::Keyword(KeywordId::Void) => Some(UnaryOp::Void),
            TokenKind::Keyword(KeywordId::Delete) => Some(UnaryOp::Delete),
            TokenKind::Operator(OperatorId::PlusPlus | OperatorId::MinusMinus) => {
                let op = if token.kind.is_operator(OperatorId::PlusPlus) {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                self.advance();
                let operand = self.nested(|p| p.unary_expr())?;
                let target = self.simple_target(operand, "prefix operation")?;
                return Ok(self.spanned(
                    Expr::Update {
                        op,
                        prefix: true,
                        target: Box::new(target),
                    },
                    start,
                ));
            }
            TokenKind::Keyword(KeywordId::Await) => return Err(self.unsupported_here("`await` expressions")),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = self.nested(|p| p.unary_expr())?;
            return Ok(self.spanned(Expr::Unary(op, Box::new(operand)), start));
        }
        self.postfix_expr()
    }

    fn postfix_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.current_span().start;
        let expr = self.call_member()?;
        let token = self.peek();
        // Restricted production: `a\n++b` is `a; ++b`.
        if token.newline_before {
            return Ok(expr);
        }
        let op = match token.operator_id() {
            Some(OperatorId::PlusPlus) => UpdateOp::Increment,
            Some(OperatorId::MinusMinus) => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        self.advance();
        let target = self.simple_target(expr, "postfix operation")?;
        Ok(self.spanned(
            Expr::Update {
                op,
                prefix: false,
                target: Box::new(target),
            },
            start,
        ))
    }

    /// Parse member accesses, calls, and optional chains on top of a primary expression.
    fn call_member(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.current_span().start;
        let (mut expr, mut height) = self.measured(|p| {
            if p.check_keyword(KeywordId::New) {
                p.new_expr()
            } else if p.check_keyword(KeywordId::Super) {
                p.super_expr()
            } else {
                p.primary()
            }
        })?;
        let mut in_chain = false;

        loop {
            if self.match_punct(PunctuationId::Dot) {
                let name = self.property_name()?;
                height += 1;
                expr = self.spanned(
                    Expr::Member {
                        object: Box::new(expr),
                        property: MemberProp::Named(name),
                        optional: false,
                    },
                    start,
                );
            } else if self.match_punct(PunctuationId::QuestionDot) {
                in_chain = true;
                expr = if self.check_punct(PunctuationId::LParen) {
                    let (args, args_height) = self.measured(|p| p.arguments())?;
                    height = height.max(args_height) + 1;
                    self.spanned(
                        Expr::Call {
                            callee: Box::new(expr),
                            args,
                            optional: true,
                        },
                        start,
                    )
                } else if self.match_punct(PunctuationId::LBracket) {
                    let (index, index_height) = self.measured(|p| p.allow_in(|p| p.expression()))?;
                    height = height.max(index_height) + 1;
                    self.expect_punct(PunctuationId::RBracket, "Expected ']' after index")?;
                    self.spanned(
                        Expr::Member {
                            object: Box::new(expr),
                            property: MemberProp::Computed(Box::new(index)),
                            optional: true,
                        },
                        start,
                    )
                } else {
                    let name = self.property_name()?;
                    height += 1;
                    self.spanned(
                        Expr::Member {
                            object: Box::new(expr),
                            property: MemberProp::Named(name),
                            optional: true,
                        },
                        start,
                    )
                };
            } else if self.match_punct(PunctuationId::LBracket) {
                let (index, index_height) = self.measured(|p| p.allow_in(|p| p.expression()))?;
                height = height.max(index_height) + 1;
                self.expect_punct(PunctuationId::RBracket, "Expected ']' after index")?;
                expr = self.spanned(
                    Expr::Member {
                        object: Box::new(expr),
                        property: MemberProp::Computed(Box::new(index)),
                        optional: false,
                    },
                    start,
                );
            } else if self.check_punct(PunctuationId::LParen) {
                let (args, args_height) = self.measured(|p| p.arguments())?;
                height = height.max(args_height) + 1;
                expr = self.spanned(
                    Expr::Call {
                        callee: Box::new(expr),
                        args,
                        optional: false,
                    },
                    start,
                );
            } else if matches!(self.peek().kind, TokenKind::Template(_)) && !self.peek().newline_before {
                return Err(self.unsupported_here("Tagged templates"));
            } else {
                break;
            }
            self.reach(height)?;
        }

        if in_chain {
            self.reach(height + 1)?;
            expr = self.spanned(Expr::OptionalChain(Box::new(expr)), start);
        }
        Ok(expr)
    }

    fn new_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.advance().span.start;
        if self.check_punct(PunctuationId::Dot) {
            return Err(self.unsupported_here("`new.target` expressions"));
        }
        let (mut callee, mut height) = self.measured(|p| {
            if p.check_keyword(KeywordId::New) {
                p.nested(|p| p.new_expr())
            } else {
                p.primary()
            }
        })?;
        loop {
            if self.match_punct(PunctuationId::Dot) {
                let name = self.property_name()?;
                height += 1;
                callee = self.spanned(
                    Expr::Member {
                        object: Box::new(callee),
                        property: MemberProp::Named(name),
                        optional: false,
                    },
                    start,
                );
            } else if self.match_punct(PunctuationId::LBracket) {
                let (index, index_height) = self.measured(|p| p.allow_in(|p| p.expression()))?;
                height = height.max(index_height) + 1;
                self.expect_punct(PunctuationId::RBracket, "Expected ']' after index")?;
                callee = self.spanned(
                    Expr::Member {
                        object: Box::new(callee),
                        property: MemberProp::Computed(Box::new(index)),
                        optional: false,
                    },
                    start,
                );
            } else {
                break;
            }
            self.reach(height)?;
        }
        let (args, args_height) = if self.check_punct(PunctuationId::LParen) {
            self.measured(|p| p.arguments())?
        } else {
            (Vec::new(), 0)
        };
        self.reach(height.max(args_height) + 1)?;
        Ok(self.spanned(
            Expr::New {
                callee: Box::new(callee),
                args,
            },
            start,
        ))
    }

    fn super_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.advance().span.start;
        if self.check_punct(PunctuationId::LParen) {
            let args = self.arguments()?;
            return Ok(self.spanned(Expr::SuperCall(args), start));
        }
        if self.match_punct(PunctuationId::Dot) {
            let name = self.property_name()?;
            return Ok(self.spanned(Expr::SuperMember(MemberProp::Named(name)), start));
        }
        if self.match_punct(PunctuationId::LBracket) {
            let index = self.allow_in(|p| p.expression())?;
            self.expect_punct(PunctuationId::RBracket, "Expected ']' after index")?;
            return Ok(self.spanned(Expr::SuperMember(MemberProp::Computed(Box::new(index))), start));
        }
        Err(CompileError::syntax(
            "'super' keyword unexpected here".to_string(),
            Span::new(start, self.prev_end()),
        ))
    }

    fn arguments(&mut self) -> Result<Vec<Argument>, CompileError> {
        self.expect_punct(PunctuationId::LParen, "Expected '('")?;
        let mut args = Vec::new();
        while !self.check_punct(PunctuationId::RParen) {
            if self.match_punct(PunctuationId::Ellipsis) {
                args.push(Argument::Spread(self.allow_in(|p| p.assignment_expr())?));
            } else {
                args.push(Argument::Expr(self.allow_in(|p| p.assignment_expr())?));
            }
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(PunctuationId::RParen, "Expected ')' after arguments")?;
        Ok(args)
    }

    // ========================================================================
    // Primary expressions
    // ========================================================================

    fn primary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.current_span().start;
        let token = self.peek();

        let node = match &token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Expr::Number(*n)
            }
            TokenKind::String(s) => {
                self.advance();
                Expr::String(s.clone())
            }
            TokenKind::Template(chunks) => {
                self.advance();
                Expr::Template(self.template_parts(chunks)?)
            }
            TokenKind::Ident(name) => {
                self.advance();
                Expr::Ident(name.clone())
            }
            TokenKind::Keyword(KeywordId::True) => {
                self.advance();
                Expr::Bool(true)
            }
            TokenKind::Keyword(KeywordId::False) => {
                self.advance();
                Expr::Bool(false)
            }
            TokenKind::Keyword(KeywordId::Null) => {
                self.advance();
                Expr::Null
            }
            TokenKind::Keyword(KeywordId::This) => {
                self.advance();
                Expr::This
            }
            TokenKind::Keyword(KeywordId::Function) => Expr::Function(self.function_expression()?),
            TokenKind::Keyword(KeywordId::Class) => Expr::Class(self.class_definition(false)?),
            TokenKind::Punctuation(PunctuationId::LParen) => {
                self.advance();
                if self.check_punct(PunctuationId::RParen) {
                    return Err(self.unexpected("Expected expression"));
                }
                let inner = self.allow_in(|p| p.expression())?;
                self.expect_punct(PunctuationId::RParen, "Expected ')' after expression")?;
                return Ok(inner);
            }
            TokenKind::Punctuation(PunctuationId::LBracket) => self.allow_in(|p| p.array_literal())?,
            TokenKind::Punctuation(PunctuationId::LBrace) => self.allow_in(|p| p.object_literal())?,
            TokenKind::Keyword(KeywordId::Async) => return Err(self.unsupported_here("Async functions")),
            TokenKind::Keyword(KeywordId::Import) => return Err(self.unsupported_here("Dynamic imports")),
            _ => return Err(self.unexpected("Expected expression")),
        };

        Ok(self.spanned(node, start))
    }

    fn array_literal(&mut self) -> Result<Expr, CompileError> {
        self.advance();
        let mut elements = Vec::new();
        while !self.check_punct(PunctuationId::RBracket) {
            if self.match_punct(PunctuationId::Comma) {
                elements.push(ArrayElement::Hole);
                continue;
            }
            if self.match_punct(PunctuationId::Ellipsis) {
                elements.push(ArrayElement::Spread(self.assignment_expr()?));
            } else {
                elements.push(ArrayElement::Expr(self.assignment_expr()?));
            }
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(PunctuationId::RBracket, "Expected ']' to close array literal")?;
        Ok(Expr::Array(elements))
    }

    fn object_literal(&mut self) -> Result<Expr, CompileError> {
        self.advance();
        let mut props = Vec::new();
        while !self.check_punct(PunctuationId::RBrace) {
            if self.match_punct(PunctuationId::Ellipsis) {
                props.push(ObjectProp::Spread(self.assignment_expr()?));
            } else {
                self.reject_unsupported_member_prefix()?;
                let member_start = self.current_span().start;
                let key_token = self.peek();
                let key = self.property_key()?;
                if self.match_punct(PunctuationId::Colon) {
                    props.push(ObjectProp::KeyValue(key, self.assignment_expr()?));
                } else if self.check_punct(PunctuationId::LParen) {
                    let function = self.method_definition(&key, FunctionKind::Method, member_start)?;
                    props.push(ObjectProp::Method(key, function));
                } else if let TokenKind::Ident(name) = &key_token.kind {
                    if self.check_op(OperatorId::Eq) {
                        return Err(CompileError::syntax(
                            "Invalid shorthand property initializer".to_string(),
                            self.current_span(),
                        ));
                    }
                    props.push(ObjectProp::Shorthand(name.clone()));
                } else {
                    return Err(self.unexpected("Expected ':' after property key"));
                }
            }
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(PunctuationId::RBrace, "Expected '}' to close object literal")?;
        Ok(Expr::Object(props))
    }

    /// Lex and parse each `${...}` substitution of a template literal.
    fn template_parts(&mut self, chunks: &[TemplateChunk]) -> Result<Vec<TemplatePart>, CompileError> {
        let mut parts = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            match chunk {
                TemplateChunk::Literal(text) => parts.push(TemplatePart::Literal(text.clone())),
                TemplateChunk::Expr { source, offset } => {
                    let tokens = Lexer::with_offset(source, *offset).tokenize().map_err(|errs| self.keep_first(errs))?;
                    if self.depth >= MAX_NESTING {
                        return Err(self.too_deep());
                    }
                    let mut inner = Parser::new(&tokens);
                    inner.depth = self.depth + 1;
                    inner.peak = inner.depth;
                    let expr = inner.expression_only();
                    self.peak = self.peak.max(inner.peak);
                    parts.push(TemplatePart::Expr(expr.map_err(|errs| self.keep_first(errs))?));
                }
            }
        }
        Ok(parts)
    }

    /// Return the first error and queue the rest on this parser.
    fn keep_first(&mut self, mut errs: Vec<CompileError>) -> CompileError {
        let first = errs.remove(0);
        self.errors.extend(errs);
        first
    }
}

// ============================================================================
// Operator mapping
// ============================================================================

fn logical_op(id: OperatorId) -> Option<LogicalOp> {
    match id {
        OperatorId::AmpAmp => Some(LogicalOp::And),
        OperatorId::PipePipe => Some(LogicalOp::Or),
        OperatorId::QuestionQuestion => Some(LogicalOp::Nullish),
        _ => None,
    }
}

fn binary_op(id: OperatorId) -> Option<BinaryOp> {
    let op = match id {
        OperatorId::Plus | OperatorId::PlusEq => BinaryOp::Add,
        OperatorId::Minus | OperatorId::MinusEq => BinaryOp::Sub,
        OperatorId::Star | OperatorId::StarEq => BinaryOp::Mul,
        OperatorId::StarStar | OperatorId::StarStarEq => BinaryOp::Pow,
        OperatorId::Slash | OperatorId::SlashEq => BinaryOp::Div,
        OperatorId::Percent | OperatorId::PercentEq => BinaryOp::Mod,
        OperatorId::EqEq => BinaryOp::Eq,
        OperatorId::NotEq => BinaryOp::NotEq,
        OperatorId::EqEqEq => BinaryOp::StrictEq,
        OperatorId::NotEqEq => BinaryOp::StrictNotEq,
        OperatorId::Lt => BinaryOp::Lt,
        OperatorId::LtEq => BinaryOp::LtEq,
        OperatorId::Gt => BinaryOp::Gt,
        OperatorId::GtEq => BinaryOp::GtEq,
        OperatorId::Amp | OperatorId::AmpEq => BinaryOp::BitAnd,
        OperatorId::Pipe | OperatorId::PipeEq => BinaryOp::BitOr,
        OperatorId::Caret | OperatorId::CaretEq => BinaryOp::BitXor,
        OperatorId::Shl | OperatorId::ShlEq => BinaryOp::Shl,
        OperatorId::Shr | OperatorId::ShrEq => BinaryOp::Shr,
        OperatorId::UShr | OperatorId::UShrEq => BinaryOp::UShr,
        OperatorId::In => BinaryOp::In,
        OperatorId::Instanceof => BinaryOp::Instanceof,
        _ => return None,
    };
    Some(op)
}

fn assign_op(id: OperatorId) -> Option<AssignOp> {
    match id {
        OperatorId::Eq => Some(AssignOp::Assign),
        OperatorId::AmpAmpEq => Some(AssignOp::Logical(LogicalOp::And)),
        OperatorId::PipePipeEq => Some(AssignOp::Logical(LogicalOp::Or)),
        OperatorId::QuestionQuestionEq => Some(AssignOp::Logical(LogicalOp::Nullish)),
        other => binary_op(other).map(AssignOp::Compound),
    }
}
