/// Binding and assignment pattern parsing.
///
/// Declarations and parameters parse patterns directly. Destructuring *assignment* (`[a, b] = [b, a]`) is
/// parsed as an expression first and converted by `expr_to_pattern` once the `=` is seen.
impl<'a> Parser<'a> {
    // ========================================================================
    // Binding patterns
    // ========================================================================

    fn binding_target(&mut self) -> Result<Spanned<Pattern>, CompileError> {
        let start = self.current_span().start;
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(self.spanned(Pattern::Ident(name.clone()), start))
            }
            TokenKind::Punctuation(PunctuationId::LBracket) => self.array_binding_pattern(),
            TokenKind::Punctuation(PunctuationId::LBrace) => self.object_binding_pattern(),
            TokenKind::Keyword(id) => Err(CompileError::syntax(
                format!(
                    "'{}' is a reserved word and cannot be used as a binding name",
                    proctor_core::lang::keywords::as_str(*id)
                ),
                self.current_span(),
            )),
            _ => Err(self.unexpected("Expected identifier or destructuring pattern")),
        }
    }

    fn binding_element(&mut self) -> Result<PatternElem, CompileError> {
        let target = self.binding_target()?;
        let default = if self.match_op(OperatorId::Eq) {
            Some(self.assignment_expr()?)
        } else {
            None
        };
        Ok(PatternElem { target, default })
    }

    fn array_binding_pattern(&mut self) -> Result<Spanned<Pattern>, CompileError> {
        let start = self.advance().span.start;
        let mut elements = Vec::new();
        let mut rest = None;
        while !self.check_punct(PunctuationId::RBracket) {
            if self.match_punct(PunctuationId::Comma) {
                elements.push(None);
                continue;
            }
            if self.match_punct(PunctuationId::Ellipsis) {
                rest = Some(Box::new(self.binding_target()?));
                break;
            }
            elements.push(Some(self.allow_in(|p| p.binding_element())?));
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(PunctuationId::RBracket, "Expected ']' to close array pattern")?;
        Ok(self.spanned(Pattern::Array { elements, rest }, start))
    }

    fn object_binding_pattern(&mut self) -> Result<Spanned<Pattern>, CompileError> {
        let start = self.advance().span.start;
        let mut props = Vec::new();
        let mut rest = None;
        while !self.check_punct(PunctuationId::RBrace) {
            if self.match_punct(PunctuationId::Ellipsis) {
                rest = Some(Box::new(self.binding_target()?));
                break;
            }
            let key_token = self.peek();
            let key = self.property_key()?;
            let value = if self.match_punct(PunctuationId::Colon) {
                self.allow_in(|p| p.binding_element())?
            } else {
                let TokenKind::Ident(name) = &key_token.kind else {
                    return Err(CompileError::syntax(
                        "Expected ':' after property key in object pattern".to_string(),
                        key_token.span,
                    ));
                };
                let target = Spanned::new(Pattern::Ident(name.clone()), key_token.span);
                let default = if self.match_op(OperatorId::Eq) {
                    Some(self.allow_in(|p| p.assignment_expr())?)
                } else {
                    None
                };
                PatternElem { target, default }
            };
            props.push(ObjectPatternProp { key, value });
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(PunctuationId::RBrace, "Expected '}' to close object pattern")?;
        Ok(self.spanned(Pattern::Object { props, rest }, start))
    }

    // ========================================================================
    // Expression → pattern conversion
    // ========================================================================

    fn expr_to_pattern(&self, expr: Spanned<Expr>) -> Result<Spanned<Pattern>, CompileError> {
        let span = expr.span;
        let invalid = || CompileError::syntax("Invalid destructuring assignment target".to_string(), span);
        let pattern = match expr.node {
            Expr::Ident(name) => Pattern::Ident(name),
            Expr::Member { optional: false, .. } | Expr::SuperMember(_) => Pattern::Member(Box::new(expr)),
            Expr::Array(elements) => {
                let mut out = Vec::new();
                let mut rest = None;
                let count = elements.len();
                for (i, element) in elements.into_iter().enumerate() {
                    match element {
                        ArrayElement::Hole => out.push(None),
                        ArrayElement::Expr(e) => out.push(Some(self.expr_to_pattern_elem(e)?)),
                        ArrayElement::Spread(e) if i + 1 == count => {
                            rest = Some(Box::new(self.expr_to_pattern(e)?));
                        }
                        ArrayElement::Spread(_) => return Err(invalid()),
                    }
                }
                Pattern::Array { elements: out, rest }
            }
            Expr::Object(props) => {
                let mut out = Vec::new();
                let mut rest = None;
                let count = props.len();
                for (i, prop) in props.into_iter().enumerate() {
                    match prop {
                        ObjectProp::KeyValue(key, value) => out.push(ObjectPatternProp {
                            key,
                            value: self.expr_to_pattern_elem(value)?,
                        }),
                        ObjectProp::Shorthand(name) => out.push(ObjectPatternProp {
                            key: PropKey::Named(name.clone()),
                            value: PatternElem {
                                target: Spanned::new(Pattern::Ident(name), span),
                                default: None,
                            },
                        }),
                        ObjectProp::Spread(e) if i + 1 == count => {
                            rest = Some(Box::new(self.expr_to_pattern(e)?));
                        }
                        ObjectProp::Spread(_) | ObjectProp::Method(..) => return Err(invalid()),
                    }
                }
                Pattern::Object { props: out, rest }
            }
            _ => {
                return Err(CompileError::syntax(
                    "Invalid left-hand side in assignment".to_string(),
                    span,
                ));
            }
        };
        Ok(Spanned::new(pattern, span))
    }

    /// Convert an element expression, treating `target = default` as a defaulted element.
    fn expr_to_pattern_elem(&self, expr: Spanned<Expr>) -> Result<PatternElem, CompileError> {
        match expr.node {
            Expr::Assign {
                op: AssignOp::Assign,
                target,
                value,
            } => Ok(PatternElem {
                target: *target,
                default: Some(*value),
            }),
            node => Ok(PatternElem {
                target: self.expr_to_pattern(Spanned::new(node, expr.span))?,
                default: None,
            }),
        }
    }

    /// Validate the operand of `++`/`--` or a compound assignment: only names and member accesses qualify.
    fn simple_target(&self, expr: Spanned<Expr>, context: &str) -> Result<Spanned<Expr>, CompileError> {
        match &expr.node {
            Expr::Ident(_) | Expr::Member { optional: false, .. } | Expr::SuperMember(_) => Ok(expr),
            _ => Err(CompileError::syntax(format!("Invalid {context} target"), expr.span)),
        }
    }
}
