/// Parse a token stream into an AST [`Program`].
///
/// This is the main public entrypoint for parsing.
///
/// ## Parameters
/// - `tokens`: Token stream produced by `proctor_syntax::lexer`.
///
/// ## Errors
/// Returns `Err(Vec<CompileError>)` if parsing fails.
#[tracing::instrument(skip_all, fields(token_count = tokens.len()))]
pub fn parse(tokens: &[Token]) -> Result<Program, Vec<CompileError>> {
    Parser::new(tokens).parse()
}

/// Parse a token stream that must contain exactly one expression.
///
/// ## Errors
/// Returns `Err(Vec<CompileError>)` if the tokens are not a single well-formed expression.
pub fn parse_expression(tokens: &[Token]) -> Result<Spanned<Expr>, Vec<CompileError>> {
    Parser::new(tokens).parse_expression_only()
}
