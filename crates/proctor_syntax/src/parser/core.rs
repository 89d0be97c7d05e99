/// Parser core types and entrypoint.
///
/// This chunk defines the [`Parser`] type and its top-level `parse()` entrypoint.
///
/// ## Notes
/// - This file is `include!`'d into `crate::parser` to keep all parser methods in a
///   single module while avoiding a single “god file”.

/// Maximum syntactic nesting (statements, expressions, prefix operators) before parsing gives up.
pub const MAX_NESTING: usize = 256;

/// Parser state.
///
/// ## Notes
/// - The parser is single-pass and recovers from errors at top-level statement boundaries so one bad line
///   does not hide the rest of the diagnostics.
/// - `no_in` is set while parsing the head of a `for` statement, where `in` ends the left side instead of
///   being a binary operator.
/// - `depth` counts the nesting of the parse in progress; `peak` is the deepest level the current operand
///   has reached, counting left-nested links of binary, member and call chains. Both stay under
///   [`MAX_NESTING`], which bounds the height of every tree the parser returns.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    errors: Vec<CompileError>,
    no_in: bool,
    depth: usize,
    peak: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for a token stream.
    ///
    /// ## Parameters
    /// - `tokens`: Token stream produced by `proctor_syntax::lexer`; must end with `Eof`.
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            no_in: false,
            depth: 0,
            peak: 0,
        }
    }

    /// Parse the entire token stream into a [`Program`].
    ///
    /// ## Errors
    /// Returns a list of [`CompileError`]s if parsing fails. The parser attempts
    /// to recover and continue after an error to report multiple issues in one pass.
    pub fn parse(mut self) -> Result<Program, Vec<CompileError>> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            match self.statement() {
                Ok(stmt) => body.push(stmt),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        if self.errors.is_empty() {
            Ok(Program { body })
        } else {
            Err(self.errors)
        }
    }

    /// Parse a single expression that must span the whole token stream (template substitutions).
    pub fn parse_expression_only(mut self) -> Result<Spanned<Expr>, Vec<CompileError>> {
        self.expression_only()
    }

    fn expression_only(&mut self) -> Result<Spanned<Expr>, Vec<CompileError>> {
        let expr = match self.expression() {
            Ok(expr) => expr,
            Err(e) => return Err(vec![e]),
        };
        if !self.is_at_end() {
            return Err(vec![self.unexpected("Expected end of expression")]);
        }
        Ok(expr)
    }
}
