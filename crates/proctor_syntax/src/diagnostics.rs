//! Diagnostics for script compilation.
//!
//! A [`CompileError`] carries a byte span into the source it was produced from. The harness turns the first
//! error into a learner-facing message (`"SyntaxError: ... (line 3, column 7)"`); the CLI renders the full
//! list through `miette` with source highlighting.

use crate::ast::Span;
use miette::{LabeledSpan, MietteDiagnostic, Report, Severity};

/// A compile-time error with location information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CompileError {
    pub message: String,
    pub span: Span,
    pub kind: ErrorKind,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl CompileError {
    pub fn new(message: String, span: Span) -> Self {
        Self {
            message,
            span,
            kind: ErrorKind::Error,
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn syntax(message: String, span: Span) -> Self {
        Self {
            kind: ErrorKind::Syntax,
            ..Self::new(message, span)
        }
    }

    /// An error for syntax that parses in full JavaScript but is outside the supported subset.
    pub fn unsupported(message: String, span: Span) -> Self {
        Self {
            kind: ErrorKind::Unsupported,
            ..Self::new(message, span)
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    /// Shift the span by `offset` bytes (used for expressions lexed out of template literals).
    pub fn offset_by(mut self, offset: usize) -> Self {
        self.span = Span::new(self.span.start + offset, self.span.end + offset);
        self
    }

    /// Render a one-line message with a 1-based line/column suffix computed against `source`.
    ///
    /// ## Examples
    /// ```rust
    /// use proctor_syntax::ast::Span;
    /// use proctor_syntax::diagnostics::CompileError;
    ///
    /// let err = CompileError::syntax("Unexpected token '}'".into(), Span::new(6, 7));
    /// assert_eq!(err.display_with_location("let x\n}"), "SyntaxError: Unexpected token '}' (line 2, column 1)");
    /// ```
    pub fn display_with_location(&self, source: &str) -> String {
        let (line, col) = line_col(source, self.span.start);
        format!("{}: {} (line {line}, column {col})", self.kind.label(), self.message)
    }

    /// Build a `miette` report that renders this error against `source`.
    pub fn to_report(&self, name: &str, source: &str) -> Report {
        let len = self.span.end.saturating_sub(self.span.start).max(1);
        let mut diag = MietteDiagnostic::new(self.message.clone())
            .with_code(self.kind.label())
            .with_severity(Severity::Error)
            .with_label(LabeledSpan::at(self.span.start..self.span.start + len, "here"));
        let mut help: Vec<String> = self.hints.clone();
        help.extend(self.notes.iter().map(|n| format!("note: {n}")));
        if !help.is_empty() {
            diag = diag.with_help(help.join("\n"));
        }
        Report::new(diag).with_source_code(miette::NamedSource::new(name, source.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Error,
    Syntax,
    Unsupported,
}

impl ErrorKind {
    /// The script-facing error class name.
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Error | ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Unsupported => "UnsupportedSyntax",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Error => write!(f, "error"),
            ErrorKind::Syntax => write!(f, "syntax error"),
            ErrorKind::Unsupported => write!(f, "unsupported syntax"),
        }
    }
}

/// Return the 1-based line and column (in chars) of byte `offset` in `source`.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let mut line = 1;
    let mut line_start = 0;
    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    let col = source[line_start..offset].chars().count() + 1;
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        assert_eq!(line_col("abc", 0), (1, 1));
        assert_eq!(line_col("a\nbc", 3), (2, 2));
        assert_eq!(line_col("é\nx", 3), (2, 1));
        assert_eq!(line_col("ab", 99), (1, 3));
    }

    #[test]
    fn test_offset_by_shifts_span() {
        let err = CompileError::syntax("x".into(), Span::new(1, 2)).offset_by(10);
        assert_eq!(err.span, Span::new(11, 12));
    }

    #[test]
    fn test_display_trait_uses_kind() {
        let err = CompileError::unsupported("Regular expressions are not supported".into(), Span::new(0, 1));
        assert_eq!(err.to_string(), "unsupported syntax: Regular expressions are not supported");
    }
}
