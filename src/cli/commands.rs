//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use miette::{LabeledSpan, MietteDiagnostic, Report, Severity};
use proctor_syntax::diagnostics::CompileError;
use proctor_syntax::{lexer, parser};

use super::{CliError, CliResult, EvalArgs, ExitCode};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::policy::PolicyVerdict;
use crate::preview::{PreviewStatus, PreviewTemplate};
use crate::sandbox::{Capabilities, EvaluationRequest};

/// Largest source file the CLI will read (10 MB). The policy's own length limit is far lower; this only
/// keeps an accidental huge file out of memory.
const MAX_SOURCE_SIZE: u64 = 10 * 1024 * 1024;

/// Read a source file, rejecting files over `MAX_SOURCE_SIZE`.
pub fn read_source(path: &Path) -> CliResult<String> {
    let metadata = fs::metadata(path)
        .map_err(|e| CliError::usage(format!("Cannot access file '{}': {}", path.display(), e)))?;

    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(CliError::usage(format!(
            "Source file '{}' is too large ({} bytes, max {} bytes)",
            path.display(),
            metadata.len(),
            MAX_SOURCE_SIZE
        )));
    }

    fs::read_to_string(path).map_err(|e| CliError::usage(format!("Error reading file '{}': {}", path.display(), e)))
}

fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path).map_err(|e| CliError::usage(e.to_string())),
        None => Ok(EngineConfig::default()),
    }
}

fn engine(config: EngineConfig) -> CliResult<Engine> {
    Engine::new(config).map_err(|e| CliError::usage(format!("Invalid policy: {e}")))
}

fn tokio_runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::failure(format!("Cannot start runtime: {e}")))
}

fn render_errors(path: &Path, source: &str, errors: &[CompileError]) -> String {
    let name = path.display().to_string();
    errors
        .iter()
        .map(|err| format!("{:?}", err.to_report(&name, source)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lex and display tokens.
pub fn lex_file(path: &Path) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let tokens = lexer::lex(&source).map_err(|errs| CliError::failure(render_errors(path, &source, &errs)))?;
    for tok in &tokens {
        println!("{:?}", tok);
    }
    Ok(ExitCode::SUCCESS)
}

/// Parse and display AST.
pub fn parse_file(path: &Path) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let tokens = lexer::lex(&source).map_err(|errs| CliError::failure(render_errors(path, &source, &errs)))?;
    let ast = parser::parse(&tokens).map_err(|errs| CliError::failure(render_errors(path, &source, &errs)))?;
    println!("{:#?}", ast);
    Ok(ExitCode::SUCCESS)
}

/// Evaluate learner code against a test script and print the JSON result. Exit 0 iff the suite passed.
pub fn eval(args: &EvalArgs) -> CliResult<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let mut request = EvaluationRequest::new(read_source(&args.learner)?, read_source(&args.tests)?)
        .with_capture(args.capture.iter().cloned());
    if let Some(prelude) = &args.prelude {
        request = request.with_prelude(read_source(prelude)?);
    }
    if args.dom {
        request = request.with_capabilities(Capabilities::with_document());
    }
    if let Some(ms) = args.timeout_ms {
        request = request.with_timeout(Duration::from_millis(ms));
    }

    let engine = engine(config)?;
    let result = tokio_runtime()?.block_on(engine.evaluate(&request));

    let json = if args.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .map_err(|e| CliError::failure(format!("Cannot serialize result: {e}")))?;
    println!("{json}");

    Ok(if result.passed { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn violation_report(path: &Path, source: &str, verdict: &PolicyVerdict) -> Report {
    let mut diag = MietteDiagnostic::new(verdict.message.clone().unwrap_or_default()).with_severity(Severity::Error);
    if let Some(rule) = &verdict.violated_rule {
        diag = diag.with_code(rule.clone());
    }
    if let Some(span) = verdict.span {
        let len = span.end.saturating_sub(span.start).max(1);
        diag = diag.with_label(LabeledSpan::at(span.start..span.start + len, "not allowed here"));
    }
    Report::new(diag).with_source_code(miette::NamedSource::new(path.display().to_string(), source.to_string()))
}

/// Screen a file. Prints the verdict as JSON; exit 0 iff allowed.
pub fn scan_file(path: &Path, config: Option<&Path>) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let engine = engine(load_config(config)?)?;
    let verdict = engine.policy().scan(&source);

    let json = serde_json::to_string(&verdict).map_err(|e| CliError::failure(format!("Cannot serialize verdict: {e}")))?;
    println!("{json}");

    if verdict.allowed {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{:?}", violation_report(path, &source, &verdict));
        Ok(ExitCode::FAILURE)
    }
}

/// Render a preview document. Exit 0 when learner code ran (rendered output or the note).
pub fn preview_file(
    path: &Path,
    prelude: Option<&Path>,
    entry: Option<String>,
    out: Option<&Path>,
    config: Option<&Path>,
) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let mut template = PreviewTemplate::default();
    if let Some(prelude) = prelude {
        template = template.with_prelude(read_source(prelude)?);
    }
    if let Some(entry) = entry {
        template = template.with_entry(entry);
    }

    let engine = engine(load_config(config)?)?;
    let document = tokio_runtime()?.block_on(engine.render_preview(&source, &template));

    match out {
        Some(out) => fs::write(out, &document.html)
            .map_err(|e| CliError::failure(format!("Error writing '{}': {}", out.display(), e)))?,
        None => print!("{}", document.html),
    }
    tracing::info!(status = ?document.status, "preview rendered");

    Ok(match document.status {
        PreviewStatus::Rendered | PreviewStatus::Note => ExitCode::SUCCESS,
        PreviewStatus::Rejected | PreviewStatus::Error | PreviewStatus::Timeout => ExitCode::FAILURE,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proctor_syntax::ast::Span;

    #[test]
    fn test_read_source_missing_file_is_usage_error() {
        let err = read_source(Path::new("/definitely/not/here.js")).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::USAGE);
        assert!(err.message.contains("Cannot access file"));
    }

    #[test]
    fn test_violation_report_names_rule() {
        let verdict = PolicyVerdict {
            allowed: false,
            violated_rule: Some("document-cookie".into()),
            message: Some("document.cookie is not allowed".into()),
            span: Some(Span::new(10, 25)),
        };
        let report = violation_report(Path::new("a.js"), "const c = document.cookie", &verdict);
        assert_eq!(report.to_string(), "document.cookie is not allowed");
    }
}
