//! Command-line interface for proctor.
//!
//! ## Commands
//!
//! - `eval` - Evaluate learner code against a test script, printing the JSON result
//! - `scan <file>` - Screen a file against the policy
//! - `preview <file>` - Render learner framework code to a static HTML document
//!
//! Debug flags `--lex FILE` and `--parse FILE` print the token stream or the AST.
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    /// Bad invocation or unreadable input, as opposed to a failed evaluation.
    pub const USAGE: ExitCode = ExitCode(2);
}

/// A user-facing message plus the exit code to leave with.
#[derive(Debug)]
pub struct CliError {
    pub message: String,
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::USAGE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sandboxed evaluation and grading of learner scripts
#[derive(Parser, Debug)]
#[command(name = "proctor")]
#[command(version = VERSION)]
#[command(about = "Sandboxed evaluation and grading of learner scripts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Tokenize only (debug)
    #[arg(long = "lex", value_name = "FILE")]
    pub lex_file: Option<PathBuf>,

    /// Parse only (debug)
    #[arg(long = "parse", value_name = "FILE", conflicts_with = "lex_file")]
    pub parse_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate learner code against a test script
    Eval(EvalArgs),

    /// Screen a source file against the policy
    Scan {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Engine configuration (JSON) supplying the policy
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Render learner framework code to a static HTML document
    Preview {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Instructor code run before the learner code
        #[arg(long, value_name = "FILE")]
        prelude: Option<PathBuf>,
        /// Export or top-level binding to render
        #[arg(long, value_name = "NAME")]
        entry: Option<String>,
        /// Write the document here instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
pub struct EvalArgs {
    /// Learner source
    #[arg(long, value_name = "FILE")]
    pub learner: PathBuf,
    /// Test script
    #[arg(long, value_name = "FILE")]
    pub tests: PathBuf,
    /// Instructor code run before the learner code
    #[arg(long, value_name = "FILE")]
    pub prelude: Option<PathBuf>,
    /// Top-level learner binding to expose on `userCode` (repeatable)
    #[arg(long = "capture", value_name = "NAME")]
    pub capture: Vec<String>,
    /// Grant the headless `document`
    #[arg(long)]
    pub dom: bool,
    /// Wall-clock budget (overrides the config)
    #[arg(long = "timeout-ms", value_name = "N")]
    pub timeout_ms: Option<u64>,
    /// Engine configuration (JSON)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Pretty-print the JSON result
    #[arg(long)]
    pub pretty: bool,
}

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

fn execute(cli: Cli) -> CliResult<ExitCode> {
    if let Some(file) = cli.lex_file {
        return commands::lex_file(&file);
    }
    if let Some(file) = cli.parse_file {
        return commands::parse_file(&file);
    }

    match cli.command {
        Some(Command::Eval(args)) => commands::eval(&args),
        Some(Command::Scan { file, config }) => commands::scan_file(&file, config.as_deref()),
        Some(Command::Preview {
            file,
            prelude,
            entry,
            out,
            config,
        }) => commands::preview_file(&file, prelude.as_deref(), entry, out.as_deref(), config.as_deref()),
        None => Err(CliError::usage("No command given; see `proctor --help`")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_eval() {
        let cli = Cli::try_parse_from([
            "proctor",
            "eval",
            "--learner",
            "a.js",
            "--tests",
            "a.test.js",
            "--capture",
            "element",
            "--capture",
            "app",
            "--dom",
            "--timeout-ms",
            "250",
        ])
        .unwrap();
        let Some(Command::Eval(args)) = cli.command else {
            panic!("Expected Eval command");
        };
        assert_eq!(args.capture, ["element", "app"]);
        assert!(args.dom);
        assert_eq!(args.timeout_ms, Some(250));
        assert!(!args.pretty);
    }

    #[test]
    fn test_cli_parse_scan() {
        let cli = Cli::try_parse_from(["proctor", "scan", "code.js"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Scan { .. })));
    }

    #[test]
    fn test_cli_parse_preview() {
        let cli = Cli::try_parse_from(["proctor", "preview", "code.js", "--entry", "app", "--out", "p.html"]).unwrap();
        if let Some(Command::Preview { entry, out, .. }) = cli.command {
            assert_eq!(entry.as_deref(), Some("app"));
            assert_eq!(out, Some(PathBuf::from("p.html")));
        } else {
            panic!("Expected Preview command");
        }
    }

    #[test]
    fn test_cli_debug_flags() {
        let cli = Cli::try_parse_from(["proctor", "--lex", "code.js"]).unwrap();
        assert_eq!(cli.lex_file, Some(PathBuf::from("code.js")));
        assert!(Cli::try_parse_from(["proctor", "--lex", "a.js", "--parse", "b.js"]).is_err());
    }

    #[test]
    fn test_eval_requires_learner_and_tests() {
        assert!(Cli::try_parse_from(["proctor", "eval", "--learner", "a.js"]).is_err());
    }
}
