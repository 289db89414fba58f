//! CLI module for the round-trip harness
//!
//! ```text
//! qbin-roundtrip --compiler <PATH> --decompiler <PATH> --qasm <FILE> --workdir <DIR> [--exact] [--keep]
//! ```
//!
//! ## Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | round trip preserved the source |
//! | 1 | a tool failed, or the harness could not run |
//! | 2 | mismatch under `--exact` |
//! | 3 | mismatch under normalized comparison |
//!
//! ## Design
//!
//! Argument parsing uses clap derive. Functions return `CliResult<T>` instead
//! of calling `process::exit`; only the top-level `run()` exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod reporter;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use crate::compare::ComparisonMode;
use crate::harness::{HarnessConfig, HarnessError, RoundTrip, RunOutcome};
use crate::process::{SystemToolRunner, ToolRunner};
use crate::version::VERSION;

pub use reporter::{ConsoleReporter, RunReporter};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// Tool failure or harness error
    pub const FAILURE: ExitCode = ExitCode(1);
    pub const EXACT_MISMATCH: ExitCode = ExitCode(2);
    pub const NORMALIZED_MISMATCH: ExitCode = ExitCode(3);

    /// Exit code for a mismatch found under `mode`.
    pub fn mismatch(mode: ComparisonMode) -> Self {
        match mode {
            ComparisonMode::Exact => ExitCode::EXACT_MISMATCH,
            ComparisonMode::Normalized => ExitCode::NORMALIZED_MISMATCH,
        }
    }
}

impl From<&RunOutcome> for ExitCode {
    fn from(outcome: &RunOutcome) -> Self {
        match outcome {
            RunOutcome::Passed { .. } => ExitCode::SUCCESS,
            RunOutcome::ToolFailed { .. } => ExitCode::FAILURE,
            RunOutcome::Mismatch { mode, .. } => ExitCode::mismatch(*mode),
        }
    }
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl From<HarnessError> for CliError {
    fn from(err: HarnessError) -> Self {
        let report = miette::Report::new(err);
        CliError::failure(format!("{report:?}"))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Round-trip tester for the QBIN toolchain (QASM -> QBIN -> QASM)
#[derive(Parser, Debug)]
#[command(name = "qbin-roundtrip")]
#[command(version = VERSION)]
#[command(about = "QBIN round-trip tester (QASM -> QBIN -> QASM)", long_about = None)]
pub struct Cli {
    /// Path to the compiler (qbin-compile)
    #[arg(long, value_name = "PATH")]
    pub compiler: PathBuf,

    /// Path to the decompiler (qbin-decompile)
    #[arg(long, value_name = "PATH")]
    pub decompiler: PathBuf,

    /// Input source file
    #[arg(long = "qasm", visible_alias = "source", value_name = "FILE")]
    pub source: PathBuf,

    /// Work directory for intermediate artifacts
    #[arg(long, value_name = "DIR")]
    pub workdir: PathBuf,

    /// Require byte-for-byte equality instead of normalized comparison
    #[arg(long)]
    pub exact: bool,

    /// Keep the work directory after a successful run
    #[arg(long)]
    pub keep: bool,
}

impl Cli {
    /// Translate parsed arguments into a run configuration.
    pub fn to_config(&self) -> HarnessConfig {
        let mode = if self.exact {
            ComparisonMode::Exact
        } else {
            ComparisonMode::Normalized
        };
        HarnessConfig::new(&self.compiler, &self.decompiler, &self.source, &self.workdir)
            .with_mode(mode)
            .with_retain(self.keep)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            process::exit(usage_exit_code(&e).0);
        }
    };

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

/// Exit code for an argument parsing error.
///
/// `--help` and `--version` exit cleanly; every other usage error is a harness
/// failure, never one of the mismatch codes.
fn usage_exit_code(err: &clap::Error) -> ExitCode {
    if err.use_stderr() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Execute the parsed command line against real processes.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let mut reporter = ConsoleReporter::stdio();
    run_roundtrip(cli.to_config(), &SystemToolRunner, &mut reporter)
}

/// Run one round trip and report its outcome.
///
/// Tool failures and mismatches are reported through `reporter` and come back
/// as `Ok` with their exit code; harness errors come back as `Err`.
pub fn run_roundtrip(
    config: HarnessConfig,
    runner: &dyn ToolRunner,
    reporter: &mut dyn RunReporter,
) -> CliResult<ExitCode> {
    let report = RoundTrip::with_runner(config, runner).run()?;
    reporter.report(&report.outcome);
    Ok(ExitCode::from(&report.outcome))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::process::{ProcessResult, ToolInvocation};
    use std::io;

    const REQUIRED: [&str; 9] = [
        "qbin-roundtrip",
        "--compiler",
        "qbin-compile",
        "--decompiler",
        "qbin-decompile",
        "--qasm",
        "bell.qasm",
        "--workdir",
        "work",
    ];

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::try_parse_from(REQUIRED).unwrap();
        assert!(!cli.exact);
        assert!(!cli.keep);

        let config = cli.to_config();
        assert_eq!(config.mode, ComparisonMode::Normalized);
        assert!(!config.retain);
        assert_eq!(config.source, PathBuf::from("bell.qasm"));
    }

    #[test]
    fn test_cli_parse_flags() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--exact", "--keep"]);
        let config = Cli::try_parse_from(args).unwrap().to_config();
        assert_eq!(config.mode, ComparisonMode::Exact);
        assert!(config.retain);
    }

    #[test]
    fn test_cli_source_alias() {
        let cli = Cli::try_parse_from([
            "qbin-roundtrip",
            "--compiler",
            "c",
            "--decompiler",
            "d",
            "--source",
            "ghz.qasm",
            "--workdir",
            "w",
        ])
        .unwrap();
        assert_eq!(cli.source, PathBuf::from("ghz.qasm"));
    }

    #[test]
    fn test_cli_requires_all_paths() {
        assert!(Cli::try_parse_from(["qbin-roundtrip", "--compiler", "c"]).is_err());
        assert!(Cli::try_parse_from(&REQUIRED[..7]).is_err());
    }

    #[test]
    fn test_usage_errors_exit_with_failure() {
        let missing = Cli::try_parse_from(&REQUIRED[..7]).unwrap_err();
        assert_eq!(usage_exit_code(&missing), ExitCode::FAILURE);

        let mut args = REQUIRED.to_vec();
        args.push("--bogus");
        let unknown = Cli::try_parse_from(args).unwrap_err();
        assert_eq!(usage_exit_code(&unknown), ExitCode::FAILURE);
    }

    #[test]
    fn test_help_and_version_exit_cleanly() {
        let help = Cli::try_parse_from(["qbin-roundtrip", "--help"]).unwrap_err();
        assert_eq!(usage_exit_code(&help), ExitCode::SUCCESS);

        let version = Cli::try_parse_from(["qbin-roundtrip", "--version"]).unwrap_err();
        assert_eq!(usage_exit_code(&version), ExitCode::SUCCESS);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::mismatch(ComparisonMode::Exact), ExitCode(2));
        assert_eq!(ExitCode::mismatch(ComparisonMode::Normalized), ExitCode(3));
        assert_eq!(
            ExitCode::from(&RunOutcome::ToolFailed {
                tool: crate::process::Tool::Decompiler,
                result: ProcessResult {
                    exit_code: Some(9),
                    stdout: String::new(),
                    stderr: String::new(),
                },
            }),
            ExitCode::FAILURE
        );
    }

    struct NeverLaunches;

    impl ToolRunner for NeverLaunches {
        fn run(&self, _invocation: &ToolInvocation) -> io::Result<ProcessResult> {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        }
    }

    #[test]
    fn test_harness_error_becomes_failure() {
        let dir = std::env::temp_dir().join(format!("qbin_cli_test_{}", std::process::id()));
        let config = HarnessConfig::new("qbin-compile", "qbin-decompile", "bell.qasm", &dir);
        let mut reporter = ConsoleReporter::new(Vec::new(), Vec::new());

        let err = run_roundtrip(config, &NeverLaunches, &mut reporter).unwrap_err();

        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.contains("Compiler could not be launched"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
