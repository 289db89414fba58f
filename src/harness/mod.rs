//! Round-trip pipeline
//!
//! Drives one run through its stages:
//!
//! ```text
//! Init -> Compiled -> Decompiled -> Compared -> Passed | Failed
//! ```
//!
//! Any stage may jump straight to `Failed`; nothing is retried and no stage runs
//! twice. The decompiler only runs after a successful compile, and the
//! comparison only after a successful decompile.
//!
//! ## Outcomes vs errors
//!
//! A tool exiting non-zero and a comparison mismatch are ordinary outcomes
//! (`RunOutcome`). `HarnessError` is reserved for the harness itself failing:
//! the workspace cannot be created, a path cannot be resolved, a tool cannot
//! be launched, or a file cannot be read.

mod config;

pub use config::HarnessConfig;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use crate::compare::{self, ComparisonMode, ComparisonVerdict};
use crate::process::{self, ProcessResult, Tool, ToolRunner};
use crate::workspace::{self, Workspace};

/// Failures of the harness itself (as opposed to the tools under test).
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("cannot prepare workspace '{}'", path.display())]
    #[diagnostic(
        code(roundtrip::workspace),
        help("pass a --workdir that is a directory (or does not exist yet) and is writable")
    )]
    Workspace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{tool} could not be launched: '{}'", program.display())]
    #[diagnostic(code(roundtrip::launch), help("check that the path exists and is executable"))]
    Launch {
        tool: Tool,
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot resolve '{}' against the current directory", path.display())]
    #[diagnostic(code(roundtrip::resolve))]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read '{}'", path.display())]
    #[diagnostic(code(roundtrip::read))]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Position of a run in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Init,
    Compiled,
    Decompiled,
    Compared,
    Passed,
    Failed,
}

impl RunStage {
    /// Whether `self -> next` is a legal transition.
    pub fn can_advance_to(self, next: RunStage) -> bool {
        use RunStage::*;
        matches!(
            (self, next),
            (Init, Compiled)
                | (Compiled, Decompiled)
                | (Decompiled, Compared)
                | (Compared, Passed)
                | (Init | Compiled | Decompiled | Compared, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunStage::Passed | RunStage::Failed)
    }
}

/// How a completed run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The round trip preserved the source under `mode`
    Passed { mode: ComparisonMode, source_name: String },
    /// One of the tools exited unsuccessfully
    ToolFailed { tool: Tool, result: ProcessResult },
    /// The round-tripped source differs from the original
    Mismatch { mode: ComparisonMode, diff: String },
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, RunOutcome::Passed { .. })
    }
}

/// A finished run: its outcome and the stages it went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub stages: Vec<RunStage>,
    /// Workspace directory used by the run (may already be removed)
    pub workspace: PathBuf,
}

/// One round-trip verification.
pub struct RoundTrip<'r> {
    config: HarnessConfig,
    runner: &'r dyn ToolRunner,
}

impl<'r> RoundTrip<'r> {
    /// A run that launches tools through `runner`.
    pub fn with_runner(config: HarnessConfig, runner: &'r dyn ToolRunner) -> Self {
        Self { config, runner }
    }

    /// Execute the run to a terminal stage.
    #[tracing::instrument(skip_all, fields(source = %self.config.source.display(), mode = %self.config.mode))]
    pub fn run(&self) -> Result<RunReport, HarnessError> {
        let config = &self.config;
        let mut stages = StageLog::new();

        let source = workspace::absolutize(&config.source).map_err(|source| HarnessError::Resolve {
            path: config.source.clone(),
            source,
        })?;
        let compiler = resolve_tool(&config.compiler)?;
        let decompiler = resolve_tool(&config.decompiler)?;

        let ws = workspace::prepare(&config.workdir).map_err(|source| HarnessError::Workspace {
            path: config.workdir.clone(),
            source,
        })?;

        let compiled = process::run_compiler(self.runner, &compiler, &source, &ws.artifact_path(), ws.root())
            .map_err(|source| HarnessError::Launch {
                tool: Tool::Compiler,
                program: compiler.clone(),
                source,
            })?;
        if !compiled.success() {
            return Ok(self.fail_with_tool(ws, stages, Tool::Compiler, compiled));
        }
        stages.advance(RunStage::Compiled);

        let decompiled = process::run_decompiler(
            self.runner,
            &decompiler,
            &ws.artifact_path(),
            &ws.roundtrip_path(),
            ws.root(),
        )
        .map_err(|source| HarnessError::Launch {
            tool: Tool::Decompiler,
            program: decompiler.clone(),
            source,
        })?;
        if !decompiled.success() {
            return Ok(self.fail_with_tool(ws, stages, Tool::Decompiler, decompiled));
        }
        stages.advance(RunStage::Decompiled);

        let original = read(&source)?;
        let round_tripped = read(&ws.roundtrip_path())?;
        let verdict = compare::compare(config.mode, &original, &round_tripped);
        stages.advance(RunStage::Compared);

        let passed = verdict.is_equal();
        stages.advance(if passed { RunStage::Passed } else { RunStage::Failed });
        tracing::debug!(passed, "comparison finished");

        let outcome = match verdict {
            ComparisonVerdict::Equal { mode } => RunOutcome::Passed {
                mode,
                source_name: config.source_name(),
            },
            ComparisonVerdict::Mismatch { mode, diff } => RunOutcome::Mismatch { mode, diff },
        };

        let root = ws.root().to_path_buf();
        workspace::finalize(ws, passed, config.retain);

        Ok(RunReport {
            outcome,
            stages: stages.into_inner(),
            workspace: root,
        })
    }

    fn fail_with_tool(&self, ws: Workspace, mut stages: StageLog, tool: Tool, result: ProcessResult) -> RunReport {
        tracing::debug!(%tool, rc = %result.exit_label(), "tool failed");
        stages.advance(RunStage::Failed);
        let root = ws.root().to_path_buf();
        workspace::finalize(ws, false, self.config.retain);
        RunReport {
            outcome: RunOutcome::ToolFailed { tool, result },
            stages: stages.into_inner(),
            workspace: root,
        }
    }
}

/// Stages visited so far; transitions are checked in debug builds.
struct StageLog(Vec<RunStage>);

impl StageLog {
    fn new() -> Self {
        Self(vec![RunStage::Init])
    }

    fn advance(&mut self, next: RunStage) {
        let current = self.0.last().copied().unwrap_or(RunStage::Init);
        debug_assert!(
            current.can_advance_to(next),
            "INVARIANT: illegal run transition {current:?} -> {next:?}"
        );
        tracing::trace!(from = ?current, to = ?next, "stage");
        self.0.push(next);
    }

    fn into_inner(self) -> Vec<RunStage> {
        debug_assert!(
            self.0.last().is_some_and(|stage| stage.is_terminal()),
            "INVARIANT: run ended in a non-terminal stage {:?}",
            self.0.last()
        );
        self.0
    }
}

/// Tools given as relative paths with a directory part are anchored to the
/// current directory, since they are launched from inside the workspace.
/// Bare names are left alone and resolved through `PATH`.
fn resolve_tool(program: &Path) -> Result<PathBuf, HarnessError> {
    if program.is_absolute() || program.components().count() <= 1 {
        return Ok(program.to_path_buf());
    }
    workspace::absolutize(program).map_err(|source| HarnessError::Resolve {
        path: program.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<Vec<u8>, HarnessError> {
    fs::read(path).map_err(|source| HarnessError::Read {
        path: path.to_path_buf(),
        source,
    })
}
