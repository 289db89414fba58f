//! Console reporting for round-trip runs
//!
//! ## RunReporter Trait
//!
//! The CLI separates reporting from execution through `RunReporter`. The
//! default `ConsoleReporter` prints the one-line summary on stdout and every
//! failure diagnostic on stderr; other front ends can implement the trait to
//! emit a different format.

use std::io::{self, Write};

use crate::compare::ComparisonMode;
use crate::harness::RunOutcome;
use crate::process::{ProcessResult, Tool};

/// Trait for reporting how a run ended.
pub trait RunReporter {
    /// The round trip preserved the source
    fn on_passed(&mut self, mode: ComparisonMode, source_name: &str);

    /// A tool exited unsuccessfully; its output must be shown verbatim
    fn on_tool_failed(&mut self, tool: Tool, result: &ProcessResult);

    /// The sources differ
    fn on_mismatch(&mut self, mode: ComparisonMode, diff: &str);

    /// Dispatch an outcome to the matching callback
    fn report(&mut self, outcome: &RunOutcome) {
        match outcome {
            RunOutcome::Passed { mode, source_name } => self.on_passed(*mode, source_name),
            RunOutcome::ToolFailed { tool, result } => self.on_tool_failed(*tool, result),
            RunOutcome::Mismatch { mode, diff } => self.on_mismatch(*mode, diff),
        }
    }
}

/// Plain-text reporter writing to an output and a diagnostic stream.
pub struct ConsoleReporter<O: Write, E: Write> {
    out: O,
    err: E,
}

impl ConsoleReporter<io::Stdout, io::Stderr> {
    /// Reporter bound to the process's stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> ConsoleReporter<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    /// Give back the underlying streams.
    pub fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}

// Reporting is the last thing a run does; a closed stdout/stderr has nowhere
// left to be reported, so write errors are dropped.
impl<O: Write, E: Write> RunReporter for ConsoleReporter<O, E> {
    fn on_passed(&mut self, mode: ComparisonMode, source_name: &str) {
        let _ = writeln!(self.out, "OK ({mode}) - {source_name}");
        let _ = self.out.flush();
    }

    fn on_tool_failed(&mut self, tool: Tool, result: &ProcessResult) {
        let _ = writeln!(
            self.err,
            "{tool} failed (rc={}):\n{}\n{}",
            result.exit_label(),
            result.stdout,
            result.stderr
        );
        let _ = self.err.flush();
    }

    fn on_mismatch(&mut self, mode: ComparisonMode, diff: &str) {
        let _ = writeln!(self.err, "Mismatch ({mode}). Unified diff:\n{diff}");
        let _ = self.err.flush();
    }
}
