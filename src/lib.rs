#![forbid(unsafe_code)]
//! QBIN round-trip verification harness
//!
//! Proves that compiling a QASM source to QBIN and decompiling it again gives
//! back the same source, either byte-for-byte or after normalization, and
//! explains the difference when it does not.
//!
//! The pipeline is strictly sequential:
//!
//! 1. `workspace` - prepare the run's directory
//! 2. `process` - run the compiler, then the decompiler
//! 3. `compare` - judge the round-tripped source, render a diff on mismatch
//! 4. `workspace` - clean up on success, keep everything on failure
//!
//! `harness` drives these steps; `cli` is the command-line surface.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: If a panic represents a harness bug (logic error), use `.expect("INVARIANT: reason")` or a
//!   `debug_assert!` with a clear explanation.

pub mod cli;
pub mod compare;
pub mod harness;
pub mod process;
pub mod version;
pub mod workspace;

pub use compare::{ComparisonMode, ComparisonVerdict, compare_exact, compare_normalized, normalize};
pub use harness::{HarnessConfig, HarnessError, RoundTrip, RunOutcome, RunReport, RunStage};
pub use process::{ProcessResult, SystemToolRunner, Tool, ToolRunner};
pub use workspace::Workspace;
