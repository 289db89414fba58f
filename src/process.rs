//! External tool invocation
//!
//! The compiler and decompiler are opaque executables sharing one calling
//! convention: `<tool> <input> -o <output>`, run inside the workspace. This
//! module launches them, waits for them, and hands back what they printed.
//!
//! ## ToolRunner Trait
//!
//! Launching goes through the `ToolRunner` trait so the pipeline can be driven
//! without spawning real processes. `SystemToolRunner` is the real thing.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Which external tool an invocation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Compiler,
    Decompiler,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tool::Compiler => write!(f, "Compiler"),
            Tool::Decompiler => write!(f, "Decompiler"),
        }
    }
}

/// One fully specified tool launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub tool: Tool,
    /// Executable to launch
    pub program: PathBuf,
    /// First positional argument
    pub input: PathBuf,
    /// Argument following `-o`
    pub output: PathBuf,
    /// Working directory for the child
    pub cwd: PathBuf,
}

impl ToolInvocation {
    /// The argument vector passed to the tool, without the program name.
    pub fn args(&self) -> [&Path; 3] {
        [self.input.as_path(), Path::new("-o"), self.output.as_path()]
    }
}

/// Outcome of running one external tool to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit code, or `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessResult {
    /// Only a clean exit with status 0 counts as success.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Exit code as shown in diagnostics (`signal` when there is none).
    pub fn exit_label(&self) -> String {
        match self.exit_code {
            Some(code) => code.to_string(),
            None => "signal".to_string(),
        }
    }
}

/// Launch an external tool and capture its result.
pub trait ToolRunner {
    /// Run the invocation synchronously to completion.
    ///
    /// A non-zero exit is reported through `ProcessResult`; `Err` is reserved
    /// for failures to launch or wait on the process at all.
    fn run(&self, invocation: &ToolInvocation) -> io::Result<ProcessResult>;
}

/// Spawns real child processes with fully buffered stdout/stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> io::Result<ProcessResult> {
        let output = Command::new(&invocation.program)
            .args(invocation.args())
            .current_dir(&invocation.cwd)
            .output()?;

        Ok(ProcessResult {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Compile `source` into `artifact` with the compiler at `compiler`.
#[tracing::instrument(skip_all, fields(compiler = %compiler.display()))]
pub fn run_compiler(
    runner: &dyn ToolRunner,
    compiler: &Path,
    source: &Path,
    artifact: &Path,
    cwd: &Path,
) -> io::Result<ProcessResult> {
    invoke(
        runner,
        ToolInvocation {
            tool: Tool::Compiler,
            program: compiler.to_path_buf(),
            input: source.to_path_buf(),
            output: artifact.to_path_buf(),
            cwd: cwd.to_path_buf(),
        },
    )
}

/// Decompile `artifact` into `output_source` with the decompiler at `decompiler`.
#[tracing::instrument(skip_all, fields(decompiler = %decompiler.display()))]
pub fn run_decompiler(
    runner: &dyn ToolRunner,
    decompiler: &Path,
    artifact: &Path,
    output_source: &Path,
    cwd: &Path,
) -> io::Result<ProcessResult> {
    invoke(
        runner,
        ToolInvocation {
            tool: Tool::Decompiler,
            program: decompiler.to_path_buf(),
            input: artifact.to_path_buf(),
            output: output_source.to_path_buf(),
            cwd: cwd.to_path_buf(),
        },
    )
}

fn invoke(runner: &dyn ToolRunner, invocation: ToolInvocation) -> io::Result<ProcessResult> {
    tracing::debug!(
        tool = %invocation.tool,
        input = %invocation.input.display(),
        output = %invocation.output.display(),
        "launching"
    );

    let result = runner.run(&invocation)?;

    tracing::debug!(tool = %invocation.tool, rc = %result.exit_label(), "finished");
    Ok(result)
}
