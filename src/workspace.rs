//! Workspace lifecycle
//!
//! A workspace is the directory a single run owns for its intermediate files.
//! It is created (or reused) when the run starts and removed only when the run
//! passed and the caller did not ask to keep it. Failed runs always leave their
//! workspace behind for inspection.
//!
//! Nothing outside this module deletes a workspace.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the compiled artifact inside the workspace.
pub const ARTIFACT_FILE: &str = "out.qbin";
/// File name of the decompiled source inside the workspace.
pub const ROUNDTRIP_FILE: &str = "out.qasm";

/// An exclusively owned directory holding one run's derived files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Absolute path of the workspace directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the compiler writes the binary artifact.
    pub fn artifact_path(&self) -> PathBuf {
        self.root.join(ARTIFACT_FILE)
    }

    /// Where the decompiler writes the round-tripped source.
    pub fn roundtrip_path(&self) -> PathBuf {
        self.root.join(ROUNDTRIP_FILE)
    }
}

/// Ensure the workspace directory exists and return a handle to it.
///
/// Creation is idempotent and includes missing parents. A relative `path` is
/// resolved against the current directory so the tools, which run with the
/// workspace as their working directory, still receive usable paths.
///
/// ## Errors
///
/// - `path` exists but is not a directory (`AlreadyExists`)
/// - the directory cannot be created, e.g. for lack of permissions
pub fn prepare(path: &Path) -> io::Result<Workspace> {
    let root = absolutize(path)?;

    if root.exists() && !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("'{}' exists and is not a directory", root.display()),
        ));
    }

    fs::create_dir_all(&root)?;
    tracing::debug!(workspace = %root.display(), "workspace ready");

    Ok(Workspace { root })
}

/// Finish a run's use of the workspace.
///
/// Removes the directory recursively when `succeeded && !retain`; otherwise
/// leaves it untouched. Removal errors are logged and dropped so that cleanup
/// can never turn a passing run into a failing one.
pub fn finalize(workspace: Workspace, succeeded: bool, retain: bool) {
    if !succeeded {
        tracing::debug!(workspace = %workspace.root.display(), "run failed, keeping workspace");
        return;
    }
    if retain {
        tracing::debug!(workspace = %workspace.root.display(), "keeping workspace on request");
        return;
    }

    if let Err(e) = fs::remove_dir_all(&workspace.root) {
        tracing::warn!(
            workspace = %workspace.root.display(),
            error = %e,
            "could not remove workspace"
        );
    }
}

/// Resolve `path` against the current directory without touching the filesystem.
pub(crate) fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn unique_temp_dir() -> PathBuf {
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let pid = std::process::id();
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("qbin_workspace_test_{}_{pid}_{id}", ts))
    }

    #[test]
    fn test_prepare_creates_nested_directories() {
        let base = unique_temp_dir();
        let nested = base.join("a").join("b");

        let ws = prepare(&nested).unwrap();
        assert!(ws.root().is_dir());
        assert_eq!(ws.artifact_path(), nested.join("out.qbin"));
        assert_eq!(ws.roundtrip_path(), nested.join("out.qasm"));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let dir = unique_temp_dir();
        prepare(&dir).unwrap();
        fs::write(dir.join("leftover.txt"), "x").unwrap();

        let ws = prepare(&dir).unwrap();
        assert!(ws.root().join("leftover.txt").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_prepare_rejects_regular_file() {
        let dir = unique_temp_dir();
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("not_a_dir");
        fs::write(&file, "x").unwrap();

        let err = prepare(&file).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_prepare_makes_relative_paths_absolute() {
        let ws = prepare(Path::new("target/qbin_workspace_relative_test")).unwrap();
        assert!(ws.root().is_absolute());
        let _ = fs::remove_dir_all(ws.root());
    }

    #[test]
    fn test_finalize_removes_on_success() {
        let dir = unique_temp_dir();
        let ws = prepare(&dir).unwrap();
        fs::write(ws.artifact_path(), [0u8, 1, 2]).unwrap();

        finalize(ws, true, false);
        assert!(!dir.exists());
    }

    #[test]
    fn test_finalize_keeps_on_failure() {
        let dir = unique_temp_dir();
        let ws = prepare(&dir).unwrap();

        finalize(ws, false, false);
        assert!(dir.is_dir());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_finalize_keeps_when_retained() {
        let dir = unique_temp_dir();
        let ws = prepare(&dir).unwrap();

        finalize(ws, true, true);
        assert!(dir.is_dir());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_finalize_ignores_missing_directory() {
        let dir = unique_temp_dir();
        let ws = prepare(&dir).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        // Must not panic or report anything to the caller.
        finalize(ws, true, false);
        assert!(!dir.exists());
    }
}
