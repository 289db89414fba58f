//! Run configuration

use std::path::PathBuf;

use crate::compare::ComparisonMode;

/// Everything one round-trip run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Compiler executable (source -> artifact)
    pub compiler: PathBuf,
    /// Decompiler executable (artifact -> source)
    pub decompiler: PathBuf,
    /// Original source file
    pub source: PathBuf,
    /// Workspace directory for derived files
    pub workdir: PathBuf,
    /// How the round-tripped source is judged
    pub mode: ComparisonMode,
    /// Keep the workspace even when the run passes
    pub retain: bool,
}

impl HarnessConfig {
    /// Create a config with normalized comparison and cleanup on success.
    pub fn new(
        compiler: impl Into<PathBuf>,
        decompiler: impl Into<PathBuf>,
        source: impl Into<PathBuf>,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            compiler: compiler.into(),
            decompiler: decompiler.into(),
            source: source.into(),
            workdir: workdir.into(),
            mode: ComparisonMode::default(),
            retain: false,
        }
    }

    /// Set the comparison mode
    pub fn with_mode(mut self, mode: ComparisonMode) -> Self {
        self.mode = mode;
        self
    }

    /// Keep (or drop) the workspace after a passing run
    pub fn with_retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    /// File name of the source, for one-line summaries.
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let config = HarnessConfig::new("qbin-compile", "qbin-decompile", "bell.qasm", "work");
        assert_eq!(config.mode, ComparisonMode::Normalized);
        assert!(!config.retain);
        assert_eq!(config.workdir, PathBuf::from("work"));
    }

    #[test]
    fn test_builder_methods() {
        let config = HarnessConfig::new("c", "d", "s.qasm", "w")
            .with_mode(ComparisonMode::Exact)
            .with_retain(true);
        assert_eq!(config.mode, ComparisonMode::Exact);
        assert!(config.retain);
    }

    #[test]
    fn test_source_name_uses_file_name() {
        let config = HarnessConfig::new("c", "d", "/tmp/circuits/bell.qasm", "w");
        assert_eq!(config.source_name(), "bell.qasm");
    }

    #[test]
    fn test_source_name_falls_back_to_path() {
        let config = HarnessConfig::new("c", "d", "/", "w");
        assert_eq!(config.source_name(), "/");
    }
}
