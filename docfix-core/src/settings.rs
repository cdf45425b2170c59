//! Clap-free settings for the pipeline.

use camino::Utf8PathBuf;
use docfix_edit::DEFAULT_MAX_FILE_BYTES;

/// Upper bound on concurrent file units, whatever is configured.
pub const MAX_WORKERS_CAP: usize = 8;

/// How to invoke the external linter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinterSettings {
    pub program: String,
    /// Arguments placed before the file list.
    pub args: Vec<String>,
}

impl Default for LinterSettings {
    fn default() -> Self {
        Self {
            program: "vale".to_string(),
            args: vec!["--output=JSON".to_string()],
        }
    }
}

/// Settings for [`Pipeline`](crate::pipeline::Pipeline).
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Relative paths in linter output resolve against this directory, and
    /// backups mirror paths relative to it.
    pub working_dir: Utf8PathBuf,

    pub max_workers: usize,

    /// Files larger than this are reported as errors instead of being read.
    pub max_file_bytes: u64,

    /// Parent for the per-run backup directory (system temp dir if unset).
    pub backup_root: Option<Utf8PathBuf>,

    pub linter: LinterSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            working_dir: Utf8PathBuf::from("."),
            max_workers: MAX_WORKERS_CAP,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            backup_root: None,
            linter: LinterSettings::default(),
        }
    }
}

impl PipelineSettings {
    /// Pool size for a batch of `files` units: at least one, at most the cap.
    pub fn worker_count(&self, files: usize) -> usize {
        self.max_workers.clamp(1, MAX_WORKERS_CAP).min(files.max(1))
    }
}
