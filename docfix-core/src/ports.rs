//! Port traits abstracting the external linter away from the pipeline.

use camino::Utf8PathBuf;

/// Runs the external linter over a batch of files.
///
/// One blocking call per batch; the returned string is the linter's raw JSON
/// payload. Implementations are shared with blocking worker threads.
pub trait LinterPort: Send + Sync {
    fn run(&self, files: &[Utf8PathBuf]) -> anyhow::Result<String>;
}
