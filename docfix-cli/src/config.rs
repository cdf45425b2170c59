//! Configuration file loading for docfix.
//!
//! Discovers and loads `docfix.toml` from the working directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use docfix_core::settings::{LinterSettings, PipelineSettings};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "docfix.toml";

/// Top-level configuration from docfix.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocfixConfig {
    pub linter: LinterConfig,
    pub run: RunConfig,
}

/// How to invoke the linter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinterConfig {
    pub program: Option<String>,

    /// Arguments placed before the file list.
    pub args: Option<Vec<String>>,
}

/// Run section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Upper bound on files processed concurrently (capped at 8).
    pub max_workers: Option<usize>,

    /// Files larger than this are skipped with an error.
    pub max_file_bytes: Option<u64>,

    /// Where per-run backup directories are created, relative to the
    /// working directory.
    pub backup_dir: Option<Utf8PathBuf>,
}

/// Discover the docfix.toml config file in `dir`.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a docfix.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<DocfixConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<DocfixConfig> {
    let config: DocfixConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from `dir`, or return default if not found.
pub fn load_or_default(dir: &Utf8Path) -> anyhow::Result<DocfixConfig> {
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(DocfixConfig::default()),
    }
}

/// Run settings given on the command line. `None` defers to the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub linter: Option<String>,
    pub max_workers: Option<usize>,
    pub max_file_bytes: Option<u64>,
    pub backup_dir: Option<Utf8PathBuf>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: DocfixConfig,
}

impl ConfigMerger {
    /// Create a new merger from a loaded config.
    pub fn new(config: DocfixConfig) -> Self {
        Self { config }
    }

    /// Produce pipeline settings for `working_dir`.
    ///
    /// Each CLI value replaces its config file counterpart; anything set in
    /// neither place keeps the pipeline default. Relative backup directories
    /// resolve against `working_dir`.
    pub fn merge_run_args(self, working_dir: &Utf8Path, cli: &RunOverrides) -> PipelineSettings {
        let defaults = PipelineSettings::default();
        let linter_defaults = LinterSettings::default();

        let backup_root = cli
            .backup_dir
            .clone()
            .or(self.config.run.backup_dir)
            .map(|dir| {
                if dir.is_absolute() {
                    dir
                } else {
                    working_dir.join(dir)
                }
            });

        PipelineSettings {
            working_dir: working_dir.to_path_buf(),
            max_workers: cli
                .max_workers
                .or(self.config.run.max_workers)
                .unwrap_or(defaults.max_workers),
            max_file_bytes: cli
                .max_file_bytes
                .or(self.config.run.max_file_bytes)
                .unwrap_or(defaults.max_file_bytes),
            backup_root,
            linter: LinterSettings {
                program: cli
                    .linter
                    .clone()
                    .or(self.config.linter.program)
                    .unwrap_or(linter_defaults.program),
                args: self.config.linter.args.unwrap_or(linter_defaults.args),
            },
        }
    }
}
