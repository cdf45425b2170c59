//! Default linter port implementations.

use crate::ports::LinterPort;
use crate::settings::LinterSettings;
use anyhow::{Context, bail};
use camino::Utf8PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Runs the linter as a child process and returns its stdout.
///
/// Vale exits with status 1 when it found alerts; that is treated as success
/// as long as it produced output. Any other non-zero status is a failure.
#[derive(Debug, Clone)]
pub struct CommandLinter {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<Utf8PathBuf>,
}

impl CommandLinter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    pub fn from_settings(settings: &LinterSettings, working_dir: Utf8PathBuf) -> Self {
        Self {
            program: settings.program.clone(),
            args: settings.args.clone(),
            working_dir: Some(working_dir),
        }
    }
}

impl Default for CommandLinter {
    fn default() -> Self {
        let defaults = LinterSettings::default();
        Self::new(defaults.program, defaults.args)
    }
}

impl LinterPort for CommandLinter {
    fn run(&self, files: &[Utf8PathBuf]) -> anyhow::Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).args(files);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        debug!(program = %self.program, files = files.len(), "running linter");
        let output = cmd
            .output()
            .with_context(|| format!("run {}", self.program))?;

        let stdout = String::from_utf8(output.stdout)
            .with_context(|| format!("{} output is not UTF-8", self.program))?;
        let found_alerts = output.status.code() == Some(1) && !stdout.trim().is_empty();
        if !output.status.success() && !found_alerts {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }

        if stdout.trim().is_empty() {
            return Ok("{}".to_string());
        }
        Ok(stdout)
    }
}

/// Returns a canned payload (or failure) for embedding and testing.
#[derive(Debug)]
pub struct InMemoryLinter {
    payload: Result<String, String>,
    calls: AtomicUsize,
}

impl InMemoryLinter {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: Ok(payload.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A linter whose every run fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            payload: Err(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times [`run`](LinterPort::run) has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LinterPort for InMemoryLinter {
    fn run(&self, _files: &[Utf8PathBuf]) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.payload {
            Ok(payload) => Ok(payload.clone()),
            Err(message) => bail!("{message}"),
        }
    }
}
