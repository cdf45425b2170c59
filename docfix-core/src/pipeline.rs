//! The lint → plan → apply pipeline.
//!
//! One linter call covers the whole batch. Each file with violations then
//! becomes an independent unit on a bounded pool of blocking workers: fix
//! computation runs unsynchronized, and only the apply-and-record tail of a
//! unit takes the shared lock.

use crate::interrupt::Interrupt;
use crate::ports::LinterPort;
use crate::settings::PipelineSettings;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use docfix_alerts::{AlertParser, group_by_file};
use docfix_domain::{Rule, RuleRegistry};
use docfix_edit::{BackupArea, EditError, FileCache, TextEncoding, apply_fixes};
use docfix_types::{Fix, ProcessingResult, Violation};
use fs_err as fs;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Error type for callers that want a pass/fail verdict from a result.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("interrupted before all files were processed")]
    Interrupted,
    #[error("{count} error(s) while processing files")]
    Failed { count: usize },
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    /// Conventional process exit code: 130 for interruption, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::Interrupted => 130,
            ToolError::Failed { .. } | ToolError::Internal(_) => 1,
        }
    }

    /// Verdict for a finished run. Errors take precedence over interruption.
    pub fn check(result: &ProcessingResult) -> Result<(), ToolError> {
        if result.has_errors() {
            return Err(ToolError::Failed {
                count: result.errors.len(),
            });
        }
        if result.interrupted {
            return Err(ToolError::Interrupted);
        }
        Ok(())
    }
}

/// State guarded by the pipeline's single coarse lock.
struct Shared {
    result: ProcessingResult,
    backup: BackupArea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitStatus {
    Done,
    Failed,
    Interrupted,
}

/// Everything one file unit needs, cheap to clone into a worker.
#[derive(Clone)]
struct UnitContext {
    rules: Arc<[Arc<dyn Rule>]>,
    registry: Arc<RuleRegistry>,
    cache: Arc<FileCache>,
    shared: Arc<Mutex<Shared>>,
    interrupt: Interrupt,
    dry_run: bool,
    fallback: bool,
}

pub struct Pipeline {
    registry: Arc<RuleRegistry>,
    ordered: Arc<[Arc<dyn Rule>]>,
    linter: Arc<dyn LinterPort>,
    settings: PipelineSettings,
    interrupt: Interrupt,
    cache: Arc<FileCache>,
}

impl Pipeline {
    pub fn new(
        registry: RuleRegistry,
        linter: Arc<dyn LinterPort>,
        settings: PipelineSettings,
        interrupt: Interrupt,
    ) -> Self {
        let ordered: Arc<[Arc<dyn Rule>]> = registry.rules_in_dependency_order().into();
        let cache = Arc::new(FileCache::new(settings.max_file_bytes));
        Self {
            registry: Arc::new(registry),
            ordered,
            linter,
            settings,
            interrupt,
            cache,
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    /// Lint `files`, plan fixes and, unless `dry_run`, apply them.
    ///
    /// With `rule_filter`, only that rule runs and only its violations are
    /// reported. Never fails: linter and per-file problems end up in
    /// `errors`, and an interrupted run returns what it has so far.
    pub async fn process_files(
        &self,
        files: &[Utf8PathBuf],
        dry_run: bool,
        rule_filter: Option<&str>,
    ) -> ProcessingResult {
        let mut result = ProcessingResult::new();

        let violations = match self.lint(files).await {
            Ok(v) => v,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "linting failed");
                result.errors.push(format!("{err:#}"));
                result.ended_at = Some(Utc::now());
                return result;
            }
        };

        let violations: Vec<Violation> = match rule_filter {
            Some(name) => violations
                .into_iter()
                .filter(|v| v.rule_name == name)
                .collect(),
            None => violations,
        };
        let by_file = group_by_file(&violations);
        result.violations = violations;
        info!(
            violations = result.violations.len(),
            files = by_file.len(),
            dry_run,
            "planning fixes"
        );

        let rules: Arc<[Arc<dyn Rule>]> = self
            .ordered
            .iter()
            .filter(|r| rule_filter.is_none_or(|name| r.name() == name))
            .cloned()
            .collect();

        let shared = Arc::new(Mutex::new(Shared {
            result,
            backup: BackupArea::new(
                self.settings.working_dir.clone(),
                self.settings.backup_root.clone(),
            ),
        }));
        let ctx = UnitContext {
            rules,
            registry: Arc::clone(&self.registry),
            cache: Arc::clone(&self.cache),
            shared: Arc::clone(&shared),
            interrupt: self.interrupt.clone(),
            dry_run,
            fallback: rule_filter.is_none(),
        };

        let interrupted = self.run_units(&ctx, by_file).await;
        drop(ctx);

        let mut state = lock(&shared);
        let mut result = std::mem::take(&mut state.result);
        result.interrupted = interrupted;
        result.backup_dir = state.backup.dir().map(Utf8Path::to_path_buf);
        result.ended_at = Some(Utc::now());

        let summary = result.summary();
        info!(
            processed = summary.files_processed,
            modified = summary.files_modified,
            applied = summary.fixes_applied,
            skipped = summary.fixes_skipped,
            errors = summary.errors,
            interrupted,
            "run finished"
        );
        result
    }

    async fn lint(&self, files: &[Utf8PathBuf]) -> anyhow::Result<Vec<Violation>> {
        let linter = Arc::clone(&self.linter);
        let batch = files.to_vec();
        let raw = tokio::task::spawn_blocking(move || linter.run(&batch))
            .await
            .context("linter task panicked")?
            .context("run linter")?;

        let parser = AlertParser::new(self.settings.working_dir.clone());
        let violations = parser.parse(&raw).context("parse linter output")?;
        Ok(violations)
    }

    /// Drive the bounded worker pool. Returns true if any unit was cut short
    /// or never started because of an interrupt.
    async fn run_units(&self, ctx: &UnitContext, by_file: Vec<(Utf8PathBuf, Vec<Violation>)>) -> bool {
        let total = by_file.len();
        let workers = self.settings.worker_count(total);
        debug!(units = total, workers, "starting file units");

        let spawn = |(path, violations): (Utf8PathBuf, Vec<Violation>)| -> JoinHandle<UnitStatus> {
            let ctx = ctx.clone();
            tokio::task::spawn_blocking(move || process_file(&ctx, &path, &violations))
        };

        let mut pending = by_file.into_iter();
        let mut running = FuturesUnordered::new();
        let mut interrupted = false;

        // Fill initial pool up to the worker count.
        for _ in 0..workers {
            if ctx.interrupt.is_set() {
                break;
            }
            match pending.next() {
                Some(unit) => running.push(spawn(unit)),
                None => break,
            }
        }

        // Refill as units complete; once interrupted, only drain.
        while let Some(joined) = running.next().await {
            match joined {
                Ok(UnitStatus::Interrupted) => interrupted = true,
                Ok(UnitStatus::Done | UnitStatus::Failed) => {}
                Err(err) => {
                    warn!(error = %err, "file unit panicked");
                    lock(&ctx.shared)
                        .result
                        .errors
                        .push(format!("file unit panicked: {err}"));
                }
            }

            if ctx.interrupt.is_set() {
                continue;
            }
            if let Some(unit) = pending.next() {
                running.push(spawn(unit));
            }
        }

        let never_started = pending.len();
        if never_started > 0 {
            warn!(never_started, "interrupted, remaining files not started");
            interrupted = true;
        }
        interrupted
    }
}

/// One file's unit of work: compute fixes, then apply and record them under
/// the shared lock.
fn process_file(ctx: &UnitContext, path: &Utf8Path, violations: &[Violation]) -> UnitStatus {
    let doc = match ctx.cache.read(path) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(path = %path, error = %err, "cannot read file");
            lock(&ctx.shared).result.errors.push(format!("{path}: {err}"));
            return UnitStatus::Failed;
        }
    };

    let fixes = compute_fixes(ctx, violations, &doc.text);
    debug!(path = %path, violations = violations.len(), fixes = fixes.len(), "computed fixes");

    if ctx.interrupt.is_set() {
        debug!(path = %path, "interrupted before applying fixes");
        return UnitStatus::Interrupted;
    }

    let mut shared = lock(&ctx.shared);
    shared.result.files_processed.insert(path.to_path_buf());

    if ctx.dry_run || fixes.is_empty() {
        shared.result.fixes_skipped.extend(fixes);
        return UnitStatus::Done;
    }

    if let Err(err) = shared.backup.backup(path) {
        warn!(path = %path, error = %format!("{err:#}"), "backup failed, continuing");
    }

    let outcome = apply_fixes(&doc.text, fixes);
    shared.result.fixes_skipped.extend(outcome.skipped);
    if outcome.content == *doc.text {
        shared.result.fixes_applied.extend(outcome.applied);
        return UnitStatus::Done;
    }

    match write_document(path, &outcome.content, doc.encoding) {
        Ok(()) => {
            info!(path = %path, applied = outcome.applied.len(), "file updated");
            shared.result.files_modified.insert(path.to_path_buf());
            shared.result.fixes_applied.extend(outcome.applied);
            UnitStatus::Done
        }
        Err(err) => {
            warn!(path = %path, error = %err, "write failed");
            shared.result.errors.push(format!("{path}: {err}"));
            shared.result.fixes_skipped.extend(outcome.applied);
            UnitStatus::Failed
        }
    }
}

/// Rules run in dependency order over the violations reported under their
/// own name. Violations whose name matches no registered rule are offered to
/// any rule that volunteers.
fn compute_fixes(ctx: &UnitContext, violations: &[Violation], content: &str) -> Vec<Fix> {
    let mut fixes = Vec::new();
    for rule in ctx.rules.iter() {
        for violation in violations.iter().filter(|v| v.rule_name == rule.name()) {
            fixes.extend(rule.generate_fix(violation, content));
        }
    }

    if ctx.fallback {
        for violation in violations
            .iter()
            .filter(|v| ctx.registry.rule(&v.rule_name).is_none())
        {
            if let Some(rule) = ctx.registry.rule_for_violation(violation) {
                fixes.extend(rule.generate_fix(violation, content));
            }
        }
    }
    fixes
}

fn write_document(
    path: &Utf8Path,
    content: &str,
    encoding: TextEncoding,
) -> Result<(), EditError> {
    let bytes = encoding.encode(content).ok_or_else(|| EditError::Encode {
        path: path.to_path_buf(),
        encoding: encoding.as_str(),
    })?;
    fs::write(path, bytes)?;
    Ok(())
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
