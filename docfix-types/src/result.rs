use crate::fix::{Fix, FixType};
use crate::violation::Violation;
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Aggregate outcome of one pipeline invocation.
///
/// Built once per run and handed to reporting layers; an interrupted run still
/// yields a valid (partial) result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub schema: String,

    pub violations: Vec<Violation>,

    pub fixes_applied: Vec<Fix>,

    /// Fixes that were computed but not written (dry-run, or target no longer locatable).
    pub fixes_skipped: Vec<Fix>,

    pub files_processed: BTreeSet<Utf8PathBuf>,

    pub files_modified: BTreeSet<Utf8PathBuf>,

    pub errors: Vec<String>,

    #[serde(default)]
    pub interrupted: bool,

    /// Per-run backup directory, present only when a file was backed up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<Utf8PathBuf>,

    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Default for ProcessingResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingResult {
    pub fn new() -> Self {
        Self {
            schema: crate::schema::DOCFIX_RESULT_V1.to_string(),
            violations: Vec::new(),
            fixes_applied: Vec::new(),
            fixes_skipped: Vec::new(),
            files_processed: BTreeSet::new(),
            files_modified: BTreeSet::new(),
            errors: Vec::new(),
            interrupted: false,
            backup_dir: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            violations: self.violations.len() as u64,
            fixes_applied: self.fixes_applied.len() as u64,
            fixes_skipped: self.fixes_skipped.len() as u64,
            review_required: self
                .fixes_applied
                .iter()
                .chain(&self.fixes_skipped)
                .filter(|f| f.requires_review)
                .count() as u64,
            files_processed: self.files_processed.len() as u64,
            files_modified: self.files_modified.len() as u64,
            errors: self.errors.len() as u64,
        }
    }

    /// Applied and skipped fixes counted per determinism class.
    pub fn fix_type_counts(&self) -> BTreeMap<FixType, u64> {
        let mut counts = BTreeMap::new();
        for fix in self.fixes_applied.iter().chain(&self.fixes_skipped) {
            *counts.entry(fix.fix_type).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub violations: u64,
    pub fixes_applied: u64,
    pub fixes_skipped: u64,
    pub review_required: u64,
    pub files_processed: u64,
    pub files_modified: u64,
    pub errors: u64,
}
