use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity reported by the linter, folded into three levels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    #[default]
    Warning,
    Suggestion,
}

impl Severity {
    /// Map a linter severity string. Matching is case-insensitive; anything
    /// unrecognised is treated as the lowest level.
    pub fn from_linter(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "error" | "fatal" => Severity::Error,
            "warning" | "warn" => Severity::Warning,
            _ => Severity::Suggestion,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Suggestion => "suggestion",
        }
    }

    pub const ALL: [Severity; 3] = [Severity::Error, Severity::Warning, Severity::Suggestion];
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single issue reported by the linter at a file/line/column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
    pub file: Utf8PathBuf,

    /// Final dotted segment of `check_id`, e.g. `EntityReference`.
    pub rule_name: String,

    /// 1-based line in the original content.
    pub line: usize,

    /// 1-based column (in characters) in the original content.
    pub column: usize,

    pub message: String,

    pub severity: Severity,

    /// Text the linter matched at the reported position.
    pub original_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_text: Option<String>,

    /// Raw check identifier, e.g. `AsciiDocDITA.EntityReference`.
    pub check_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Violation {
    /// 0-based index of the violation line.
    pub fn line_index(&self) -> usize {
        self.line.saturating_sub(1)
    }

    /// 0-based index of the violation column.
    pub fn column_index(&self) -> usize {
        self.column.saturating_sub(1)
    }
}
