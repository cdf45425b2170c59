use crate::violation::Violation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How automatable a rule's fixes are.
///
/// - fully deterministic: a fixed substitution, applied without review
/// - partially deterministic: inferred from context, may fall back to a placeholder
/// - non-deterministic: flag-only, a human has to resolve the issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixType {
    FullyDeterministic,
    PartiallyDeterministic,
    NonDeterministic,
}

impl FixType {
    pub fn is_automatic(self) -> bool {
        matches!(self, FixType::FullyDeterministic)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FixType::FullyDeterministic => "fully_deterministic",
            FixType::PartiallyDeterministic => "partially_deterministic",
            FixType::NonDeterministic => "non_deterministic",
        }
    }
}

impl fmt::Display for FixType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and how a fix lands in the file's line buffer.
///
/// Line indices carried by a strategy are 0-based and address the original content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FixStrategy {
    /// Replace the violation's matched text, searching forward from its column.
    ReplaceAtPosition,
    /// Replace the whole line with the replacement text.
    ReplaceLine { line: usize },
    /// Insert the replacement lines before `line`.
    InsertAtLine { line: usize },
    /// Insert the replacement as a comment line above the violation line.
    InsertCommentAbove,
}

/// A proposed, not-yet-applied text change addressing one violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub violation: Violation,

    pub replacement: String,

    /// Confidence in the fix itself, clamped to `[0, 1]`.
    pub confidence: f64,

    pub requires_review: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Exact text a position replacement removes, when it differs from the
    /// linter's reported match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    pub strategy: FixStrategy,

    pub fix_type: FixType,
}

impl Fix {
    /// A full-confidence fix that needs no review.
    pub fn new(
        violation: Violation,
        replacement: impl Into<String>,
        strategy: FixStrategy,
        fix_type: FixType,
    ) -> Self {
        Self {
            violation,
            replacement: replacement.into(),
            confidence: 1.0,
            requires_review: false,
            description: None,
            target: None,
            strategy,
            fix_type,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }

    pub fn with_review(mut self, requires_review: bool) -> Self {
        self.requires_review = requires_review;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Text a [`FixStrategy::ReplaceAtPosition`] fix looks for on its line.
    pub fn target_text(&self) -> &str {
        self.target
            .as_deref()
            .unwrap_or(&self.violation.original_text)
    }

    /// 0-based line this fix is anchored to, used to order edits bottom-up.
    pub fn anchor_line(&self) -> usize {
        match self.strategy {
            FixStrategy::ReplaceLine { line } | FixStrategy::InsertAtLine { line } => line,
            FixStrategy::ReplaceAtPosition | FixStrategy::InsertCommentAbove => {
                self.violation.line_index()
            }
        }
    }
}
