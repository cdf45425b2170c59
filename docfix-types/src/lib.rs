//! Shared DTOs for the docfix workspace.
//!
//! # Design constraints
//! - Violations are immutable once parsed; their line/column always address the
//!   original file content.
//! - A [`Fix`](fix::Fix) is a plan, never a mutation. Only `docfix-edit` turns fixes into
//!   file changes.
//! - Everything here serializes, so reporting layers can emit results as JSON.

pub mod fix;
pub mod result;
pub mod violation;

pub use fix::{Fix, FixStrategy, FixType};
pub use result::{ProcessingResult, ResultSummary};
pub use violation::{Severity, Violation};

/// Schema identifiers.
pub mod schema {
    pub const DOCFIX_RESULT_V1: &str = "docfix.result.v1";
}
