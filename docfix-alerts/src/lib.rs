//! Linter output ingestion.
//!
//! docfix consumes the JSON payload Vale emits with `--output=JSON`. Parsing is
//! intentionally tolerant: a payload that is not an object fails the whole batch,
//! but individual malformed alerts are skipped with a diagnostic so one bad
//! record cannot hide every other finding.
//!
//! Grouping, filtering and statistics are pure functions over parsed
//! [`Violation`](docfix_types::Violation)s, shared with reporting layers.

mod group;
mod parse;
mod stats;

pub use group::{filter_by_severity, group_by_file, group_by_rule};
pub use parse::{AlertParseError, AlertParser, rule_name_from_check};
pub use stats::AlertStats;
