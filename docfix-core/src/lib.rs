//! Embeddable core library for docfix.
//!
//! Provides a clap-free entry point suitable for linking into an editor
//! integration, a CI job or the `docfix` binary.
//!
//! # Port traits
//!
//! The external linter is abstracted behind [`LinterPort`](ports::LinterPort).
//! The [`adapters`] module provides a process-backed implementation for Vale
//! and an in-memory one for embedding and tests.
//!
//! # Entry point
//!
//! - [`Pipeline::process_files`](pipeline::Pipeline::process_files): lint a
//!   batch, plan fixes and (unless dry-run) apply them

pub mod adapters;
pub mod interrupt;
pub mod pipeline;
pub mod ports;
pub mod settings;

pub use interrupt::Interrupt;
pub use pipeline::{Pipeline, ToolError};

// Re-export the shared model so embedders don't need docfix-types directly.
pub use docfix_types::{Fix, FixType, ProcessingResult, ResultSummary, Severity, Violation};

// Re-export the registry so callers can customise the rule set.
pub use docfix_domain::{Rule, RuleRegistry};
