//! Domain logic: turn linter violations into fix plans.
//!
//! This crate owns *what* should be fixed and whether a fix is safe in context.
//! It does not own *how* edits are applied; that's the `docfix-edit` crate.

mod registry;
mod rule;
mod rules;
pub mod scope;

pub use registry::RuleRegistry;
pub use rule::Rule;
pub use rules::{ContentTypeRule, EntityReferenceRule, FlagOnlyRule, builtin_rules};
