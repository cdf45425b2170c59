use docfix_types::{Fix, FixType, Violation};

/// A remediation rule.
///
/// Rules are stateless and long-lived: one instance per name, shared across
/// worker threads for the whole run.
pub trait Rule: Send + Sync {
    /// Matches the final segment of the linter's check id.
    fn name(&self) -> &str;

    fn fix_type(&self) -> FixType;

    /// Rules that should run before this one. An ordering hint, not a gate.
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    fn can_fix(&self, violation: &Violation) -> bool;

    /// Plan a fix for `violation` given the file's full original content.
    fn generate_fix(&self, violation: &Violation, content: &str) -> Option<Fix>;
}
