use crate::rule::Rule;
use docfix_types::{Fix, FixStrategy, FixType, Violation};

pub const ANNOTATION_PREFIX: &str = "// docfix:";

/// Leaves a review comment above the violation instead of changing content.
///
/// Used for checks whose resolution needs an author's judgement.
#[derive(Debug, Clone, Copy)]
pub struct FlagOnlyRule {
    name: &'static str,
    dependencies: &'static [&'static str],
}

impl FlagOnlyRule {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            dependencies: &[],
        }
    }

    pub const fn with_dependencies(mut self, dependencies: &'static [&'static str]) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// The single comment line written for `violation`.
    pub fn annotation(violation: &Violation) -> String {
        let message = violation.message.replace(['\r', '\n'], " ");
        format!(
            "{ANNOTATION_PREFIX} {} [{}] {}",
            violation.check_id,
            violation.severity,
            message.trim()
        )
    }
}

impl Rule for FlagOnlyRule {
    fn name(&self) -> &str {
        self.name
    }

    fn fix_type(&self) -> FixType {
        FixType::NonDeterministic
    }

    fn dependencies(&self) -> &[&'static str] {
        self.dependencies
    }

    fn can_fix(&self, violation: &Violation) -> bool {
        violation.rule_name == self.name
    }

    fn generate_fix(&self, violation: &Violation, content: &str) -> Option<Fix> {
        let annotation = Self::annotation(violation);

        // Already flagged on a previous run.
        let line_idx = violation.line_index();
        if line_idx > 0
            && content
                .lines()
                .nth(line_idx - 1)
                .is_some_and(|above| above.trim() == annotation)
        {
            return None;
        }

        Some(
            Fix::new(
                violation.clone(),
                annotation,
                FixStrategy::InsertCommentAbove,
                FixType::NonDeterministic,
            )
            .with_review(true)
            .with_description(format!("Flag {} for manual review", self.name)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfix_types::Severity;
    use pretty_assertions::assert_eq;

    fn violation(line: usize) -> Violation {
        Violation {
            file: "a.adoc".into(),
            rule_name: "ShortDescription".into(),
            line,
            column: 1,
            message: "Assign [role=\"_abstract\"]\nto a paragraph.".into(),
            severity: Severity::Warning,
            original_text: String::new(),
            suggested_text: None,
            check_id: "AsciiDocDITA.ShortDescription".into(),
            link: None,
        }
    }

    #[test]
    fn annotation_carries_check_severity_and_message() {
        let rule = FlagOnlyRule::new("ShortDescription");
        let fix = rule.generate_fix(&violation(2), "= Title\nBody\n").unwrap();
        assert_eq!(
            fix.replacement,
            "// docfix: AsciiDocDITA.ShortDescription [warning] Assign [role=\"_abstract\"] to a paragraph."
        );
        assert_eq!(fix.strategy, FixStrategy::InsertCommentAbove);
        assert!(fix.requires_review);
        assert_eq!(fix.confidence, 1.0);
    }

    #[test]
    fn existing_annotation_is_not_duplicated() {
        let rule = FlagOnlyRule::new("ShortDescription");
        let content = format!("= Title\n{}\nBody\n", FlagOnlyRule::annotation(&violation(3)));
        assert!(rule.generate_fix(&violation(3), &content).is_none());
    }

    #[test]
    fn only_claims_its_own_name() {
        let rule = FlagOnlyRule::new("BlockTitle");
        assert!(!rule.can_fix(&violation(1)));
        assert!(FlagOnlyRule::new("ShortDescription").can_fix(&violation(1)));
    }
}
