use docfix_types::{Severity, Violation};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Aggregate counts over a batch of violations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertStats {
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_rule: BTreeMap<String, usize>,
    pub files: usize,
}

impl AlertStats {
    pub fn from_violations(violations: &[Violation]) -> Self {
        let mut by_severity = BTreeMap::new();
        let mut by_rule = BTreeMap::new();
        let mut files = BTreeSet::new();

        for v in violations {
            *by_severity.entry(v.severity).or_insert(0) += 1;
            *by_rule.entry(v.rule_name.clone()).or_insert(0) += 1;
            files.insert(v.file.as_path());
        }

        Self {
            total: violations.len(),
            by_severity,
            by_rule,
            files: files.len(),
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    /// Rules ordered by descending count; ties break on name.
    pub fn most_common_rules(&self, n: usize) -> Vec<(&str, usize)> {
        let mut rules: Vec<(&str, usize)> = self
            .by_rule
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        rules.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rules.truncate(n);
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn v(file: &str, rule: &str, severity: Severity) -> Violation {
        Violation {
            file: file.into(),
            rule_name: rule.into(),
            line: 1,
            column: 1,
            message: String::new(),
            severity,
            original_text: String::new(),
            suggested_text: None,
            check_id: format!("S.{rule}"),
            link: None,
        }
    }

    #[test]
    fn stats_count_severities_rules_and_files() {
        let stats = AlertStats::from_violations(&[
            v("a.adoc", "EntityReference", Severity::Error),
            v("a.adoc", "EntityReference", Severity::Error),
            v("b.adoc", "ContentType", Severity::Warning),
        ]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.count(Severity::Error), 2);
        assert_eq!(stats.count(Severity::Warning), 1);
        assert_eq!(stats.count(Severity::Suggestion), 0);
        assert_eq!(stats.files, 2);
        assert_eq!(stats.by_rule.get("EntityReference"), Some(&2));
    }

    #[test]
    fn most_common_rules_sorts_by_count_then_name() {
        let stats = AlertStats::from_violations(&[
            v("a.adoc", "B", Severity::Error),
            v("a.adoc", "A", Severity::Error),
            v("a.adoc", "C", Severity::Error),
            v("a.adoc", "C", Severity::Error),
        ]);
        assert_eq!(stats.most_common_rules(2), vec![("C", 2), ("A", 1)]);
    }

    #[test]
    fn empty_input_yields_zeroes() {
        assert_eq!(AlertStats::from_violations(&[]), AlertStats::default());
    }
}
