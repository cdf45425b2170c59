use crate::rule::Rule;
use crate::rules::builtin_rules;
use docfix_types::{FixType, Violation};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Name-indexed set of rules.
///
/// Registration order is preserved and drives both the fallback scan in
/// [`rule_for_violation`](Self::rule_for_violation) and tie-breaking in
/// [`rules_in_dependency_order`](Self::rules_in_dependency_order).
#[derive(Default, Clone)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rule_names())
            .finish()
    }
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry populated with the built-in rule set.
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        for rule in builtin_rules() {
            registry.register(rule);
        }
        registry
    }

    /// Index `rule` by name. A rule with the same name is replaced in place,
    /// keeping its original registration slot.
    pub fn register(&mut self, rule: Arc<dyn Rule>) {
        let name = rule.name().to_string();
        match self.index.get(&name) {
            Some(&slot) => {
                debug!(rule = %name, "replacing previously registered rule");
                self.rules[slot] = rule;
            }
            None => {
                self.index.insert(name, self.rules.len());
                self.rules.push(rule);
            }
        }
    }

    pub fn rule(&self, name: &str) -> Option<Arc<dyn Rule>> {
        self.index.get(name).map(|&slot| Arc::clone(&self.rules[slot]))
    }

    /// Resolve the rule responsible for `violation`.
    ///
    /// The rule registered under the violation's own name wins if it accepts the
    /// violation. Otherwise the first registered rule that volunteers is used,
    /// which lets a rule claim findings reported under a different check name.
    pub fn rule_for_violation(&self, violation: &Violation) -> Option<Arc<dyn Rule>> {
        if let Some(rule) = self.rule(&violation.rule_name)
            && rule.can_fix(violation)
        {
            return Some(rule);
        }

        let volunteer = self.rules.iter().find(|r| r.can_fix(violation)).cloned();
        if let Some(rule) = &volunteer {
            debug!(
                reported = %violation.rule_name,
                claimed_by = rule.name(),
                "violation claimed by fallback rule"
            );
        }
        volunteer
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Depth-first topological order: each rule's registered dependencies come
    /// before it. Unknown dependency names are ignored; cycles are broken at the
    /// first revisit.
    pub fn rules_in_dependency_order(&self) -> Vec<Arc<dyn Rule>> {
        let mut visited = HashSet::with_capacity(self.rules.len());
        let mut ordered = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            self.visit(rule, &mut visited, &mut ordered);
        }
        ordered
    }

    fn visit(
        &self,
        rule: &Arc<dyn Rule>,
        visited: &mut HashSet<String>,
        ordered: &mut Vec<Arc<dyn Rule>>,
    ) {
        if !visited.insert(rule.name().to_string()) {
            return;
        }

        for dep in rule.dependencies() {
            match self.rule(dep) {
                Some(dep_rule) => self.visit(&dep_rule, visited, ordered),
                None => debug!(rule = rule.name(), dependency = *dep, "unknown dependency ignored"),
            }
        }

        ordered.push(Arc::clone(rule));
    }

    /// Rule names grouped by determinism class, in registration order.
    pub fn rules_by_fix_type(&self) -> BTreeMap<FixType, Vec<&str>> {
        let mut out: BTreeMap<FixType, Vec<&str>> = BTreeMap::new();
        for rule in &self.rules {
            out.entry(rule.fix_type()).or_default().push(rule.name());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfix_types::{Fix, FixStrategy, Severity};
    use pretty_assertions::assert_eq;

    struct StubRule {
        name: &'static str,
        deps: &'static [&'static str],
        accepts: &'static str,
        fix_type: FixType,
    }

    impl StubRule {
        fn arc(name: &'static str, deps: &'static [&'static str]) -> Arc<dyn Rule> {
            Arc::new(Self {
                name,
                deps,
                accepts: name,
                fix_type: FixType::NonDeterministic,
            })
        }
    }

    impl Rule for StubRule {
        fn name(&self) -> &str {
            self.name
        }

        fn fix_type(&self) -> FixType {
            self.fix_type
        }

        fn dependencies(&self) -> &[&'static str] {
            self.deps
        }

        fn can_fix(&self, violation: &Violation) -> bool {
            violation.original_text == self.accepts
        }

        fn generate_fix(&self, violation: &Violation, _content: &str) -> Option<Fix> {
            Some(Fix::new(
                violation.clone(),
                self.name,
                FixStrategy::ReplaceAtPosition,
                self.fix_type,
            ))
        }
    }

    fn violation(rule: &str, matched: &str) -> Violation {
        Violation {
            file: "a.adoc".into(),
            rule_name: rule.into(),
            line: 1,
            column: 1,
            message: String::new(),
            severity: Severity::Error,
            original_text: matched.into(),
            suggested_text: None,
            check_id: format!("S.{rule}"),
            link: None,
        }
    }

    fn names(rules: &[Arc<dyn Rule>]) -> Vec<&str> {
        rules.iter().map(|r| r.name()).collect()
    }

    #[test]
    fn register_overwrites_duplicate_names_in_place() {
        let mut registry = RuleRegistry::new();
        registry.register(StubRule::arc("A", &[]));
        registry.register(StubRule::arc("B", &[]));
        registry.register(Arc::new(StubRule {
            name: "A",
            deps: &[],
            accepts: "other",
            fix_type: FixType::FullyDeterministic,
        }));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.rule_names(), vec!["A", "B"]);
        let a = registry.rule("A").unwrap();
        assert_eq!(a.fix_type(), FixType::FullyDeterministic);
    }

    #[test]
    fn dependencies_come_first_regardless_of_registration_order() {
        let mut registry = RuleRegistry::new();
        registry.register(StubRule::arc("Step", &["Type"]));
        registry.register(StubRule::arc("Other", &[]));
        registry.register(StubRule::arc("Type", &[]));

        let ordered = registry.rules_in_dependency_order();
        assert_eq!(names(&ordered), vec!["Type", "Step", "Other"]);
    }

    #[test]
    fn unknown_dependencies_and_cycles_are_tolerated() {
        let mut registry = RuleRegistry::new();
        registry.register(StubRule::arc("A", &["B", "Missing"]));
        registry.register(StubRule::arc("B", &["A"]));

        let ordered = registry.rules_in_dependency_order();
        assert_eq!(names(&ordered), vec!["B", "A"]);
    }

    #[test]
    fn exact_match_wins_when_rule_accepts() {
        let mut registry = RuleRegistry::new();
        registry.register(StubRule::arc("A", &[]));
        registry.register(StubRule::arc("B", &[]));

        let rule = registry.rule_for_violation(&violation("B", "B")).unwrap();
        assert_eq!(rule.name(), "B");
    }

    #[test]
    fn fallback_scan_finds_volunteer_for_other_check_name() {
        let mut registry = RuleRegistry::new();
        registry.register(StubRule::arc("A", &[]));
        registry.register(StubRule::arc("B", &[]));

        let rule = registry
            .rule_for_violation(&violation("Unregistered", "B"))
            .unwrap();
        assert_eq!(rule.name(), "B");

        assert!(registry.rule_for_violation(&violation("A", "nobody")).is_none());
    }

    #[test]
    fn builtin_registry_orders_task_rules_after_content_type() {
        let registry = RuleRegistry::with_builtin_rules();
        let ordered = registry.rules_in_dependency_order();
        let order = names(&ordered);
        let content_type = order.iter().position(|n| *n == "ContentType").unwrap();
        for task in ["TaskSection", "TaskStep", "TaskTitle", "TaskContents", "TaskExample"] {
            let pos = order.iter().position(|n| *n == task).unwrap();
            assert!(pos > content_type, "{task} must run after ContentType");
        }
        assert_eq!(ordered.len(), registry.len());
    }

    #[test]
    fn rules_by_fix_type_groups_builtin_rules() {
        let registry = RuleRegistry::with_builtin_rules();
        let grouped = registry.rules_by_fix_type();
        assert_eq!(grouped[&FixType::FullyDeterministic], vec!["EntityReference"]);
        assert_eq!(grouped[&FixType::PartiallyDeterministic], vec!["ContentType"]);
        assert!(grouped[&FixType::NonDeterministic].contains(&"ShortDescription"));
    }
}
