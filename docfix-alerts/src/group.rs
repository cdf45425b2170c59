use camino::Utf8PathBuf;
use docfix_types::{Severity, Violation};
use std::collections::HashMap;
use std::hash::Hash;

/// Partition violations by file, preserving first-seen order of files and of
/// violations within each file.
pub fn group_by_file(violations: &[Violation]) -> Vec<(Utf8PathBuf, Vec<Violation>)> {
    group_by(violations, |v| v.file.clone())
}

/// Partition violations by rule name, preserving first-seen order.
pub fn group_by_rule(violations: &[Violation]) -> Vec<(String, Vec<Violation>)> {
    group_by(violations, |v| v.rule_name.clone())
}

/// Keep only violations whose severity is listed.
pub fn filter_by_severity(violations: &[Violation], severities: &[Severity]) -> Vec<Violation> {
    violations
        .iter()
        .filter(|v| severities.contains(&v.severity))
        .cloned()
        .collect()
}

fn group_by<K, F>(violations: &[Violation], key: F) -> Vec<(K, Vec<Violation>)>
where
    K: Clone + Eq + Hash,
    F: Fn(&Violation) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<Violation>)> = Vec::new();
    for v in violations {
        let k = key(v);
        match index.get(&k) {
            Some(&slot) => groups[slot].1.push(v.clone()),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![v.clone()]));
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn v(file: &str, rule: &str, line: usize, severity: Severity) -> Violation {
        Violation {
            file: file.into(),
            rule_name: rule.into(),
            line,
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
    fn group_by_file_keeps_insertion_order() {
        let input = vec![
            v("b.adoc", "R1", 1, Severity::Error),
            v("a.adoc", "R1", 2, Severity::Error),
            v("b.adoc", "R2", 3, Severity::Warning),
        ];
        let groups = group_by_file(&input);
        let files: Vec<&str> = groups.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(files, vec!["b.adoc", "a.adoc"]);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[0].1[1].line, 3);
    }

    #[test]
    fn group_by_rule_keeps_insertion_order() {
        let input = vec![
            v("a.adoc", "Zeta", 1, Severity::Error),
            v("a.adoc", "Alpha", 2, Severity::Error),
            v("b.adoc", "Zeta", 3, Severity::Error),
        ];
        let groups = group_by_rule(&input);
        let rules: Vec<&str> = groups.iter().map(|(r, _)| r.as_str()).collect();
        assert_eq!(rules, vec!["Zeta", "Alpha"]);
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn filter_by_severity_keeps_listed_levels() {
        let input = vec![
            v("a.adoc", "R", 1, Severity::Error),
            v("a.adoc", "R", 2, Severity::Warning),
            v("a.adoc", "R", 3, Severity::Suggestion),
        ];
        let kept = filter_by_severity(&input, &[Severity::Error, Severity::Suggestion]);
        let lines: Vec<usize> = kept.iter().map(|v| v.line).collect();
        assert_eq!(lines, vec![1, 3]);
        assert!(filter_by_severity(&input, &[]).is_empty());
    }
}
