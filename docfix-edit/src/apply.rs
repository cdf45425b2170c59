use docfix_types::{Fix, FixStrategy};
use std::cmp::Reverse;
use tracing::debug;

/// Result of applying one file's fixes to its content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyOutcome {
    pub content: String,
    pub applied: Vec<Fix>,
    /// Fixes whose target could no longer be located.
    pub skipped: Vec<Fix>,
}

/// Order fixes so that no edit shifts the address of one still to come:
/// anchor line descending; on the same line, in-line replacements before
/// insertions, right-most column first. Remaining ties keep their order.
pub fn order_fixes(fixes: &mut [Fix]) {
    fixes.sort_by_key(|fix| {
        let inserts = matches!(
            fix.strategy,
            FixStrategy::InsertAtLine { .. } | FixStrategy::InsertCommentAbove
        );
        (
            Reverse(fix.anchor_line()),
            inserts,
            Reverse(fix.violation.column_index()),
        )
    });
}

/// Apply `fixes` to `content` in a single bottom-up pass.
///
/// Line endings (LF or CRLF) and the presence of a final newline are preserved.
pub fn apply_fixes(content: &str, mut fixes: Vec<Fix>) -> ApplyOutcome {
    order_fixes(&mut fixes);

    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let final_newline = content.is_empty() || content.ends_with('\n');
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

    let mut outcome = ApplyOutcome::default();
    for fix in fixes {
        if apply_one(&mut lines, &fix) {
            outcome.applied.push(fix);
        } else {
            debug!(
                path = %fix.violation.file,
                line = fix.violation.line,
                rule = %fix.violation.rule_name,
                "fix target not found, skipping"
            );
            outcome.skipped.push(fix);
        }
    }

    outcome.content = lines.join(newline);
    if final_newline && !lines.is_empty() {
        outcome.content.push_str(newline);
    }
    outcome
}

fn apply_one(lines: &mut Vec<String>, fix: &Fix) -> bool {
    let replacement = || fix.replacement.split('\n').map(|l| l.trim_end_matches('\r').to_string());

    match fix.strategy {
        FixStrategy::ReplaceLine { line } => {
            if line >= lines.len() {
                return false;
            }
            lines.splice(line..=line, replacement());
            true
        }
        FixStrategy::InsertAtLine { line } => {
            if line > lines.len() {
                return false;
            }
            lines.splice(line..line, replacement());
            true
        }
        FixStrategy::InsertCommentAbove => {
            let line = fix.violation.line_index();
            if line > lines.len() {
                return false;
            }
            lines.splice(line..line, replacement());
            true
        }
        FixStrategy::ReplaceAtPosition => lines
            .get_mut(fix.violation.line_index())
            .is_some_and(|line| {
                replace_near(line, fix.target_text(), fix.violation.column_index(), &fix.replacement)
            }),
    }
}

/// Replace `needle` in `line`, searching forward from `column` (in chars) and,
/// failing that, backwards from it to tolerate leftward drift.
fn replace_near(line: &mut String, needle: &str, column: usize, replacement: &str) -> bool {
    if needle.is_empty() {
        return false;
    }

    let start = byte_offset(line, column);
    let found = line[start..]
        .find(needle)
        .map(|pos| start + pos)
        .or_else(|| {
            let mut end = (start + needle.len()).min(line.len());
            while !line.is_char_boundary(end) {
                end += 1;
            }
            line[..end].rfind(needle)
        });

    match found {
        Some(pos) => {
            line.replace_range(pos..pos + needle.len(), replacement);
            true
        }
        None => false,
    }
}

fn byte_offset(line: &str, char_index: usize) -> usize {
    line.char_indices()
        .nth(char_index)
        .map(|(b, _)| b)
        .unwrap_or(line.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfix_types::{FixType, Severity, Violation};
    use pretty_assertions::assert_eq;

    fn violation(line: usize, column: usize, matched: &str) -> Violation {
        Violation {
            file: "a.adoc".into(),
            rule_name: "EntityReference".into(),
            line,
            column,
            message: "m".into(),
            severity: Severity::Error,
            original_text: matched.into(),
            suggested_text: None,
            check_id: "AsciiDocDITA.EntityReference".into(),
            link: None,
        }
    }

    fn replace(line: usize, column: usize, matched: &str, with: &str) -> Fix {
        Fix::new(
            violation(line, column, matched),
            with,
            FixStrategy::ReplaceAtPosition,
            FixType::FullyDeterministic,
        )
    }

    fn comment(line: usize, text: &str) -> Fix {
        Fix::new(
            violation(line, 1, ""),
            text,
            FixStrategy::InsertCommentAbove,
            FixType::NonDeterministic,
        )
    }

    fn numbered(n: usize) -> String {
        (1..=n).map(|i| format!("line {i} &amp;\n")).collect()
    }

    #[test]
    fn fixes_apply_bottom_up() {
        let content = numbered(12);
        let fixes = vec![
            comment(3, "// above three"),
            replace(10, 8, "&amp;", "{amp}"),
        ];

        let outcome = apply_fixes(&content, fixes);
        assert_eq!(outcome.applied.len(), 2);
        assert_eq!(outcome.applied[0].violation.line, 10);

        let lines: Vec<&str> = outcome.content.lines().collect();
        assert_eq!(lines[2], "// above three");
        assert_eq!(lines[3], "line 3 &amp;");
        assert_eq!(lines[10], "line 10 {amp}");
    }

    #[test]
    fn only_the_addressed_token_changes() {
        let content = "a &nbsp; b &nbsp; c\n";
        let outcome = apply_fixes(content, vec![replace(1, 12, "&nbsp;", "{nbsp}")]);
        assert_eq!(outcome.content, "a &nbsp; b {nbsp} c\n");
    }

    #[test]
    fn same_line_fixes_do_not_disturb_each_other() {
        let content = "x &ZeroWidthSpace; y &amp; z\n";
        let fixes = vec![
            replace(1, 3, "&ZeroWidthSpace;", "{zwsp}"),
            replace(1, 22, "&amp;", "{amp}"),
            comment(1, "// flagged"),
        ];
        let outcome = apply_fixes(content, fixes);
        assert_eq!(outcome.skipped, vec![]);
        assert_eq!(outcome.content, "// flagged\nx {zwsp} y {amp} z\n");
    }

    #[test]
    fn explicit_target_overrides_reported_match() {
        let fix = replace(1, 6, "&nbsp", "{nbsp}").with_target("&nbsp;");
        let outcome = apply_fixes("text &nbsp; here\n", vec![fix]);
        assert_eq!(outcome.content, "text {nbsp} here\n");
    }

    #[test]
    fn leftward_drift_is_tolerated() {
        let mut line = "ab &amp; c".to_string();
        assert!(replace_near(&mut line, "&amp;", 6, "{amp}"));
        assert_eq!(line, "ab {amp} c");
    }

    #[test]
    fn unlocatable_targets_are_skipped() {
        let content = "nothing here\n";
        let fixes = vec![
            replace(1, 1, "&nbsp;", "{nbsp}"),
            replace(7, 1, "&nbsp;", "{nbsp}"),
            Fix::new(
                violation(1, 1, ""),
                "x",
                FixStrategy::ReplaceLine { line: 9 },
                FixType::PartiallyDeterministic,
            ),
        ];
        let outcome = apply_fixes(content, fixes);
        assert_eq!(outcome.applied, vec![]);
        assert_eq!(outcome.skipped.len(), 3);
        assert_eq!(outcome.content, content);
    }

    #[test]
    fn multi_line_insertions_are_split() {
        let content = "= Title\n";
        let fix = Fix::new(
            violation(1, 1, ""),
            ":_mod-docs-content-type: TBD\n",
            FixStrategy::InsertAtLine { line: 0 },
            FixType::PartiallyDeterministic,
        );
        let outcome = apply_fixes(content, vec![fix]);
        assert_eq!(outcome.content, ":_mod-docs-content-type: TBD\n\n= Title\n");
    }

    #[test]
    fn crlf_and_missing_final_newline_are_preserved() {
        let outcome = apply_fixes("a &lt;\r\nb", vec![replace(1, 3, "&lt;", "{lt}")]);
        assert_eq!(outcome.content, "a {lt}\r\nb");
    }

    #[test]
    fn ordering_puts_insertions_after_replacements_on_a_line() {
        let mut fixes = vec![
            comment(4, "// c"),
            replace(4, 1, "&lt;", "{lt}"),
            replace(9, 1, "&lt;", "{lt}"),
            replace(4, 7, "&gt;", "{gt}"),
        ];
        order_fixes(&mut fixes);
        let keys: Vec<(usize, usize)> = fixes
            .iter()
            .map(|f| (f.violation.line, f.violation.column))
            .collect();
        assert_eq!(keys, vec![(9, 1), (4, 7), (4, 1), (4, 1)]);
        assert_eq!(fixes[3].strategy, FixStrategy::InsertCommentAbove);
    }
}
