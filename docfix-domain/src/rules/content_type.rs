use crate::rule::Rule;
use crate::scope::{COMMENT_DELIMITER, comment_block_lines};
use camino::Utf8Path;
use docfix_types::{Fix, FixStrategy, FixType, Violation};
use tracing::debug;

/// Declares a module's content type, inferring the value where it can and
/// falling back to a placeholder that needs an author.
pub struct ContentTypeRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Canonical,
    Commented,
    Deprecated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Declaration {
    line: usize,
    source: Source,
    value: Option<&'static str>,
}

/// The value chosen for the attribute and how much we trust it.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Choice {
    value: &'static str,
    confidence: f64,
    requires_review: bool,
    from_line: Option<usize>,
    reason: &'static str,
}

impl ContentTypeRule {
    pub const NAME: &'static str = "ContentType";
    pub const ATTRIBUTE: &'static str = ":_mod-docs-content-type:";
    pub const PLACEHOLDER: &'static str = "TBD";
    pub const VALUES: [&'static str; 5] = ["ASSEMBLY", "CONCEPT", "PROCEDURE", "REFERENCE", "SNIPPET"];

    const DEPRECATED: [&'static str; 2] = [":_content-type:", ":_module-type:"];
    const FILENAME_PREFIXES: [(&'static str, &'static str); 5] = [
        ("assembly", "ASSEMBLY"),
        ("con", "CONCEPT"),
        ("proc", "PROCEDURE"),
        ("ref", "REFERENCE"),
        ("snip", "SNIPPET"),
    ];
    const HEADING_LOOKBACK: usize = 2;

    /// Canonical spelling of a content type value, if it is one.
    pub fn normalize_value(raw: &str) -> Option<&'static str> {
        let upper = raw.trim().to_ascii_uppercase();
        Self::VALUES.into_iter().find(|v| *v == upper)
    }

    /// Content type implied by a `con_`/`proc-`/... file name prefix.
    pub fn value_from_filename(path: &Utf8Path) -> Option<&'static str> {
        let name = path.file_name()?.to_ascii_lowercase();
        Self::FILENAME_PREFIXES
            .into_iter()
            .find(|(prefix, _)| {
                name.strip_prefix(*prefix)
                    .is_some_and(|rest| rest.starts_with('_') || rest.starts_with('-'))
            })
            .map(|(_, value)| value)
    }

    /// 0-based line a new declaration should be inserted before.
    pub fn insertion_point(lines: &[&str]) -> usize {
        if let Some(after) = leading_comment_block_end(lines) {
            return after;
        }

        let floor = leading_line_comments_end(lines);
        match first_heading(lines) {
            Some(heading) => heading.saturating_sub(Self::HEADING_LOOKBACK).max(floor),
            None => floor,
        }
    }

    fn declarations(lines: &[&str]) -> Vec<Declaration> {
        let commented_out = comment_block_lines(lines);
        let mut found = Vec::new();
        for (line, raw) in lines.iter().enumerate() {
            if commented_out[line] {
                continue;
            }
            let text = raw.trim();
            let (source, rest) = if let Some(rest) = text.strip_prefix(Self::ATTRIBUTE) {
                (Source::Canonical, rest)
            } else if let Some(rest) = text
                .strip_prefix("//")
                .filter(|_| !text.starts_with(COMMENT_DELIMITER))
                .and_then(|c| c.trim_start().strip_prefix(Self::ATTRIBUTE))
            {
                (Source::Commented, rest)
            } else if let Some(rest) = Self::DEPRECATED
                .iter()
                .find_map(|attr| text.strip_prefix(attr))
            {
                (Source::Deprecated, rest)
            } else {
                continue;
            };

            found.push(Declaration {
                line,
                source,
                value: Self::normalize_value(rest),
            });
        }
        found
    }

    fn choose(declarations: &[Declaration], path: &Utf8Path) -> Choice {
        let valid = |source: Source| {
            declarations
                .iter()
                .find(|d| d.source == source && d.value.is_some())
        };

        for (source, reason) in [
            (Source::Commented, "uncommented existing declaration"),
            (Source::Deprecated, "renamed deprecated attribute"),
        ] {
            if let Some(decl) = valid(source)
                && let Some(value) = decl.value
            {
                return Choice {
                    value,
                    confidence: 0.9,
                    requires_review: false,
                    from_line: Some(decl.line),
                    reason,
                };
            }
        }

        if let Some(value) = Self::value_from_filename(path) {
            return Choice {
                value,
                confidence: 0.8,
                requires_review: false,
                from_line: None,
                reason: "inferred from file name",
            };
        }

        Choice {
            value: Self::PLACEHOLDER,
            confidence: 0.3,
            requires_review: true,
            from_line: None,
            reason: "placeholder needs a content type",
        }
    }
}

impl Rule for ContentTypeRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fix_type(&self) -> FixType {
        FixType::PartiallyDeterministic
    }

    fn can_fix(&self, violation: &Violation) -> bool {
        violation.rule_name == Self::NAME
    }

    fn generate_fix(&self, violation: &Violation, content: &str) -> Option<Fix> {
        let lines: Vec<&str> = content.lines().collect();
        let declarations = Self::declarations(&lines);

        if declarations
            .iter()
            .any(|d| d.source == Source::Canonical && d.value.is_some())
        {
            debug!(path = %violation.file, "content type already declared");
            return None;
        }

        let choice = Self::choose(&declarations, &violation.file);
        let declaration = format!("{} {}", Self::ATTRIBUTE, choice.value);

        // An existing canonical line is rewritten in place so the file never
        // ends up with two active declarations.
        let target = declarations
            .iter()
            .find(|d| d.source == Source::Canonical)
            .map(|d| d.line)
            .or(choice.from_line)
            .or_else(|| declarations.first().map(|d| d.line));

        let (strategy, replacement) = match target {
            Some(line) => (FixStrategy::ReplaceLine { line }, declaration),
            None => {
                let line = Self::insertion_point(&lines);
                let needs_spacer = lines.get(line).is_some_and(|next| !next.trim().is_empty());
                let replacement = if needs_spacer {
                    format!("{declaration}\n")
                } else {
                    declaration
                };
                (FixStrategy::InsertAtLine { line }, replacement)
            }
        };

        Some(
            Fix::new(
                violation.clone(),
                replacement,
                strategy,
                FixType::PartiallyDeterministic,
            )
            .with_confidence(choice.confidence)
            .with_review(choice.requires_review)
            .with_description(format!(
                "Set content type to {} ({})",
                choice.value, choice.reason
            )),
        )
    }
}

/// Index just past a `////` block that opens the file, skipping the blank
/// lines that follow it. `None` if there is no such block or it never closes.
fn leading_comment_block_end(lines: &[&str]) -> Option<usize> {
    let start = lines.iter().position(|l| !l.trim().is_empty())?;
    if lines[start].trim() != COMMENT_DELIMITER {
        return None;
    }

    let close = lines[start + 1..]
        .iter()
        .position(|l| l.trim() == COMMENT_DELIMITER)
        .map(|offset| start + 1 + offset)?;

    Some(skip_blank(lines, close + 1))
}

/// Index just past the `//` comment lines (and blank lines) at the top of the file.
fn leading_line_comments_end(lines: &[&str]) -> usize {
    let mut end = 0;
    for (idx, raw) in lines.iter().enumerate() {
        let text = raw.trim();
        if text.is_empty() {
            continue;
        }
        if text.starts_with("//") && !text.starts_with(COMMENT_DELIMITER) {
            end = idx + 1;
        } else {
            break;
        }
    }
    if end == 0 { 0 } else { skip_blank(lines, end) }
}

fn first_heading(lines: &[&str]) -> Option<usize> {
    lines
        .iter()
        .position(|l| l.starts_with("= ") || l.starts_with("== "))
}

fn skip_blank(lines: &[&str], from: usize) -> usize {
    lines[from.min(lines.len())..]
        .iter()
        .position(|l| !l.trim().is_empty())
        .map_or(lines.len(), |offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfix_types::Severity;
    use pretty_assertions::assert_eq;

    fn violation(file: &str) -> Violation {
        Violation {
            file: file.into(),
            rule_name: "ContentType".into(),
            line: 1,
            column: 1,
            message: "The '_mod-docs-content-type' attribute definition is missing.".into(),
            severity: Severity::Warning,
            original_text: String::new(),
            suggested_text: None,
            check_id: "AsciiDocDITA.ContentType".into(),
            link: None,
        }
    }

    fn lines(s: &str) -> Vec<&str> {
        s.lines().collect()
    }

    #[test]
    fn filename_prefixes_map_to_types() {
        assert_eq!(
            ContentTypeRule::value_from_filename(Utf8Path::new("docs/proc_install.adoc")),
            Some("PROCEDURE")
        );
        assert_eq!(
            ContentTypeRule::value_from_filename(Utf8Path::new("con-overview.adoc")),
            Some("CONCEPT")
        );
        assert_eq!(
            ContentTypeRule::value_from_filename(Utf8Path::new("assembly_guide.adoc")),
            Some("ASSEMBLY")
        );
        assert_eq!(ContentTypeRule::value_from_filename(Utf8Path::new("reference.adoc")), None);
        assert_eq!(ContentTypeRule::value_from_filename(Utf8Path::new("conf.adoc")), None);
    }

    #[test]
    fn inserts_after_leading_comment_block_and_blank_line() {
        let doc = lines("////\nmetadata\n////\n\n= Title\n\nBody\n");
        assert_eq!(ContentTypeRule::insertion_point(&doc), 4);
    }

    #[test]
    fn inserts_before_heading_with_lookback() {
        let doc = lines(":context: demo\n\n[id=\"demo\"]\n= Title\n");
        assert_eq!(ContentTypeRule::insertion_point(&doc), 1);
    }

    #[test]
    fn heading_lookback_is_clamped_by_line_comments() {
        let doc = lines("// Module included in:\n// * guide.adoc\n= Title\n");
        assert_eq!(ContentTypeRule::insertion_point(&doc), 2);
    }

    #[test]
    fn empty_document_inserts_at_top() {
        assert_eq!(ContentTypeRule::insertion_point(&[]), 0);
    }

    #[test]
    fn unclosed_comment_block_falls_back_to_heading() {
        let doc = lines("////\nno end\n\n\n= Title\n");
        assert_eq!(ContentTypeRule::insertion_point(&doc), 2);
    }

    #[test]
    fn placeholder_insertion_requires_review() {
        let fix = ContentTypeRule
            .generate_fix(&violation("overview.adoc"), "= Title\n\nBody\n")
            .unwrap();
        assert_eq!(fix.strategy, FixStrategy::InsertAtLine { line: 0 });
        assert_eq!(fix.replacement, ":_mod-docs-content-type: TBD\n");
        assert!(fix.requires_review);
        assert_eq!(fix.confidence, 0.3);
    }

    #[test]
    fn filename_inference_is_confident() {
        let fix = ContentTypeRule
            .generate_fix(&violation("/repo/proc_setup.adoc"), "= Set up\n")
            .unwrap();
        assert_eq!(fix.replacement, ":_mod-docs-content-type: PROCEDURE\n");
        assert_eq!(fix.confidence, 0.8);
        assert!(!fix.requires_review);
    }

    #[test]
    fn commented_declaration_is_replaced_in_place() {
        let content = "//:_mod-docs-content-type: concept\n= Title\n";
        let fix = ContentTypeRule
            .generate_fix(&violation("proc_x.adoc"), content)
            .unwrap();
        assert_eq!(fix.strategy, FixStrategy::ReplaceLine { line: 0 });
        assert_eq!(fix.replacement, ":_mod-docs-content-type: CONCEPT");
        assert_eq!(fix.confidence, 0.9);
    }

    #[test]
    fn deprecated_declaration_is_renamed() {
        let content = "= Title\n:_module-type: REFERENCE\n";
        let fix = ContentTypeRule.generate_fix(&violation("x.adoc"), content).unwrap();
        assert_eq!(fix.strategy, FixStrategy::ReplaceLine { line: 1 });
        assert_eq!(fix.replacement, ":_mod-docs-content-type: REFERENCE");
    }

    #[test]
    fn invalid_declaration_is_replaced_with_inferred_value() {
        let content = ":_mod-docs-content-type: WHATEVER\n= Title\n";
        let fix = ContentTypeRule
            .generate_fix(&violation("ref_api.adoc"), content)
            .unwrap();
        assert_eq!(fix.strategy, FixStrategy::ReplaceLine { line: 0 });
        assert_eq!(fix.replacement, ":_mod-docs-content-type: REFERENCE");
    }

    #[test]
    fn invalid_canonical_line_is_the_one_rewritten() {
        let content = ":_mod-docs-content-type: WHATEVER\n//:_mod-docs-content-type: CONCEPT\n= Title\n";
        let fix = ContentTypeRule.generate_fix(&violation("x.adoc"), content).unwrap();
        assert_eq!(fix.strategy, FixStrategy::ReplaceLine { line: 0 });
        assert_eq!(fix.replacement, ":_mod-docs-content-type: CONCEPT");

        let mut rewritten: Vec<&str> = content.lines().collect();
        rewritten[0] = &fix.replacement;
        let active: Vec<&&str> = rewritten
            .iter()
            .filter(|l| l.starts_with(ContentTypeRule::ATTRIBUTE))
            .collect();
        assert_eq!(active, vec![&":_mod-docs-content-type: CONCEPT"]);
    }

    #[test]
    fn declarations_inside_comment_blocks_are_ignored() {
        let content = "////\n:_mod-docs-content-type: CONCEPT\n////\n\n= Title\n";
        let fix = ContentTypeRule
            .generate_fix(&violation("proc_x.adoc"), content)
            .unwrap();
        assert_eq!(fix.strategy, FixStrategy::InsertAtLine { line: 4 });
        assert_eq!(fix.replacement, ":_mod-docs-content-type: PROCEDURE\n");
    }

    #[test]
    fn valid_canonical_declaration_needs_nothing() {
        let content = ":_mod-docs-content-type: CONCEPT\n= Title\n";
        assert!(ContentTypeRule.generate_fix(&violation("x.adoc"), content).is_none());
    }

    #[test]
    fn no_spacer_when_next_line_is_blank() {
        let content = "////\nheader\n////\n";
        let fix = ContentTypeRule.generate_fix(&violation("x.adoc"), content).unwrap();
        assert_eq!(fix.strategy, FixStrategy::InsertAtLine { line: 3 });
        assert_eq!(fix.replacement, ":_mod-docs-content-type: TBD");
    }
}
