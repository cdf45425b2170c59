use crate::rule::Rule;
use crate::scope;
use docfix_types::{Fix, FixStrategy, FixType, Violation};
use tracing::debug;

/// Replaces HTML named entities with AsciiDoc built-in attribute references.
pub struct EntityReferenceRule;

impl EntityReferenceRule {
    pub const NAME: &'static str = "EntityReference";

    /// Attribute reference for a matched entity, with or without its `;`.
    pub fn replacement_for(matched: &str) -> Option<&'static str> {
        let matched = matched.trim();
        if matched.ends_with(';') {
            lookup(matched)
        } else {
            lookup(&format!("{matched};"))
        }
    }
}

fn lookup(entity: &str) -> Option<&'static str> {
    let attr = match entity {
        "&nbsp;" => "{nbsp}",
        "&amp;" => "{amp}",
        "&lt;" => "{lt}",
        "&gt;" => "{gt}",
        "&apos;" => "{apos}",
        "&quot;" => "{quot}",
        "&lsquo;" => "{lsquo}",
        "&rsquo;" => "{rsquo}",
        "&ldquo;" => "{ldquo}",
        "&rdquo;" => "{rdquo}",
        "&deg;" => "{deg}",
        "&plus;" => "{plus}",
        "&brvbar;" => "{brvbar}",
        "&verbar;" | "&vert;" => "{vbar}",
        "&lsqb;" | "&lbrack;" => "{startsb}",
        "&rsqb;" | "&rbrack;" => "{endsb}",
        "&Hat;" => "{caret}",
        "&ast;" | "&midast;" => "{asterisk}",
        "&tilde;" => "{tilde}",
        "&bsol;" => "{backslash}",
        "&grave;" => "{backtick}",
        "&ZeroWidthSpace;" => "{zwsp}",
        "&NoBreak;" => "{wj}",
        _ => return None,
    };
    Some(attr)
}

impl Rule for EntityReferenceRule {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fix_type(&self) -> FixType {
        FixType::FullyDeterministic
    }

    fn can_fix(&self, violation: &Violation) -> bool {
        Self::replacement_for(&violation.original_text).is_some()
    }

    fn generate_fix(&self, violation: &Violation, content: &str) -> Option<Fix> {
        let replacement = Self::replacement_for(&violation.original_text)?;

        let lines: Vec<&str> = content.lines().collect();
        if !scope::replacement_allowed(&lines, violation.line_index(), violation.column_index()) {
            debug!(
                path = %violation.file,
                line = violation.line,
                entity = %violation.original_text,
                "entity left alone: substitutions disabled here"
            );
            return None;
        }

        let target = lines
            .get(violation.line_index())
            .map(|line| entity_span(line, violation.column_index(), &violation.original_text))
            .unwrap_or_else(|| violation.original_text.trim().to_string());

        Some(
            Fix::new(
                violation.clone(),
                replacement,
                FixStrategy::ReplaceAtPosition,
                FixType::FullyDeterministic,
            )
            .with_description(format!("Replace {target} with {replacement}"))
            .with_target(target),
        )
    }
}

/// The entity as written on `line` near `column_index`: the trimmed match,
/// extended by its `;` terminator when the text has one the match lacks.
fn entity_span(line: &str, column_index: usize, matched: &str) -> String {
    let matched = matched.trim();
    let bare = matched.trim_end_matches(';');
    let start = line
        .char_indices()
        .nth(column_index)
        .map_or(line.len(), |(b, _)| b);

    let found = line[start..]
        .find(bare)
        .map(|pos| start + pos)
        .or_else(|| line.rfind(bare));
    match found {
        Some(pos) if line[pos + bare.len()..].starts_with(';') => format!("{bare};"),
        Some(_) => bare.to_string(),
        None => matched.to_string(),
    }
}
