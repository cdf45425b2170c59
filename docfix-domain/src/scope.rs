//! Substitution-scope guard.
//!
//! Decides whether a token substitution is legal at a given position. AsciiDoc
//! renders the contents of delimited listing and literal blocks verbatim unless
//! the block's `subs` attribute enables the `replacements` substitution, and
//! inline code or passthrough spans are never substituted.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

pub const REPLACEMENTS: &str = "replacements";

/// Delimiter of a block comment. Its contents are never scanned for fences.
pub const COMMENT_DELIMITER: &str = "////";

const NORMAL: [&str; 6] = [
    "specialcharacters",
    "quotes",
    "attributes",
    "replacements",
    "macros",
    "post_replacements",
];

const VERBATIM: [&str; 1] = ["specialcharacters"];

/// How many lines above a fence may carry its attribute list.
const ATTRIBUTE_LOOKBACK: usize = 2;

static SUBS_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[\[,\s])subs\s*=\s*(?:"([^"]*)"|'([^']*)'|([^,\]]*))"#)
        .expect("subs attribute pattern is valid")
});

static INLINE_LITERALS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"pass:[a-z,]*\[[^\]]*\]",
        r"\+\+\+.+?\+\+\+",
        r"\+\+.+?\+\+",
        // Constrained form: no word character outside either mark, no space
        // just inside them. The span is capture group 1.
        r"(?:^|[^\w+])(\+[^\s+](?:[^+]*[^\s+])?\+)(?:[^\w+]|$)",
        r"``.+?``",
        r"`[^`]+`",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("inline literal pattern is valid"))
    .collect()
});

pub type SubstitutionSet = BTreeSet<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Listing,
    Literal,
    Passthrough,
}

impl BlockKind {
    pub fn delimiter(self) -> &'static str {
        match self {
            BlockKind::Listing => "----",
            BlockKind::Literal => "....",
            BlockKind::Passthrough => "++++",
        }
    }

    fn from_delimiter(line: &str) -> Option<Self> {
        match line {
            "----" => Some(BlockKind::Listing),
            "...." => Some(BlockKind::Literal),
            "++++" => Some(BlockKind::Passthrough),
            _ => None,
        }
    }
}

/// A delimited block that is open at the queried line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenBlock {
    pub kind: BlockKind,
    /// 0-based index of the opening delimiter.
    pub opened_at: usize,
    /// Raw `subs` expression from the block's attribute list, if any.
    pub subs: Option<String>,
}

impl OpenBlock {
    pub fn active_substitutions(&self) -> SubstitutionSet {
        let base = SubstitutionSet::new();
        match &self.subs {
            Some(expr) => resolve_subs(expr, &base),
            None => base,
        }
    }
}

/// True when a `replacements`-class substitution may be applied at the given
/// 0-based line and column.
pub fn replacement_allowed(lines: &[&str], line_index: usize, column_index: usize) -> bool {
    if let Some(line) = lines.get(line_index)
        && inside_inline_literal(line, column_index)
    {
        return false;
    }

    match enclosing_block(lines, line_index) {
        None => true,
        Some(block) => block.active_substitutions().contains(REPLACEMENTS),
    }
}

/// True when the 0-based character column falls inside an inline code or
/// passthrough span on `line`.
pub fn inside_inline_literal(line: &str, column_index: usize) -> bool {
    let pos = byte_offset(line, column_index);
    INLINE_LITERALS.iter().any(|re| {
        re.captures_iter(line)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
            .any(|m| m.start() <= pos && pos < m.end())
    })
}

/// The delimited block open at `line_index`, scanning every line above it.
pub fn enclosing_block(lines: &[&str], line_index: usize) -> Option<OpenBlock> {
    let mut open: Option<OpenBlock> = None;
    let mut in_comment = false;

    for (idx, raw) in lines.iter().enumerate().take(line_index) {
        let line = raw.trim();

        if in_comment {
            if line == COMMENT_DELIMITER {
                in_comment = false;
            }
            continue;
        }

        match &open {
            Some(block) => {
                if line == block.kind.delimiter() {
                    open = None;
                }
            }
            None => {
                if line == COMMENT_DELIMITER {
                    in_comment = true;
                } else if let Some(kind) = BlockKind::from_delimiter(line) {
                    open = Some(OpenBlock {
                        kind,
                        opened_at: idx,
                        subs: block_attribute(lines, idx).and_then(subs_value),
                    });
                }
            }
        }
    }

    open
}

/// Marks the lines that belong to a `////` comment block, delimiters included.
/// An unclosed block runs to the end of the document.
pub fn comment_block_lines(lines: &[&str]) -> Vec<bool> {
    let mut inside = false;
    lines
        .iter()
        .map(|raw| {
            let delimiter = raw.trim() == COMMENT_DELIMITER;
            let marked = inside || delimiter;
            if delimiter {
                inside = !inside;
            }
            marked
        })
        .collect()
}

/// Resolve a `subs` expression against the block's default set.
///
/// A single reserved value (`normal`, `none`, `verbatim`, `default`) replaces the
/// set outright. Otherwise each comma-separated token is applied in order:
/// `+tok` and `tok+` add, `-tok` removes, and a bare `tok` resets the set to
/// just that token.
pub fn resolve_subs(expr: &str, base: &SubstitutionSet) -> SubstitutionSet {
    let expr = expr.trim();
    if let Some(set) = reserved(expr) {
        return set;
    }

    let mut active = base.clone();
    for raw in expr.split(',') {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }

        if let Some(name) = token.strip_prefix('+').or_else(|| token.strip_suffix('+')) {
            active.extend(expand(name));
        } else if let Some(name) = token.strip_prefix('-') {
            for sub in expand(name) {
                active.remove(&sub);
            }
        } else {
            active = expand(token).into_iter().collect();
        }
    }
    active
}

fn reserved(expr: &str) -> Option<SubstitutionSet> {
    match expr.to_ascii_lowercase().as_str() {
        "normal" | "n" => Some(named(&NORMAL)),
        "verbatim" | "v" => Some(named(&VERBATIM)),
        "none" | "default" => Some(SubstitutionSet::new()),
        _ => None,
    }
}

fn expand(token: &str) -> Vec<String> {
    let token = token.trim().to_ascii_lowercase();
    let single = |name: &str| vec![name.to_string()];
    match token.as_str() {
        "" | "none" => Vec::new(),
        "normal" | "n" => NORMAL.iter().map(|s| s.to_string()).collect(),
        "verbatim" | "v" => VERBATIM.iter().map(|s| s.to_string()).collect(),
        "specialcharacters" | "specialchars" | "c" => single("specialcharacters"),
        "quotes" | "q" => single("quotes"),
        "attributes" | "a" => single("attributes"),
        "replacements" | "r" => single(REPLACEMENTS),
        "macros" | "m" => single("macros"),
        "post_replacements" | "p" => single("post_replacements"),
        other => single(other),
    }
}

fn named(names: &[&str]) -> SubstitutionSet {
    names.iter().map(|s| s.to_string()).collect()
}

fn is_attribute_line(line: &str) -> bool {
    line.starts_with('[') && line.ends_with(']') && !line.starts_with("[[")
}

/// Nearest attribute list in the look-back window above a fence, preferring one
/// that declares `subs`.
fn block_attribute<'a>(lines: &[&'a str], fence: usize) -> Option<&'a str> {
    let start = fence.saturating_sub(ATTRIBUTE_LOOKBACK);
    let candidates: Vec<&str> = lines[start..fence]
        .iter()
        .rev()
        .map(|l| l.trim())
        .filter(|l| is_attribute_line(l))
        .collect();

    candidates
        .iter()
        .find(|l| SUBS_ATTRIBUTE.is_match(l))
        .or_else(|| candidates.first())
        .copied()
}

fn subs_value(attribute_line: &str) -> Option<String> {
    let caps = SUBS_ATTRIBUTE.captures(attribute_line)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().trim().to_string())
}

fn byte_offset(line: &str, char_index: usize) -> usize {
    line.char_indices()
        .nth(char_index)
        .map(|(b, _)| b)
        .unwrap_or(line.len())
}
