use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use docfix_types::{Severity, Violation};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure to interpret the payload as a whole.
///
/// Malformed individual alerts never produce this error; they are skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlertParseError {
    #[error("json parse error: {message}")]
    Json { message: String },

    #[error("linter payload must be a JSON object keyed by file path, found {found}")]
    NotAnObject { found: &'static str },
}

/// One alert record as Vale writes it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawAlert {
    check: String,

    line: usize,

    #[serde(default)]
    column: Option<usize>,

    #[serde(default)]
    span: Option<Vec<usize>>,

    #[serde(default)]
    message: String,

    #[serde(default)]
    severity: String,

    #[serde(default, rename = "Match")]
    matched: String,

    #[serde(default)]
    action: Option<RawAction>,

    #[serde(default)]
    suggestions: Option<Vec<String>>,

    #[serde(default)]
    link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawAction {
    #[serde(default)]
    params: Option<Vec<String>>,
}

/// Turns a raw linter payload into violations.
///
/// Relative file paths in the payload are resolved against `base_dir`.
#[derive(Debug, Clone)]
pub struct AlertParser {
    base_dir: Utf8PathBuf,
}

impl Default for AlertParser {
    fn default() -> Self {
        Self::new(".")
    }
}

impl AlertParser {
    pub fn new(base_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    pub fn parse(&self, raw: &str) -> Result<Vec<Violation>, AlertParseError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| AlertParseError::Json {
            message: e.to_string(),
        })?;
        self.parse_value(value)
    }

    pub fn parse_value(&self, value: Value) -> Result<Vec<Violation>, AlertParseError> {
        let files = match value {
            Value::Object(files) => files,
            other => {
                return Err(AlertParseError::NotAnObject {
                    found: json_kind(&other),
                });
            }
        };

        let mut out = Vec::new();
        for (raw_path, entry) in files {
            let alerts = match entry {
                Value::Array(alerts) => alerts,
                Value::Object(mut obj) => match obj.remove("Alerts") {
                    Some(Value::Array(alerts)) => alerts,
                    _ => {
                        warn!(path = %raw_path, "file entry has no Alerts array, skipping");
                        continue;
                    }
                },
                other => {
                    warn!(
                        path = %raw_path,
                        found = json_kind(&other),
                        "file entry is neither an array nor an object, skipping"
                    );
                    continue;
                }
            };

            let file = normalize_path(&self.base_dir, &raw_path);
            for (index, alert) in alerts.into_iter().enumerate() {
                match violation_from_alert(&file, alert) {
                    Ok(v) => out.push(v),
                    Err(reason) => {
                        warn!(path = %file, index, reason = %reason, "skipping malformed alert");
                    }
                }
            }
        }

        debug!(violations = out.len(), "parsed linter payload");
        Ok(out)
    }
}

/// Rule name is the final dotted segment of a check id.
pub fn rule_name_from_check(check: &str) -> &str {
    check.rsplit('.').next().unwrap_or(check)
}

fn violation_from_alert(file: &Utf8Path, alert: Value) -> Result<Violation, String> {
    let raw: RawAlert = serde_json::from_value(alert).map_err(|e| e.to_string())?;

    let check = raw.check.trim();
    if check.is_empty() {
        return Err("empty Check".to_string());
    }
    if raw.line == 0 {
        return Err("Line must be 1-based".to_string());
    }

    let column = match (raw.column, raw.span.as_deref()) {
        (Some(col), _) if col > 0 => col,
        (_, Some([start, _end])) if *start > 0 => *start,
        _ => return Err("neither Column nor a two-element Span".to_string()),
    };

    let suggested_text = raw
        .action
        .and_then(|a| a.params)
        .and_then(|p| p.into_iter().find(|s| !s.is_empty()))
        .or_else(|| {
            raw.suggestions
                .and_then(|s| s.into_iter().find(|s| !s.is_empty()))
        });

    Ok(Violation {
        file: file.to_path_buf(),
        rule_name: rule_name_from_check(check).to_string(),
        line: raw.line,
        column,
        message: raw.message,
        severity: Severity::from_linter(&raw.severity),
        original_text: raw.matched,
        suggested_text,
        check_id: check.to_string(),
        link: raw.link.filter(|l| !l.trim().is_empty()),
    })
}

/// Lexically resolve `raw` against `base`, dropping `.` and folding `..`.
fn normalize_path(base: &Utf8Path, raw: &str) -> Utf8PathBuf {
    let raw = Utf8Path::new(raw);
    let joined = if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        base.join(raw)
    };

    let mut out = Utf8PathBuf::new();
    for component in joined.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                let at_root = out.as_str().is_empty() || out.ends_with("..");
                if at_root || !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_str()),
        }
    }
    out
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rule_name_is_last_segment() {
        assert_eq!(rule_name_from_check("AsciiDocDITA.EntityReference"), "EntityReference");
        assert_eq!(rule_name_from_check("Vale.Terms.Extra"), "Extra");
        assert_eq!(rule_name_from_check("Plain"), "Plain");
    }

    #[test]
    fn normalize_drops_cur_dir_components() {
        assert_eq!(normalize_path(Utf8Path::new("."), "a.adoc"), "a.adoc");
        assert_eq!(
            normalize_path(Utf8Path::new("docs"), "./modules/../a.adoc"),
            "docs/a.adoc"
        );
        assert_eq!(normalize_path(Utf8Path::new("docs"), "/abs/a.adoc"), "/abs/a.adoc");
    }

    #[test]
    fn normalize_keeps_leading_parent_dirs() {
        assert_eq!(normalize_path(Utf8Path::new("."), "../x.adoc"), "../x.adoc");
        assert_eq!(normalize_path(Utf8Path::new("."), "../../x.adoc"), "../../x.adoc");
    }

    #[test]
    fn column_falls_back_to_span_start() {
        let alert = serde_json::json!({
            "Check": "S.R", "Line": 2, "Column": 0, "Span": [7, 12],
            "Message": "m", "Severity": "warning", "Match": "x"
        });
        let v = violation_from_alert(Utf8Path::new("a.adoc"), alert).unwrap();
        assert_eq!(v.column, 7);
    }

    #[test]
    fn alert_without_position_is_rejected() {
        let alert = serde_json::json!({ "Check": "S.R", "Line": 2, "Span": [1, 2, 3] });
        assert!(violation_from_alert(Utf8Path::new("a.adoc"), alert).is_err());
    }

    #[test]
    fn suggestion_prefers_action_params() {
        let alert = serde_json::json!({
            "Check": "S.R", "Line": 1, "Span": [1, 2], "Match": "&nbsp;",
            "Action": { "Name": "replace", "Params": ["{nbsp}"] },
            "Suggestions": ["other"]
        });
        let v = violation_from_alert(Utf8Path::new("a.adoc"), alert).unwrap();
        assert_eq!(v.suggested_text.as_deref(), Some("{nbsp}"));
    }

    #[test]
    fn empty_link_becomes_none() {
        let alert = serde_json::json!({ "Check": "S.R", "Line": 1, "Column": 1, "Link": "" });
        let v = violation_from_alert(Utf8Path::new("a.adoc"), alert).unwrap();
        assert_eq!(v.link, None);
    }
}
