//! Text cleanup applied to workflow output before building.
//!
//! The workflow sometimes returns HTML fragments or entity-encoded markup.
//! Entities are decoded first so encoded tags are stripped as well.
//! Characters XML 1.0 does not allow are removed, since docx-rs writes
//! text through unchanged and Word rejects such documents.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

fn tag_pattern() -> Option<&'static Regex> {
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]+>").ok()).as_ref()
}

fn invalid_xml_pattern() -> Option<&'static Regex> {
    static INVALID: OnceLock<Option<Regex>> = OnceLock::new();
    INVALID
        .get_or_init(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x{FFFE}\x{FFFF}]").ok())
        .as_ref()
}

/// Remove characters that may not appear in an XML 1.0 document.
/// Tab, newline and carriage return are kept.
pub fn strip_invalid_xml(input: &str) -> String {
    match invalid_xml_pattern() {
        Some(re) => re.replace_all(input, "").into_owned(),
        None => input
            .chars()
            .filter(|c| is_xml_char(*c))
            .collect(),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

/// Drop XML-invalid characters, decode `&lt;`, `&gt;` and `&amp;`, replace
/// tags with a space and collapse whitespace runs.
pub fn sanitize_text(input: &str) -> String {
    let decoded = strip_invalid_xml(input)
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    let stripped = match tag_pattern() {
        Some(re) => re.replace_all(&decoded, " ").into_owned(),
        None => decoded,
    };
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Apply [`sanitize_text`] to every string in the tree. Keys are kept.
pub fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_text(s)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), sanitize_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}
