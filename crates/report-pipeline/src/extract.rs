//! Locating `result_json` inside a raw workflow response.

use docx_report::probe::get_path;
use serde_json::Value;

/// Containers checked for a `result_json` key, in order.
pub const RESULT_CONTAINERS: &[&str] = &["output", "outputs", "data.output", "data.outputs"];

/// The first non-null `result_json` found in a known container.
///
/// String values are parsed as JSON when they parse, and kept as the
/// string otherwise.
pub fn extract_result_json(raw: &Value) -> Option<Value> {
    RESULT_CONTAINERS
        .iter()
        .filter_map(|path| get_path(raw, path))
        .filter(|container| container.is_object())
        .filter_map(|container| container.get("result_json"))
        .find(|value| !value.is_null())
        .map(parse_if_string)
}

fn parse_if_string(value: &Value) -> Value {
    match value {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| value.clone()),
        other => other.clone(),
    }
}
