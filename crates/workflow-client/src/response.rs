//! Request and response bodies of the workflow run endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AttemptError;

/// Body posted to the run endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRequest {
    pub inputs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Optional per-run fields sent alongside the inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    pub files: Option<Value>,
    pub user: Option<String>,
}

impl RunOptions {
    pub fn for_user(user: impl Into<String>) -> Self {
        RunOptions {
            files: None,
            user: Some(user.into()),
        }
    }

    pub fn with_files(mut self, files: Value) -> Self {
        self.files = Some(files);
        self
    }
}

/// Decoded 2xx body.
///
/// Fields are looked up at the top level first and then inside a `data`
/// envelope, so both the blocking and the wrapped shapes decode. `raw` keeps
/// the full body for the analysis-result log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResponse {
    pub id: String,
    pub status: String,
    pub output: Option<Value>,
    pub elapsed_time: Option<f64>,
    pub error: Option<String>,
    pub raw: Value,
}

impl WorkflowResponse {
    pub fn from_value(raw: Value) -> Result<Self, AttemptError> {
        if !raw.is_object() {
            return Err(AttemptError::Decode(format!(
                "expected a JSON object, got {}",
                kind_of(&raw)
            )));
        }

        let id = lookup(&raw, &["id", "workflow_run_id"])
            .and_then(value_as_string)
            .unwrap_or_default();
        let status = lookup(&raw, &["status"])
            .and_then(value_as_string)
            .unwrap_or_default();
        let output = lookup(&raw, &["output", "outputs"])
            .filter(|v| !v.is_null())
            .cloned();
        let elapsed_time = lookup(&raw, &["elapsed_time"]).and_then(Value::as_f64);
        let error = lookup(&raw, &["error"]).and_then(|v| match v {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });

        Ok(WorkflowResponse {
            id,
            status,
            output,
            elapsed_time,
            error,
            raw,
        })
    }

    /// Failure reported inside a 2xx body (`status` of `failed` or `stopped`).
    pub fn failure(&self) -> Option<String> {
        match self.status.as_str() {
            "failed" | "stopped" => Some(
                self.error
                    .clone()
                    .unwrap_or_else(|| format!("workflow run {}", self.status)),
            ),
            _ => None,
        }
    }
}

fn lookup<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let scopes = [Some(raw), raw.get("data")];
    scopes
        .into_iter()
        .flatten()
        .find_map(|scope| keys.iter().find_map(|key| scope.get(*key)))
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
