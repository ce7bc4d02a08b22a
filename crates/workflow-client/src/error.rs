//! Error types for workflow-client

use thiserror::Error;

/// Terminal errors of the workflow client.
///
/// `Configuration` is raised at construction and never retried; the others
/// are raised only after every attempt has failed and describe the last one.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Missing or unusable endpoint configuration
    #[error("Workflow configuration error: {0}")]
    Configuration(String),

    /// The workflow answered with an error status; its body is kept verbatim
    #[error("Workflow returned HTTP {status} after {attempts} attempt(s): {payload}")]
    Upstream {
        attempts: u32,
        status: u16,
        payload: serde_json::Value,
    },

    /// Connection-level failure (DNS, refused, reset)
    #[error("Workflow transport failed after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },

    /// Each attempt exceeded the request timeout
    #[error("Workflow request timed out after {attempts} attempt(s) ({timeout_ms}ms each)")]
    Timeout { attempts: u32, timeout_ms: u64 },

    /// The workflow answered 2xx with a body that is not a JSON object
    #[error("Workflow response could not be decoded after {attempts} attempt(s): {message}")]
    Decode { attempts: u32, message: String },
}

impl WorkflowError {
    /// Upstream error payload, when the workflow sent one.
    pub fn upstream_payload(&self) -> Option<&serde_json::Value> {
        match self {
            WorkflowError::Upstream { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// Number of attempts made before giving up (0 for configuration errors).
    pub fn attempts(&self) -> u32 {
        match self {
            WorkflowError::Configuration(_) => 0,
            WorkflowError::Upstream { attempts, .. }
            | WorkflowError::Transport { attempts, .. }
            | WorkflowError::Timeout { attempts, .. }
            | WorkflowError::Decode { attempts, .. } => *attempts,
        }
    }
}

/// Failure of a single attempt, before retry classification.
#[derive(Error, Debug, Clone)]
pub enum AttemptError {
    #[error("HTTP {status}: {payload}")]
    Upstream {
        status: u16,
        payload: serde_json::Value,
    },

    #[error("transport: {0}")]
    Transport(String),

    #[error("timed out")]
    Timeout,

    #[error("decode: {0}")]
    Decode(String),
}

impl AttemptError {
    /// Turn the last attempt failure into the terminal error.
    pub fn into_terminal(self, attempts: u32, timeout_ms: u64) -> WorkflowError {
        match self {
            AttemptError::Upstream { status, payload } => WorkflowError::Upstream {
                attempts,
                status,
                payload,
            },
            AttemptError::Transport(message) => WorkflowError::Transport { attempts, message },
            AttemptError::Timeout => WorkflowError::Timeout {
                attempts,
                timeout_ms,
            },
            AttemptError::Decode(message) => WorkflowError::Decode { attempts, message },
        }
    }
}

impl From<reqwest::Error> for AttemptError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AttemptError::Timeout
        } else {
            AttemptError::Transport(err.to_string())
        }
    }
}
