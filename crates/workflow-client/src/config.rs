//! Workflow endpoint configuration

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::retry::RetryPolicy;

/// Request timeout per attempt (10 minutes; workflows are long-running)
pub const DEFAULT_TIMEOUT_MS: u64 = 600_000;

/// Path of the run endpoint, appended to the base URL
pub const WORKFLOW_RUN_PATH: &str = "/v1/workflows/run";

pub const ENV_API_URL: &str = "DIFY_API_URL";
pub const ENV_API_KEY: &str = "DIFY_API_KEY";
pub const ENV_TIMEOUT_MS: &str = "DIFY_TIMEOUT_MS";

/// Workflow configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Base URL of the workflow service, without the run path
    pub base_url: String,
    /// Bearer token
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Per-attempt request timeout in milliseconds
    pub timeout_ms: u64,
    /// Attempt bound and fixed delay
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for WorkflowConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout_ms", &self.timeout_ms)
            .field("retry", &self.retry)
            .finish()
    }
}

impl WorkflowConfig {
    /// Create a config for an endpoint. Blank values are rejected.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, WorkflowError> {
        let base_url = base_url.trim();
        let api_key = api_key.trim();
        if base_url.is_empty() {
            return Err(WorkflowError::Configuration(format!(
                "missing {}",
                ENV_API_URL
            )));
        }
        if api_key.is_empty() {
            return Err(WorkflowError::Configuration(format!(
                "missing {}",
                ENV_API_KEY
            )));
        }
        Ok(WorkflowConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry: RetryPolicy::default(),
        })
    }

    /// Create a config from `DIFY_API_URL`, `DIFY_API_KEY` and the optional
    /// `DIFY_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, WorkflowError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WorkflowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_API_URL).unwrap_or_default();
        let api_key = lookup(ENV_API_KEY).unwrap_or_default();
        let mut config = Self::new(&base_url, &api_key)?;
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            config.timeout_ms = raw.trim().parse::<u64>().map_err(|_| {
                WorkflowError::Configuration(format!("{} is not a number: {}", ENV_TIMEOUT_MS, raw))
            })?;
        }
        Ok(config)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Full URL of the run endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, WORKFLOW_RUN_PATH)
    }
}
