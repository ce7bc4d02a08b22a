//! Single-attempt transport to the workflow endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::error::{AttemptError, WorkflowError};
use crate::response::WorkflowRequest;

/// One POST to the run endpoint. Retrying is the caller's concern.
#[async_trait]
pub trait WorkflowTransport: Send + Sync {
    /// Send the request and return the parsed 2xx body.
    async fn send(&self, request: &WorkflowRequest) -> Result<Value, AttemptError>;
}

/// reqwest-backed transport with Bearer auth and a per-request timeout.
pub struct HttpTransport {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(config: &WorkflowConfig) -> Result<Self, WorkflowError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(concat!("labreport/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                WorkflowError::Configuration(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl WorkflowTransport for HttpTransport {
    async fn send(&self, request: &WorkflowRequest) -> Result<Value, AttemptError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed = serde_json::from_str::<Value>(&body);

        if !status.is_success() {
            // Non-JSON error bodies are kept as a string payload.
            let payload = parsed.unwrap_or(Value::String(body));
            return Err(AttemptError::Upstream {
                status: status.as_u16(),
                payload,
            });
        }

        parsed.map_err(|e| AttemptError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_uses_run_endpoint() {
        let config = WorkflowConfig::new("http://localhost:5001/", "key").unwrap();
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.endpoint(), "http://localhost:5001/v1/workflows/run");
    }
}
