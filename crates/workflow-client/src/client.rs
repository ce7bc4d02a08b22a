//! Retrying workflow client.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::config::{WorkflowConfig, DEFAULT_TIMEOUT_MS};
use crate::error::WorkflowError;
use crate::response::{RunOptions, WorkflowRequest, WorkflowResponse};
use crate::retry::{should_retry, Delay, RetryPolicy, TokioDelay};
use crate::transport::{HttpTransport, WorkflowTransport};

/// Result type for workflow operations
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Something that can run the analysis workflow.
#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    async fn run_workflow(
        &self,
        inputs: Map<String, Value>,
        options: RunOptions,
    ) -> Result<WorkflowResponse>;
}

/// Workflow client: a transport, a fixed-delay retry policy and a delay seam.
pub struct WorkflowClient {
    transport: Arc<dyn WorkflowTransport>,
    delay: Arc<dyn Delay>,
    retry: RetryPolicy,
    timeout_ms: u64,
}

impl WorkflowClient {
    /// Create a client talking HTTP to the configured endpoint.
    pub fn new(config: WorkflowConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self {
            transport: Arc::new(transport),
            delay: Arc::new(TokioDelay),
            retry: config.retry,
            timeout_ms: config.timeout_ms,
        })
    }

    /// Create a client from the `DIFY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(WorkflowConfig::from_env()?)
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(transport: Arc<dyn WorkflowTransport>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            delay: Arc::new(TokioDelay),
            retry,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// POST the inputs, retrying every failed attempt up to the policy bound.
    ///
    /// The terminal error describes the last attempt.
    pub async fn run_workflow(
        &self,
        inputs: Map<String, Value>,
        options: RunOptions,
    ) -> Result<WorkflowResponse> {
        let request = WorkflowRequest {
            inputs,
            files: options.files,
            user: options.user,
        };
        let max_attempts = self.retry.effective_max_attempts();
        let mut failed = 0u32;

        loop {
            let attempt = failed + 1;
            debug!(attempt, max_attempts, "Sending workflow request");

            let outcome = self
                .transport
                .send(&request)
                .await
                .and_then(WorkflowResponse::from_value);

            match outcome {
                Ok(response) => {
                    debug!(
                        attempt,
                        run_id = %response.id,
                        status = %response.status,
                        "Workflow request succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    failed += 1;
                    if !should_retry(failed, max_attempts) {
                        error!(attempts = failed, error = %e, "Workflow request failed");
                        return Err(e.into_terminal(failed, self.timeout_ms));
                    }
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = self.retry.delay_ms,
                        error = %e,
                        "Workflow attempt failed, retrying"
                    );
                    self.delay.sleep(self.retry.delay()).await;
                }
            }
        }
    }
}

#[async_trait]
impl WorkflowRunner for WorkflowClient {
    async fn run_workflow(
        &self,
        inputs: Map<String, Value>,
        options: RunOptions,
    ) -> Result<WorkflowResponse> {
        WorkflowClient::run_workflow(self, inputs, options).await
    }
}
