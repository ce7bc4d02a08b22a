//! Workflow client
//!
//! Posts analysis inputs to the external workflow service and returns its
//! decoded response. Every failed attempt is retried after a fixed delay,
//! up to a bounded number of attempts (3 attempts, 2 s apart, by default).

pub mod client;
pub mod config;
pub mod error;
pub mod response;
pub mod retry;
pub mod transport;

pub use client::{Result, WorkflowClient, WorkflowRunner};
pub use config::{WorkflowConfig, DEFAULT_TIMEOUT_MS, WORKFLOW_RUN_PATH};
pub use error::{AttemptError, WorkflowError};
pub use response::{RunOptions, WorkflowRequest, WorkflowResponse};
pub use retry::{
    should_retry, Delay, RetryPolicy, TokioDelay, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY_MS,
};
pub use transport::{HttpTransport, WorkflowTransport};
