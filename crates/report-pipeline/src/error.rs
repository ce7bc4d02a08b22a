//! Error types for report-pipeline

use docx_report::RenderError;
use report_state::{ReportId, StorageError};
use thiserror::Error;
use workflow_client::WorkflowError;

/// Rejected request bodies. Raised before any state is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("request body is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("reportId is missing")]
    MissingReportId,

    #[error("reportId is not a UUID: {0}")]
    InvalidReportId(String),

    #[error("user id is empty")]
    MissingUser,
}

/// Errors that can end a generation run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Report not found: {0}")]
    ReportNotFound(ReportId),

    #[error("No source document uploaded for report {0}")]
    NoSourceDocument(ReportId),

    #[error("Workflow call failed: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Workflow run reported failure: {0}")]
    WorkflowRunFailed(String),

    #[error("Workflow response did not include result_json")]
    MissingResultJson,

    #[error("No cached analysis result for report {0}")]
    NoCachedResult(ReportId),

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PipelineError {
    /// Short machine-readable kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::ReportNotFound(_) => "report_not_found",
            PipelineError::NoSourceDocument(_) => "no_source_document",
            PipelineError::Workflow(_) => "workflow",
            PipelineError::WorkflowRunFailed(_) => "workflow_run_failed",
            PipelineError::MissingResultJson => "missing_result_json",
            PipelineError::NoCachedResult(_) => "no_cached_result",
            PipelineError::Render(_) => "render",
            PipelineError::Storage(_) => "storage",
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
