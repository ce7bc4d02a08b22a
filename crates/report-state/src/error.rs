//! Error types for report-state

use thiserror::Error;

use crate::report::ReportStatus;

/// Errors raised by the persistence and storage collaborators.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No report with this id exists
    #[error("Report not found: {report_id}")]
    ReportNotFound { report_id: String },

    /// The requested status change is not in the transition table
    #[error("Invalid status transition for report {report_id}: {from} -> {to}")]
    InvalidTransition {
        report_id: String,
        from: ReportStatus,
        to: ReportStatus,
    },

    /// `completed` was requested without an artifact reference
    #[error("Report {report_id} cannot complete without a file reference")]
    MissingFileRef { report_id: String },

    /// Stored object is missing
    #[error("Object not found: {path}")]
    ObjectNotFound { path: String },

    /// Invalid digest string
    #[error("Invalid content digest: {digest}")]
    InvalidDigest { digest: String },

    /// Any other backend failure (network, quota, permissions)
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(format!("serialization failed: {}", err))
    }
}
