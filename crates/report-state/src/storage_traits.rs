//! Collaborator trait definitions
//!
//! These traits are the only way the pipeline touches the outside world:
//! - `ReportRepository`: report records, status transitions, experiment files
//! - `AnalysisResultLog`: raw workflow output kept for audit/regeneration
//! - `ArtifactStore`: blob upload/download for inputs and rendered documents
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::StorageError;
use crate::report::{
    AnalysisResult, ExperimentFileDescriptor, FileRef, Report, ReportId, ReportStatus,
};

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// ContentDigest
// ---------------------------------------------------------------------------

/// SHA-256 hex digest of an artifact, used to identify rendered output in logs
/// and to verify round trips through an `ArtifactStore`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Compute the SHA-256 digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::Digest;
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = StorageError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StorageError::InvalidDigest { digest: s });
        }
        Ok(ContentDigest(s.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ReportRepository
// ---------------------------------------------------------------------------

/// Persistence for reports and their experiment file listings.
///
/// Guarantees:
/// - `transition` only applies changes allowed by
///   [`ReportStatus::can_transition_to`], and refuses `Completed` without a
///   `FileRef`.
/// - `file_ref` is only ever written together with `Completed`; other
///   transitions leave it untouched.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Create a new report in `Draft`.
    async fn create_report(&self, user_id: &str, title: &str) -> StorageResult<Report>;

    /// Fetch a report. Returns `StorageError::ReportNotFound` if absent.
    async fn get_report(&self, id: &ReportId) -> StorageResult<Report>;

    /// Apply a status transition, returning the updated record.
    async fn transition(
        &self,
        id: &ReportId,
        to: ReportStatus,
        file_ref: Option<FileRef>,
    ) -> StorageResult<Report>;

    /// Register an uploaded experiment file against a report.
    async fn add_experiment_file(
        &self,
        id: &ReportId,
        file: ExperimentFileDescriptor,
    ) -> StorageResult<()>;

    /// All experiment files of a report, in registration order.
    async fn experiment_files(&self, id: &ReportId)
        -> StorageResult<Vec<ExperimentFileDescriptor>>;
}

// ---------------------------------------------------------------------------
// AnalysisResultLog
// ---------------------------------------------------------------------------

/// Append-only log of raw workflow responses per report.
#[async_trait]
pub trait AnalysisResultLog: Send + Sync {
    /// Persist a raw response and return the stored record.
    async fn record(
        &self,
        report_id: &ReportId,
        raw_response: serde_json::Value,
    ) -> StorageResult<AnalysisResult>;

    /// Most recently recorded response for a report, if any.
    async fn latest(&self, report_id: &ReportId) -> StorageResult<Option<AnalysisResult>>;
}

// ---------------------------------------------------------------------------
// ArtifactStore
// ---------------------------------------------------------------------------

/// Blob storage for uploaded inputs and rendered artifacts.
///
/// Guarantees:
/// - `download(upload(path, bytes, _))` returns `bytes` exactly.
/// - Uploading to an existing path overwrites it.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store bytes at `path` and return a reference to them.
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str)
        -> StorageResult<FileRef>;

    /// Fetch stored bytes. Returns `StorageError::ObjectNotFound` if absent.
    async fn download(&self, file_ref: &FileRef) -> StorageResult<Vec<u8>>;

    /// A URL the external workflow can fetch the object from.
    async fn resolve_url(&self, file_ref: &FileRef) -> StorageResult<String>;
}
