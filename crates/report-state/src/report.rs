//! Report records and the report status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub uuid::Uuid);

impl ReportId {
    /// Generate a new random ReportId
    pub fn new() -> Self {
        ReportId(uuid::Uuid::new_v4())
    }

    /// Parse a hyphenated UUID string.
    pub fn parse(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s.trim()).ok().map(ReportId)
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque pointer to an object held by the artifact store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef(pub String);

impl FileRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a report.
///
/// Transition table:
/// - any status → `Processing` (a generation run starts)
/// - `Processing` → `Completed` | `Error`
///
/// Nothing else is accepted; `Completed` and `Error` only leave through a
/// fresh run entering `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Draft,
    Processing,
    Completed,
    Error,
}

impl ReportStatus {
    /// Whether `self → next` is in the transition table.
    pub fn can_transition_to(self, next: ReportStatus) -> bool {
        matches!(
            (self, next),
            (_, ReportStatus::Processing)
                | (ReportStatus::Processing, ReportStatus::Completed)
                | (ReportStatus::Processing, ReportStatus::Error)
        )
    }

    /// Terminal for a single run.
    pub fn is_terminal(self) -> bool {
        matches!(self, ReportStatus::Completed | ReportStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Draft => "draft",
            ReportStatus::Processing => "processing",
            ReportStatus::Completed => "completed",
            ReportStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A report owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub user_id: String,
    pub title: String,
    pub status: ReportStatus,
    /// Rendered artifact; set only together with `Completed`
    pub file_ref: Option<FileRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    /// A fresh report in `Draft`.
    pub fn draft(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Report {
            id: ReportId::new(),
            user_id: user_id.into(),
            title: title.into(),
            status: ReportStatus::Draft,
            file_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Kind of an uploaded experiment file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Excel,
    Image,
    Code,
    Document,
    PastReport,
}

/// Uploaded experiment input, supplied to the workflow and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentFileDescriptor {
    pub file_name: String,
    pub file_type: FileType,
    /// Storage reference of the uploaded object
    pub file_url: FileRef,
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl ExperimentFileDescriptor {
    /// Documents are sent to the workflow; PDFs count regardless of tag.
    pub fn is_source_document(&self) -> bool {
        self.file_type == FileType::Document || self.file_name.to_ascii_lowercase().ends_with(".pdf")
    }

    /// Sort key: missing upload times sort first.
    pub fn upload_order(&self) -> i64 {
        self.uploaded_at.map(|t| t.timestamp_millis()).unwrap_or(0)
    }
}

/// Raw workflow response persisted for audit and regeneration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: uuid::Uuid,
    pub report_id: ReportId,
    pub raw_response: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
