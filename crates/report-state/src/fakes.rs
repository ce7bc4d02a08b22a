//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `MemoryReportRepository`, `MemoryAnalysisResultLog` and
//! `MemoryArtifactStore` that satisfy the trait contracts without any
//! external service. Each fake can be told to fail so callers can exercise
//! their error paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StorageError;
use crate::report::{
    AnalysisResult, ExperimentFileDescriptor, FileRef, Report, ReportId, ReportStatus,
};
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryReportRepository
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ReportState {
    record: Report,
    files: Vec<ExperimentFileDescriptor>,
    history: Vec<ReportStatus>,
}

/// In-memory report repository backed by a `HashMap<ReportId, ReportState>`.
///
/// Every status a report has held is kept so tests can assert the exact
/// sequence of transitions.
#[derive(Debug, Default)]
pub struct MemoryReportRepository {
    reports: Mutex<HashMap<ReportId, ReportState>>,
}

impl MemoryReportRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status history of a report, oldest first (starts with `Draft`).
    pub fn status_history(&self, id: &ReportId) -> Vec<ReportStatus> {
        let reports = self.reports.lock().unwrap();
        reports
            .get(id)
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReportRepository for MemoryReportRepository {
    async fn create_report(&self, user_id: &str, title: &str) -> StorageResult<Report> {
        let record = Report::draft(user_id, title);
        let mut reports = self.reports.lock().unwrap();
        reports.insert(
            record.id,
            ReportState {
                record: record.clone(),
                files: Vec::new(),
                history: vec![ReportStatus::Draft],
            },
        );
        Ok(record)
    }

    async fn get_report(&self, id: &ReportId) -> StorageResult<Report> {
        let reports = self.reports.lock().unwrap();
        reports
            .get(id)
            .map(|s| s.record.clone())
            .ok_or_else(|| StorageError::ReportNotFound {
                report_id: id.to_string(),
            })
    }

    async fn transition(
        &self,
        id: &ReportId,
        to: ReportStatus,
        file_ref: Option<FileRef>,
    ) -> StorageResult<Report> {
        let mut reports = self.reports.lock().unwrap();
        let state = reports
            .get_mut(id)
            .ok_or_else(|| StorageError::ReportNotFound {
                report_id: id.to_string(),
            })?;
        let from = state.record.status;
        if !from.can_transition_to(to) {
            return Err(StorageError::InvalidTransition {
                report_id: id.to_string(),
                from,
                to,
            });
        }
        if to == ReportStatus::Completed {
            let file_ref = file_ref.ok_or_else(|| StorageError::MissingFileRef {
                report_id: id.to_string(),
            })?;
            state.record.file_ref = Some(file_ref);
        }
        state.record.status = to;
        state.record.updated_at = Utc::now();
        state.history.push(to);
        Ok(state.record.clone())
    }

    async fn add_experiment_file(
        &self,
        id: &ReportId,
        file: ExperimentFileDescriptor,
    ) -> StorageResult<()> {
        let mut reports = self.reports.lock().unwrap();
        let state = reports
            .get_mut(id)
            .ok_or_else(|| StorageError::ReportNotFound {
                report_id: id.to_string(),
            })?;
        state.files.push(file);
        Ok(())
    }

    async fn experiment_files(
        &self,
        id: &ReportId,
    ) -> StorageResult<Vec<ExperimentFileDescriptor>> {
        let reports = self.reports.lock().unwrap();
        reports
            .get(id)
            .map(|s| s.files.clone())
            .ok_or_else(|| StorageError::ReportNotFound {
                report_id: id.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// MemoryAnalysisResultLog
// ---------------------------------------------------------------------------

/// In-memory analysis log backed by a `HashMap<ReportId, Vec<AnalysisResult>>`.
#[derive(Debug, Default)]
pub struct MemoryAnalysisResultLog {
    results: Mutex<HashMap<ReportId, Vec<AnalysisResult>>>,
}

impl MemoryAnalysisResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of responses recorded for a report.
    pub fn count(&self, report_id: &ReportId) -> usize {
        let results = self.results.lock().unwrap();
        results.get(report_id).map(Vec::len).unwrap_or(0)
    }
}

#[async_trait]
impl AnalysisResultLog for MemoryAnalysisResultLog {
    async fn record(
        &self,
        report_id: &ReportId,
        raw_response: serde_json::Value,
    ) -> StorageResult<AnalysisResult> {
        let record = AnalysisResult {
            id: uuid::Uuid::new_v4(),
            report_id: *report_id,
            raw_response,
            created_at: Utc::now(),
        };
        let mut results = self.results.lock().unwrap();
        results.entry(*report_id).or_default().push(record.clone());
        Ok(record)
    }

    async fn latest(&self, report_id: &ReportId) -> StorageResult<Option<AnalysisResult>> {
        let results = self.results.lock().unwrap();
        Ok(results.get(report_id).and_then(|r| r.last().cloned()))
    }
}

// ---------------------------------------------------------------------------
// MemoryArtifactStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
    digest: ContentDigest,
}

/// In-memory blob store backed by a `HashMap<path, object>`.
///
/// `fail_uploads(true)` makes every subsequent upload return a backend error.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    fail_uploads: AtomicBool,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Store an object directly, bypassing the failure switch.
    pub fn insert(&self, path: &str, bytes: &[u8], content_type: &str) -> FileRef {
        let mut objects = self.objects.lock().unwrap();
        objects.insert(
            path.to_string(),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
                digest: ContentDigest::from_bytes(bytes),
            },
        );
        FileRef(path.to_string())
    }

    pub fn contains(&self, file_ref: &FileRef) -> bool {
        let objects = self.objects.lock().unwrap();
        objects.contains_key(file_ref.as_str())
    }

    pub fn content_type(&self, file_ref: &FileRef) -> Option<String> {
        let objects = self.objects.lock().unwrap();
        objects.get(file_ref.as_str()).map(|o| o.content_type.clone())
    }

    pub fn digest(&self, file_ref: &FileRef) -> Option<ContentDigest> {
        let objects = self.objects.lock().unwrap();
        objects.get(file_ref.as_str()).map(|o| o.digest.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> StorageResult<FileRef> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!("upload rejected: {}", path)));
        }
        Ok(self.insert(path, bytes, content_type))
    }

    async fn download(&self, file_ref: &FileRef) -> StorageResult<Vec<u8>> {
        let objects = self.objects.lock().unwrap();
        objects
            .get(file_ref.as_str())
            .map(|o| o.bytes.clone())
            .ok_or_else(|| StorageError::ObjectNotFound {
                path: file_ref.to_string(),
            })
    }

    async fn resolve_url(&self, file_ref: &FileRef) -> StorageResult<String> {
        if !self.contains(file_ref) {
            return Err(StorageError::ObjectNotFound {
                path: file_ref.to_string(),
            });
        }
        Ok(format!("memory://{}", file_ref.as_str()))
    }
}
