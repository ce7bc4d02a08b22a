//! Trait contract tests for ReportRepository, AnalysisResultLog and ArtifactStore.
//!
//! These tests verify the behavioral contracts of the collaborator traits
//! using in-memory fakes. Any conforming implementation must pass these.

use report_state::fakes::{MemoryAnalysisResultLog, MemoryArtifactStore, MemoryReportRepository};
use report_state::storage_traits::*;
use report_state::{
    ExperimentFileDescriptor, FileRef, FileType, ReportId, ReportStatus, StorageError,
};

// ===========================================================================
// ReportRepository contract tests
// ===========================================================================

#[tokio::test]
async fn repo_create_starts_in_draft() {
    let repo = MemoryReportRepository::new();
    let report = repo.create_report("user-1", "Titration").await.unwrap();

    assert_eq!(report.status, ReportStatus::Draft);
    assert!(report.file_ref.is_none());
    assert_eq!(report.user_id, "user-1");
    assert_eq!(report.title, "Titration");
}

#[tokio::test]
async fn repo_get_not_found() {
    let repo = MemoryReportRepository::new();
    let err = repo.get_report(&ReportId::new()).await.unwrap_err();

    assert!(matches!(err, StorageError::ReportNotFound { .. }));
}

#[tokio::test]
async fn repo_happy_path_transitions() {
    let repo = MemoryReportRepository::new();
    let report = repo.create_report("u", "t").await.unwrap();

    repo.transition(&report.id, ReportStatus::Processing, None)
        .await
        .unwrap();
    let done = repo
        .transition(
            &report.id,
            ReportStatus::Completed,
            Some(FileRef("u/r/generated.docx".to_string())),
        )
        .await
        .unwrap();

    assert_eq!(done.status, ReportStatus::Completed);
    assert_eq!(done.file_ref, Some(FileRef("u/r/generated.docx".to_string())));
    assert_eq!(
        repo.status_history(&report.id),
        vec![
            ReportStatus::Draft,
            ReportStatus::Processing,
            ReportStatus::Completed
        ]
    );
}

#[tokio::test]
async fn repo_rejects_draft_to_completed() {
    let repo = MemoryReportRepository::new();
    let report = repo.create_report("u", "t").await.unwrap();

    let err = repo
        .transition(
            &report.id,
            ReportStatus::Completed,
            Some(FileRef("x".to_string())),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StorageError::InvalidTransition {
            from: ReportStatus::Draft,
            to: ReportStatus::Completed,
            ..
        }
    ));
    assert_eq!(
        repo.get_report(&report.id).await.unwrap().status,
        ReportStatus::Draft
    );
}

#[tokio::test]
async fn repo_completed_requires_file_ref() {
    let repo = MemoryReportRepository::new();
    let report = repo.create_report("u", "t").await.unwrap();
    repo.transition(&report.id, ReportStatus::Processing, None)
        .await
        .unwrap();

    let err = repo
        .transition(&report.id, ReportStatus::Completed, None)
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::MissingFileRef { .. }));
    assert_eq!(
        repo.get_report(&report.id).await.unwrap().status,
        ReportStatus::Processing
    );
}

#[tokio::test]
async fn repo_error_keeps_file_ref_null() {
    let repo = MemoryReportRepository::new();
    let report = repo.create_report("u", "t").await.unwrap();
    repo.transition(&report.id, ReportStatus::Processing, None)
        .await
        .unwrap();
    let failed = repo
        .transition(
            &report.id,
            ReportStatus::Error,
            Some(FileRef("ignored".to_string())),
        )
        .await
        .unwrap();

    assert_eq!(failed.status, ReportStatus::Error);
    assert!(failed.file_ref.is_none());
}

#[tokio::test]
async fn repo_terminal_states_reenter_processing() {
    let repo = MemoryReportRepository::new();
    let report = repo.create_report("u", "t").await.unwrap();
    repo.transition(&report.id, ReportStatus::Processing, None)
        .await
        .unwrap();
    repo.transition(&report.id, ReportStatus::Error, None)
        .await
        .unwrap();

    let again = repo
        .transition(&report.id, ReportStatus::Processing, None)
        .await
        .unwrap();
    assert_eq!(again.status, ReportStatus::Processing);
}

#[tokio::test]
async fn repo_experiment_files_keep_order() {
    let repo = MemoryReportRepository::new();
    let report = repo.create_report("u", "t").await.unwrap();
    for name in ["a.pdf", "b.png", "c.xlsx"] {
        repo.add_experiment_file(
            &report.id,
            ExperimentFileDescriptor {
                file_name: name.to_string(),
                file_type: FileType::Document,
                file_url: FileRef(format!("u/{}", name)),
                uploaded_at: None,
            },
        )
        .await
        .unwrap();
    }

    let files = repo.experiment_files(&report.id).await.unwrap();
    let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "b.png", "c.xlsx"]);
}

// ===========================================================================
// AnalysisResultLog contract tests
// ===========================================================================

#[tokio::test]
async fn log_latest_returns_most_recent() {
    let log = MemoryAnalysisResultLog::new();
    let report_id = ReportId::new();

    assert!(log.latest(&report_id).await.unwrap().is_none());

    log.record(&report_id, serde_json::json!({"n": 1}))
        .await
        .unwrap();
    log.record(&report_id, serde_json::json!({"n": 2}))
        .await
        .unwrap();

    let latest = log.latest(&report_id).await.unwrap().unwrap();
    assert_eq!(latest.raw_response["n"], 2);
    assert_eq!(latest.report_id, report_id);
    assert_eq!(log.count(&report_id), 2);
}

// ===========================================================================
// ArtifactStore contract tests
// ===========================================================================

#[tokio::test]
async fn store_upload_download_round_trip() {
    let store = MemoryArtifactStore::new();
    let data: Vec<u8> = (0u8..=255).collect();
    let file_ref = store
        .upload("u/r/out.docx", &data, "application/octet-stream")
        .await
        .unwrap();

    assert_eq!(store.download(&file_ref).await.unwrap(), data);
    assert_eq!(store.digest(&file_ref), Some(ContentDigest::from_bytes(&data)));
}

#[tokio::test]
async fn store_download_missing() {
    let store = MemoryArtifactStore::new();
    let err = store
        .download(&FileRef("nope".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::ObjectNotFound { .. }));
}

#[tokio::test]
async fn store_upload_overwrites() {
    let store = MemoryArtifactStore::new();
    store.upload("p", b"one", "text/plain").await.unwrap();
    let file_ref = store.upload("p", b"two", "text/plain").await.unwrap();

    assert_eq!(store.download(&file_ref).await.unwrap(), b"two");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn store_failure_switch() {
    let store = MemoryArtifactStore::new();
    store.fail_uploads(true);

    let err = store.upload("p", b"x", "text/plain").await.unwrap_err();
    assert!(matches!(err, StorageError::Backend(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn store_resolve_url_requires_object() {
    let store = MemoryArtifactStore::new();
    let file_ref = store.insert("u/r/manual.pdf", b"%PDF", "application/pdf");

    assert_eq!(
        store.resolve_url(&file_ref).await.unwrap(),
        "memory://u/r/manual.pdf"
    );
    assert!(store
        .resolve_url(&FileRef("missing".to_string()))
        .await
        .is_err());
}

#[test]
fn digest_rejects_non_hex() {
    assert!(ContentDigest::try_from("xyz".to_string()).is_err());
    let good = ContentDigest::from_bytes(b"abc");
    assert_eq!(
        ContentDigest::try_from(good.as_str().to_uppercase()).unwrap(),
        good
    );
    assert_eq!(good.short().len(), 12);
}
