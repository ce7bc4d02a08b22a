//! Report generation orchestration and status tracking.

use std::sync::Arc;
use std::time::Instant;

use docx_report::{DocxRenderer, GenerateReportInput, RenderLimits, DOCX_CONTENT_TYPE};
use report_state::{
    AnalysisResultLog, ArtifactStore, ContentDigest, ExperimentFileDescriptor, FileRef, Report,
    ReportId, ReportRepository, ReportStatus, StorageError,
};
use serde_json::Value;
use tracing::{info, warn, Instrument};
use uuid::Uuid;
use workflow_client::{RunOptions, WorkflowRunner};

use crate::error::{PipelineError, Result};
use crate::extract::extract_result_json;
use crate::inputs::{
    apply_table_rows, load_figure_images, load_table_rows, select_source_document,
    workflow_inputs,
};
use crate::obs::{
    emit_run_failed, emit_run_finished, emit_run_started, emit_status_transition,
    emit_workflow_completed, emit_workflow_requested, run_span,
};
use crate::request::GenerateRequest;

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub report_id: ReportId,
    /// Reference of the uploaded DOCX
    pub file_ref: FileRef,
    pub digest: ContentDigest,
    pub bytes: usize,
    /// Analysis result the document was rendered from, when one exists
    pub analysis_result_id: Option<Uuid>,
    pub duration_ms: u64,
}

/// Where a run takes its workflow output from.
#[derive(Debug, Clone)]
enum Source {
    Workflow,
    Cache,
    Json(Value),
}

impl Source {
    fn mode(&self) -> &'static str {
        match self {
            Source::Workflow => "generate",
            Source::Cache => "regenerate_cache",
            Source::Json(_) => "regenerate_json",
        }
    }

    fn artifact_prefix(&self) -> &'static str {
        match self {
            Source::Workflow => "generated",
            Source::Cache | Source::Json(_) => "regenerated",
        }
    }
}

/// `{user}/{report}/{prefix}-{uuid}.docx`
pub fn artifact_path(user_id: &str, report_id: &ReportId, prefix: &str) -> String {
    format!("{}/{}/{}-{}.docx", user_id, report_id, prefix, Uuid::new_v4())
}

/// Pipeline orchestrator.
///
/// A run walks a report `draft -> processing -> completed | error`. The
/// `processing` write happens before the workflow is called and `completed`
/// only after the artifact upload succeeded. Any failure after `processing`
/// is written as `error` and returned to the caller.
pub struct ReportPipeline {
    reports: Arc<dyn ReportRepository>,
    results: Arc<dyn AnalysisResultLog>,
    artifacts: Arc<dyn ArtifactStore>,
    workflow: Arc<dyn WorkflowRunner>,
    renderer: DocxRenderer,
}

impl ReportPipeline {
    pub fn new(
        reports: Arc<dyn ReportRepository>,
        results: Arc<dyn AnalysisResultLog>,
        artifacts: Arc<dyn ArtifactStore>,
        workflow: Arc<dyn WorkflowRunner>,
    ) -> Self {
        Self {
            reports,
            results,
            artifacts,
            workflow,
            renderer: DocxRenderer::new(),
        }
    }

    pub fn with_render_limits(mut self, limits: RenderLimits) -> Self {
        self.renderer = DocxRenderer::with_limits(limits);
        self
    }

    /// Call the workflow for the report's source document and render the
    /// result.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateOutcome> {
        self.run(request, Source::Workflow).await
    }

    /// Re-render from the latest recorded workflow response.
    pub async fn regenerate_from_cache(&self, request: &GenerateRequest) -> Result<GenerateOutcome> {
        self.run(request, Source::Cache).await
    }

    /// Re-render from caller-supplied workflow output. Accepts either a full
    /// workflow response or the `result_json` value itself.
    pub async fn regenerate_from_json(
        &self,
        request: &GenerateRequest,
        raw: Value,
    ) -> Result<GenerateOutcome> {
        self.run(request, Source::Json(raw)).await
    }

    async fn run(&self, request: &GenerateRequest, source: Source) -> Result<GenerateOutcome> {
        let span = run_span(&request.report_id.to_string(), source.mode());
        self.run_in_span(request, source).instrument(span).await
    }

    async fn run_in_span(
        &self,
        request: &GenerateRequest,
        source: Source,
    ) -> Result<GenerateOutcome> {
        let report_id = request.report_id.to_string();
        let start = Instant::now();
        emit_run_started(&report_id, &request.user_id, source.mode());

        let report = self.load_owned_report(request).await?;
        self.reports
            .transition(&request.report_id, ReportStatus::Processing, None)
            .await?;
        emit_status_transition(&report_id, report.status, ReportStatus::Processing);

        match self.execute(request, &report, source, start).await {
            Ok(outcome) => {
                emit_run_finished(
                    &report_id,
                    outcome.file_ref.as_str(),
                    outcome.bytes,
                    outcome.duration_ms,
                );
                Ok(outcome)
            }
            Err(err) => {
                self.mark_error(&request.report_id).await;
                emit_run_failed(
                    &report_id,
                    err.kind(),
                    &err,
                    start.elapsed().as_millis() as u64,
                );
                Err(err)
            }
        }
    }

    async fn load_owned_report(&self, request: &GenerateRequest) -> Result<Report> {
        let report = match self.reports.get_report(&request.report_id).await {
            Ok(report) => report,
            Err(StorageError::ReportNotFound { .. }) => {
                return Err(PipelineError::ReportNotFound(request.report_id))
            }
            Err(e) => return Err(e.into()),
        };
        // Someone else's report is indistinguishable from a missing one.
        if !report.is_owned_by(&request.user_id) {
            return Err(PipelineError::ReportNotFound(request.report_id));
        }
        Ok(report)
    }

    async fn execute(
        &self,
        request: &GenerateRequest,
        report: &Report,
        source: Source,
        start: Instant,
    ) -> Result<GenerateOutcome> {
        let report_id = request.report_id;
        let files = self.reports.experiment_files(&report_id).await?;
        let document = select_source_document(&files)
            .cloned()
            .ok_or(PipelineError::NoSourceDocument(report_id))?;

        let figure_images = load_figure_images(self.artifacts.as_ref(), &files).await;
        let table_rows = load_table_rows(self.artifacts.as_ref(), &files).await;

        let prefix = source.artifact_prefix();
        let (mut result_json, analysis_result_id) = match source {
            Source::Workflow => self.call_workflow(request, &document).await?,
            Source::Cache => {
                let cached = self
                    .results
                    .latest(&report_id)
                    .await?
                    .ok_or(PipelineError::NoCachedResult(report_id))?;
                let result_json = extract_result_json(&cached.raw_response)
                    .ok_or(PipelineError::MissingResultJson)?;
                (result_json, Some(cached.id))
            }
            Source::Json(raw) => match extract_result_json(&raw) {
                Some(result_json) => (result_json, None),
                None if raw.is_null() => return Err(PipelineError::MissingResultJson),
                None => (raw, None),
            },
        };

        apply_table_rows(&mut result_json, &table_rows);

        let title = document_title(report, &document);
        let bytes = self.renderer.render(&GenerateReportInput {
            title: &title,
            dify_output: &result_json,
            figure_images: &figure_images,
        })?;

        let path = artifact_path(&request.user_id, &report_id, prefix);
        let file_ref = self
            .artifacts
            .upload(&path, &bytes, DOCX_CONTENT_TYPE)
            .await?;
        info!(path = %path, bytes = bytes.len(), "Uploaded report document");

        self.reports
            .transition(&report_id, ReportStatus::Completed, Some(file_ref.clone()))
            .await?;
        emit_status_transition(
            &report_id.to_string(),
            ReportStatus::Processing,
            ReportStatus::Completed,
        );

        Ok(GenerateOutcome {
            report_id,
            file_ref,
            digest: ContentDigest::from_bytes(&bytes),
            bytes: bytes.len(),
            analysis_result_id,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Steps 6 to 9: resolve the document URL, call the workflow, record the
    /// raw response and pull `result_json` out of it.
    async fn call_workflow(
        &self,
        request: &GenerateRequest,
        document: &ExperimentFileDescriptor,
    ) -> Result<(Value, Option<Uuid>)> {
        let report_id = request.report_id;
        let url = self.artifacts.resolve_url(&document.file_url).await?;
        let inputs = workflow_inputs(document, &url);

        emit_workflow_requested(&report_id.to_string(), &document.file_name);
        let response = self
            .workflow
            .run_workflow(inputs, RunOptions::for_user(request.user_id.clone()))
            .await?;
        emit_workflow_completed(
            &report_id.to_string(),
            &response.id,
            &response.status,
            response.elapsed_time,
        );

        let record = self
            .results
            .record(&report_id, response.raw.clone())
            .await?;

        if let Some(message) = response.failure() {
            return Err(PipelineError::WorkflowRunFailed(message));
        }
        let result_json =
            extract_result_json(&response.raw).ok_or(PipelineError::MissingResultJson)?;
        Ok((result_json, Some(record.id)))
    }

    /// Best effort: the original error is what the caller needs to see.
    async fn mark_error(&self, report_id: &ReportId) {
        match self
            .reports
            .transition(report_id, ReportStatus::Error, None)
            .await
        {
            Ok(_) => emit_status_transition(
                &report_id.to_string(),
                ReportStatus::Processing,
                ReportStatus::Error,
            ),
            Err(e) => warn!(report_id = %report_id, error = %e, "Failed to record error status"),
        }
    }
}

fn document_title(report: &Report, document: &ExperimentFileDescriptor) -> String {
    [report.title.trim(), document.file_name.trim()]
        .into_iter()
        .find(|t| !t.is_empty())
        .unwrap_or("report")
        .to_string()
}
