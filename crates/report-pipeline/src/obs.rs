//! Structured lifecycle events for report generation runs.
//!
//! Every run is instrumented with a [`run_span`] carrying `report_id`, and emits
//! `run.started`, one `report.status` per transition, the workflow
//! request/response pair and finally `run.finished` or `run.failed`.

use report_state::ReportStatus;
use tracing::{info, warn, Span};

/// Report-scoped span for one run. Attach it to the run future with
/// `tracing::Instrument` so it is only entered while the future is polled.
///
/// ```ignore
/// run(request).instrument(run_span(&report_id.to_string(), "generate")).await
/// ```
pub fn run_span(report_id: &str, mode: &str) -> Span {
    tracing::info_span!("labreport.run", report_id = %report_id, mode = %mode)
}

pub fn emit_run_started(report_id: &str, user_id: &str, mode: &str) {
    info!(event = "run.started", report_id = %report_id, user_id = %user_id, mode = %mode);
}

pub fn emit_status_transition(report_id: &str, from: ReportStatus, to: ReportStatus) {
    info!(
        event = "report.status",
        report_id = %report_id,
        from = %from,
        to = %to,
    );
}

/// Emitted right before the workflow call.
pub fn emit_workflow_requested(report_id: &str, document: &str) {
    info!(event = "workflow.requested", report_id = %report_id, document = %document);
}

pub fn emit_workflow_completed(report_id: &str, run_id: &str, status: &str, elapsed: Option<f64>) {
    info!(
        event = "workflow.completed",
        report_id = %report_id,
        run_id = %run_id,
        status = %status,
        elapsed_s = elapsed.unwrap_or_default(),
    );
}

pub fn emit_run_finished(report_id: &str, file_ref: &str, bytes: usize, duration_ms: u64) {
    info!(
        event = "run.finished",
        report_id = %report_id,
        file_ref = %file_ref,
        bytes = bytes,
        duration_ms = duration_ms,
    );
}

pub fn emit_run_failed(report_id: &str, kind: &str, error: &dyn std::fmt::Display, duration_ms: u64) {
    warn!(
        event = "run.failed",
        report_id = %report_id,
        kind = %kind,
        error = %error,
        duration_ms = duration_ms,
    );
}
