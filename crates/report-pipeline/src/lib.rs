//! Report Pipeline: from uploaded experiment files to a stored DOCX report
//!
//! A run loads the report, marks it `processing`, sends the source document
//! to the analysis workflow, records the raw response, renders the returned
//! `result_json` with uploaded tables and figures, uploads the document and
//! marks the report `completed`. Failures after `processing` mark it `error`.
//!
//! ## Key Components
//!
//! - `ReportPipeline`: `generate`, `regenerate_from_cache`, `regenerate_from_json`
//! - `GenerateRequest`: validated request body
//! - `inputs` / `extract`: figure, table and `result_json` handling
//! - `telemetry` / `obs`: tracing setup and lifecycle events

mod error;
pub mod extract;
pub mod inputs;
pub mod obs;
pub mod pipeline;
pub mod request;
pub mod telemetry;

pub use error::{PipelineError, Result, ValidationError};
pub use extract::extract_result_json;
pub use inputs::{apply_table_rows, fit_figure_size, select_source_document};
pub use pipeline::{artifact_path, GenerateOutcome, ReportPipeline};
pub use request::GenerateRequest;
pub use telemetry::init_tracing;
