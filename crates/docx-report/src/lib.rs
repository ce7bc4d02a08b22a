//! DOCX report generation
//!
//! Two pure stages over untyped workflow output:
//!
//! - [`build_doc_template_data`] normalizes whatever shape the workflow
//!   returned into [`DocTemplateData`], falling back to empty defaults.
//! - [`generate_report`] sanitizes, builds, attaches figure images by
//!   position and writes an in-memory DOCX package with `docx-rs`.
//!
//! Neither stage touches the filesystem or the network.

mod error;
pub mod figure;
pub mod layout;
pub mod probe;
pub mod renderer;
pub mod sanitize;
pub mod template_data;

pub use error::{RenderError, Result};
pub use figure::{FigureImage, FALLBACK_HEIGHT, FALLBACK_WIDTH, MAX_DIMENSION};
pub use layout::{attach_figure_images, interleave_blocks, Block, RenderLimits};
pub use renderer::{generate_report, DocxRenderer, GenerateReportInput, DOCX_CONTENT_TYPE};
pub use sanitize::{sanitize_text, sanitize_value, strip_invalid_xml};
pub use template_data::{
    build_doc_template_data, Consideration, ConsiderationUnit, DocTemplateData, Experiment,
    Figure, ReferenceEntry, Table,
};
