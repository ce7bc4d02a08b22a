//! Error types for docx-report

use thiserror::Error;

/// Errors that can occur while rendering a report document
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid figure image: {0}")]
    InvalidImage(String),

    #[error("Section '{section}' has {count} entries, limit is {limit}")]
    SectionLimitExceeded {
        section: String,
        count: usize,
        limit: usize,
    },

    #[error("Failed to write DOCX package: {0}")]
    Pack(String),
}

/// Result type for render operations
pub type Result<T> = std::result::Result<T, RenderError>;
