//! Report-State: records and collaborator seams for the report pipeline
//!
//! This crate owns the data the pipeline reads and writes but never talks to
//! a concrete database or bucket itself. Backends implement the traits in
//! `storage_traits`; tests use the in-memory `fakes`.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: a closed report status set with an explicit transition table.
//!
//! ## Key Components
//!
//! - `Report` / `ReportStatus`: the record and its state machine
//! - `ReportRepository`, `AnalysisResultLog`, `ArtifactStore`: collaborator traits
//! - `ContentDigest`: SHA-256 identity of rendered artifacts

mod error;
pub mod fakes;
pub mod report;
pub mod storage_traits;

pub use error::StorageError;
pub use report::{
    AnalysisResult, ExperimentFileDescriptor, FileRef, FileType, Report, ReportId, ReportStatus,
};
pub use storage_traits::{
    AnalysisResultLog, ArtifactStore, ContentDigest, ReportRepository, StorageResult,
};
