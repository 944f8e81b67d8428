//! Domain layer: Core types and pure logic.
//!
//! Nothing in here performs I/O beyond reading a selected file from disk.
//! All types are serializable.

mod analysis;
mod patient;
mod upload;

pub use analysis::{
    classify, AnalysisResult, ConfidenceBand, SeverityClassification, SeverityTier,
};
pub use patient::{PatientRecord, PatientSummary, ScanImageRef};
pub use upload::{validate, Preview, UploadCandidate, ValidationError, MAX_UPLOAD_BYTES};
