//! # Medlens
//!
//! Terminal client for a remote medical imaging analysis service.
//!
//! This crate provides:
//! - Client-side validation and submission of scans for analysis
//! - Severity and confidence classification of returned diagnoses
//! - Patient search and record lookup
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (upload candidates, analysis results, patients)
//! - `ports`: The `ImagingApi` boundary to the remote service
//! - `adapters`: Concrete implementations (reqwest, log sanitization)
//! - `application`: Controllers orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use config::ClientConfig;
pub use domain::{AnalysisResult, PatientRecord, SeverityTier, UploadCandidate};

/// Result type for Medlens operations
pub type Result<T> = std::result::Result<T, MedlensError>;

/// Main error type for Medlens
#[derive(Debug, thiserror::Error)]
pub enum MedlensError {
    #[error("Invalid file: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Imaging service error: {0}")]
    Api(#[from] ports::ApiError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
