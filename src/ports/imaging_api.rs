//! Imaging API port: Trait for the remote analysis and records service.
//!
//! The service is a black box with a fixed contract:
//! - `POST /analyze-image` (multipart field `file`) → `{ analysis }`
//! - `GET /patients/search?query=` → `{ patients }`
//! - `GET /patient/{id}` → patient record, 404 when unknown
//! - `GET /health` → `{ status }`

use std::future::Future;
use std::time::Duration;

use crate::domain::{AnalysisResult, PatientRecord, PatientSummary, ScanImageRef, UploadCandidate};

/// Message shown when a failed analysis carries no server detail.
pub const ANALYSIS_FALLBACK_MESSAGE: &str = "Analysis failed. Please try again.";

/// Failures talking to the remote service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, interrupted body, ...
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-2xx response other than 404.
    #[error("Server error {status}{}", detail_suffix(.detail))]
    Server { status: u16, detail: Option<String> },

    /// 404-class response.
    #[error("Not found{}", detail_suffix(.detail))]
    NotFound { detail: Option<String> },

    /// A 2xx body that does not match the expected contract.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl ApiError {
    /// Server-supplied `detail`, when the error body carried one.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Server { detail, .. } | Self::NotFound { detail } => detail.as_deref(),
            _ => None,
        }
    }

    /// Message for the user: the server detail verbatim, else `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_string()
    }
}

/// Service health as reported by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
}

/// Remote imaging and records service.
///
/// Implementations must be cheap to share across tasks; every call is
/// independent and carries no client-side state.
pub trait ImagingApi: Send + Sync {
    /// Submit an image for analysis.
    ///
    /// # Errors
    /// Any [`ApiError`]; `MalformedResponse` when the body lacks a valid `analysis`.
    fn analyze_image(
        &self,
        candidate: &UploadCandidate,
    ) -> impl Future<Output = Result<AnalysisResult, ApiError>> + Send;

    /// Search patients by free text (name or identifier).
    ///
    /// # Errors
    /// Any [`ApiError`].
    fn search_patients(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<PatientSummary>, ApiError>> + Send;

    /// Fetch one full patient record.
    ///
    /// # Errors
    /// `NotFound` for unknown identifiers, otherwise any [`ApiError`].
    fn fetch_patient(
        &self,
        patient_id: &str,
    ) -> impl Future<Output = Result<PatientRecord, ApiError>> + Send;

    /// Check service availability.
    ///
    /// # Errors
    /// Any [`ApiError`].
    fn health(&self) -> impl Future<Output = Result<HealthStatus, ApiError>> + Send;

    /// Absolute location of a scan image referenced by a patient record.
    ///
    /// # Errors
    /// `MalformedResponse` when the reference cannot be resolved.
    fn image_url(&self, image: &ScanImageRef) -> Result<String, ApiError>;
}
