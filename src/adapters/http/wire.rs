//! Wire contracts for the imaging service.
//!
//! Bodies are decoded into these structs and converted into domain types
//! here, so malformed payloads surface as `ApiError::MalformedResponse`
//! instead of half-filled records.

use serde::Deserialize;

use crate::domain::{AnalysisResult, PatientRecord, PatientSummary, ScanImageRef};
use crate::ports::{ApiError, HealthStatus};

/// `POST /analyze-image` success body.
#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeEnvelope {
    pub analysis: WireAnalysis,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireAnalysis {
    pub diagnosis: String,
    #[serde(default)]
    pub description: String,
    pub confidence: f64,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub scan_type: String,
    #[serde(default)]
    pub analysis_time: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl TryFrom<WireAnalysis> for AnalysisResult {
    type Error = ApiError;

    fn try_from(wire: WireAnalysis) -> Result<Self, Self::Error> {
        if !wire.confidence.is_finite() || !(0.0..=100.0).contains(&wire.confidence) {
            return Err(ApiError::MalformedResponse(format!(
                "confidence {} outside [0, 100]",
                wire.confidence
            )));
        }

        Ok(Self {
            diagnosis: wire.diagnosis,
            description: wire.description,
            confidence: wire.confidence,
            severity: wire.severity,
            scan_type: wire.scan_type,
            analysis_time: wire.analysis_time,
            recommendations: wire.recommendations,
            received_at: chrono::Utc::now(),
        })
    }
}

/// `GET /patients/search` body.
#[derive(Debug, Deserialize)]
pub(super) struct SearchEnvelope {
    pub patients: Vec<WireSummary>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireSummary {
    pub patient_id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub diagnosis: String,
}

impl From<WireSummary> for PatientSummary {
    fn from(wire: WireSummary) -> Self {
        Self {
            patient_id: wire.patient_id,
            name: wire.name,
            age: wire.age,
            gender: wire.gender,
            diagnosis: wire.diagnosis,
        }
    }
}

/// `GET /patient/{id}` body: either the record itself or `{ patient: ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum PatientEnvelope {
    Wrapped { patient: WirePatient },
    Bare(WirePatient),
}

impl PatientEnvelope {
    pub fn into_patient(self) -> WirePatient {
        match self {
            Self::Wrapped { patient } | Self::Bare(patient) => patient,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct WirePatient {
    #[serde(flatten)]
    pub summary: WireSummary,
    #[serde(default)]
    pub medical_summary: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub scan_type: Option<String>,
    #[serde(default)]
    pub scan_images: Vec<String>,
}

impl From<WirePatient> for PatientRecord {
    fn from(wire: WirePatient) -> Self {
        Self {
            summary: wire.summary.into(),
            medical_summary: wire.medical_summary,
            medical_history: wire.medical_history,
            scan_type: wire.scan_type,
            scan_images: wire.scan_images.into_iter().map(ScanImageRef).collect(),
        }
    }
}

/// `GET /health` body.
#[derive(Debug, Deserialize)]
pub(super) struct WireHealth {
    pub status: String,
}

impl From<WireHealth> for HealthStatus {
    fn from(wire: WireHealth) -> Self {
        Self {
            status: wire.status,
        }
    }
}

/// Error body of non-2xx responses. Only a string `detail` is honoured;
/// validation errors that carry structured detail are treated as absent.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

pub(super) fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(detail) if !detail.trim().is_empty() => Some(detail),
        _ => None,
    }
}

/// Decode a success body into `T`.
pub(super) fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_with_optional_fields_missing() {
        let body = br#"{"analysis":{"diagnosis":"Glioma","confidence":92,"severity":"High","scan_type":"MRI","analysis_time":"2.1s","recommendations":["Consult oncologist"]}}"#;
        let envelope: AnalyzeEnvelope = decode(body).expect("decode");
        let result = AnalysisResult::try_from(envelope.analysis).expect("valid");
        assert_eq!(result.diagnosis, "Glioma");
        assert_eq!(result.description, "");
        assert_eq!(result.confidence, 92.0);
        assert_eq!(result.recommendations, vec!["Consult oncologist".to_string()]);
    }

    #[test]
    fn test_analysis_confidence_out_of_range() {
        let body = br#"{"analysis":{"diagnosis":"Glioma","confidence":140}}"#;
        let envelope: AnalyzeEnvelope = decode(body).expect("decode");
        let err = AnalysisResult::try_from(envelope.analysis).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn test_missing_analysis_is_malformed() {
        let err = decode::<AnalyzeEnvelope>(br#"{"success":true}"#).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn test_patient_envelope_shapes() {
        let bare = br#"{"patient_id":"P001","name":"John Smith","age":45,"gender":"Male","diagnosis":"Glioma","medical_history":"Headaches","medical_summary":"AI Summary","scan_images":["/images/glioma/sample1.jpg"]}"#;
        let record: PatientRecord = decode::<PatientEnvelope>(bare).expect("bare").into_patient().into();
        assert_eq!(record.patient_id(), "P001");
        assert_eq!(record.scan_images.len(), 1);

        let wrapped = br#"{"success":true,"patient":{"patient_id":"P0002","name":"Sarah Johnson","age":32,"gender":"Female","diagnosis":"Normal","scan_type":"CT"}}"#;
        let record: PatientRecord = decode::<PatientEnvelope>(wrapped).expect("wrapped").into_patient().into();
        assert_eq!(record.patient_id(), "P0002");
        assert_eq!(record.scan_type_label(), "CT");
        assert!(record.scan_images.is_empty());
    }

    #[test]
    fn test_error_detail_only_accepts_strings() {
        assert_eq!(
            error_detail(br#"{"detail":"Invalid image file"}"#),
            Some("Invalid image file".to_string())
        );
        assert_eq!(error_detail(br#"{"detail":[{"loc":["query"]}]}"#), None);
        assert_eq!(error_detail(br#"{"detail":""}"#), None);
        assert_eq!(error_detail(b"<html>Bad Gateway</html>"), None);
    }
}
