//! Patient records as returned by the records service.

use serde::{Deserialize, Serialize};

/// One row of a patient search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub patient_id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub diagnosis: String,
}

/// Reference to a stored scan image, usually a server-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanImageRef(pub String);

impl ScanImageRef {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Full patient record, fetched when a summary row is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(flatten)]
    pub summary: PatientSummary,

    /// AI-generated narrative summary
    pub medical_summary: Option<String>,

    pub medical_history: Option<String>,

    pub scan_type: Option<String>,

    pub scan_images: Vec<ScanImageRef>,
}

impl PatientRecord {
    #[must_use]
    pub fn patient_id(&self) -> &str {
        &self.summary.patient_id
    }

    /// Medical history, or a placeholder when none is recorded.
    #[must_use]
    pub fn medical_history_text(&self) -> &str {
        match self.medical_history.as_deref() {
            Some(history) if !history.trim().is_empty() => history,
            _ => "No medical history available",
        }
    }

    /// Scan modality, defaulting to MRI.
    #[must_use]
    pub fn scan_type_label(&self) -> &str {
        match self.scan_type.as_deref() {
            Some(scan_type) if !scan_type.trim().is_empty() => scan_type,
            _ => "MRI",
        }
    }
}
