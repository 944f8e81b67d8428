//! Patient detail loader: Fetches one full record per user selection.

use crate::domain::PatientRecord;
use crate::ports::ApiError;

use super::sequence::RequestSequence;

/// A detail fetch to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTicket {
    pub seq: u64,
    pub patient_id: String,
}

/// Why a selected patient could not be shown.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatientLoadError {
    #[error("Patient {0} not found")]
    NotFound(String),

    #[error("Failed to fetch patient details: {0}")]
    Transport(String),
}

impl PatientLoadError {
    fn from_api(patient_id: &str, err: ApiError) -> Self {
        match err {
            ApiError::NotFound { .. } => Self::NotFound(patient_id.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Holds the single selected record and the latest pending selection.
///
/// A failed load leaves the previously displayed record untouched.
#[derive(Debug, Default)]
pub struct PatientDetailLoader {
    selected: Option<PatientRecord>,
    pending: Option<DetailTicket>,
    last_error: Option<PatientLoadError>,
    sequence: RequestSequence,
}

impl PatientDetailLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&PatientRecord> {
        self.selected.as_ref()
    }

    /// Identifier of the selection currently being fetched.
    #[must_use]
    pub fn pending_id(&self) -> Option<&str> {
        self.pending.as_ref().map(|t| t.patient_id.as_str())
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&PatientLoadError> {
        self.last_error.as_ref()
    }

    /// Start loading a patient, superseding any earlier selection.
    pub fn select(&mut self, patient_id: impl Into<String>) -> DetailTicket {
        let ticket = DetailTicket {
            seq: self.sequence.issue(),
            patient_id: patient_id.into(),
        };
        self.pending = Some(ticket.clone());
        self.last_error = None;
        ticket
    }

    /// Apply a fetch outcome.
    ///
    /// Returns `Ok(true)` when the record became the selection, `Ok(false)`
    /// when the response belonged to a superseded selection.
    ///
    /// # Errors
    /// The load failure for the current selection. It is also kept in
    /// [`last_error`](Self::last_error) for display.
    pub fn on_response(
        &mut self,
        seq: u64,
        outcome: Result<PatientRecord, ApiError>,
    ) -> Result<bool, PatientLoadError> {
        if !self.sequence.is_current(seq) {
            tracing::debug!(seq, "Dropping stale patient detail response");
            return Ok(false);
        }
        let Some(ticket) = self.pending.take() else {
            return Ok(false);
        };

        match outcome {
            Ok(record) => {
                tracing::info!(patient_id = %record.patient_id(), "Patient record loaded");
                self.selected = Some(record);
                Ok(true)
            }
            Err(e) => {
                let err = PatientLoadError::from_api(&ticket.patient_id, e);
                tracing::warn!(patient_id = %ticket.patient_id, "{}", err);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PatientSummary;

    fn record(id: &str, name: &str) -> PatientRecord {
        PatientRecord {
            summary: PatientSummary {
                patient_id: id.to_string(),
                name: name.to_string(),
                age: 38,
                gender: "Female".to_string(),
                diagnosis: "Meningioma".to_string(),
            },
            medical_summary: Some("AI Summary".to_string()),
            medical_history: Some("Seizures, memory loss".to_string()),
            scan_type: None,
            scan_images: vec![],
        }
    }

    #[test]
    fn test_load_selects_record() {
        let mut loader = PatientDetailLoader::new();
        let t = loader.select("P002");
        assert_eq!(loader.pending_id(), Some("P002"));

        assert_eq!(loader.on_response(t.seq, Ok(record("P002", "Sarah Johnson"))), Ok(true));
        assert_eq!(loader.selected().map(PatientRecord::patient_id), Some("P002"));
        assert!(loader.pending_id().is_none());
    }

    #[test]
    fn test_last_selection_wins() {
        let mut loader = PatientDetailLoader::new();
        let first = loader.select("P001");
        let second = loader.select("P003");

        assert_eq!(loader.on_response(second.seq, Ok(record("P003", "Mike Wilson"))), Ok(true));
        assert_eq!(loader.on_response(first.seq, Ok(record("P001", "John Smith"))), Ok(false));
        assert_eq!(loader.selected().map(PatientRecord::patient_id), Some("P003"));
    }

    #[test]
    fn test_failure_keeps_previous_record() {
        let mut loader = PatientDetailLoader::new();
        let t = loader.select("P001");
        loader.on_response(t.seq, Ok(record("P001", "John Smith"))).expect("ok");

        let t = loader.select("P999");
        let err = loader
            .on_response(
                t.seq,
                Err(ApiError::NotFound {
                    detail: Some("Patient not found".to_string()),
                }),
            )
            .unwrap_err();
        assert_eq!(err, PatientLoadError::NotFound("P999".to_string()));
        assert_eq!(loader.selected().map(PatientRecord::patient_id), Some("P001"));
        assert_eq!(loader.last_error(), Some(&err));
    }

    #[test]
    fn test_transport_failure_is_classified() {
        let mut loader = PatientDetailLoader::new();
        let t = loader.select("P001");
        let err = loader
            .on_response(t.seq, Err(ApiError::Transport("connection reset".into())))
            .unwrap_err();
        assert!(matches!(err, PatientLoadError::Transport(_)));
        assert!(loader.selected().is_none());

        // A new selection clears the previous error.
        loader.select("P002");
        assert!(loader.last_error().is_none());
    }
}
