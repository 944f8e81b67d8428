//! Patient search controller.
//!
//! Every keystroke goes through [`SearchController::on_query_changed`].
//! Queries shorter than [`MIN_QUERY_CHARS`] clear the list immediately with no
//! network call. Longer queries are issued after an optional debounce window
//! via [`SearchController::poll`]. Only the response for the latest issued
//! query may replace the result list, and failures degrade silently to an
//! empty list.

use std::time::{Duration, Instant};

use crate::domain::PatientSummary;
use crate::ports::ApiError;

use super::sequence::RequestSequence;

/// Minimum query length (in characters) before a search is issued.
pub const MIN_QUERY_CHARS: usize = 2;

/// A search to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
}

#[derive(Debug, Clone)]
struct PendingQuery {
    query: String,
    due_at: Instant,
}

#[derive(Debug)]
pub struct SearchController {
    query: String,
    results: Vec<PatientSummary>,
    loading: bool,
    sequence: RequestSequence,
    pending: Option<PendingQuery>,
    debounce: Duration,
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl SearchController {
    /// Create a controller. A zero `debounce` issues searches on the keystroke
    /// that makes the query long enough.
    #[must_use]
    pub fn new(debounce: Duration) -> Self {
        Self {
            query: String::new(),
            results: Vec::new(),
            loading: false,
            sequence: RequestSequence::new(),
            pending: None,
            debounce,
        }
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn results(&self) -> &[PatientSummary] {
        &self.results
    }

    /// True while a search is debouncing or waiting for its response.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading || self.pending.is_some()
    }

    /// Record a new query string.
    ///
    /// Any outstanding response is invalidated. Returns a ticket when the
    /// search should be issued right away (no debounce configured).
    pub fn on_query_changed(&mut self, query: impl Into<String>, now: Instant) -> Option<SearchTicket> {
        self.query = query.into();
        self.sequence.invalidate();
        self.loading = false;

        if self.query.chars().count() < MIN_QUERY_CHARS {
            self.pending = None;
            self.results.clear();
            return None;
        }

        if self.debounce.is_zero() {
            self.pending = None;
            return Some(self.issue());
        }

        self.pending = Some(PendingQuery {
            query: self.query.clone(),
            due_at: now + self.debounce,
        });
        None
    }

    /// Issue the debounced query once its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<SearchTicket> {
        let due = self.pending.as_ref().is_some_and(|p| now >= p.due_at);
        if !due {
            return None;
        }
        let pending = self.pending.take()?;
        debug_assert_eq!(pending.query, self.query);
        Some(self.issue())
    }

    fn issue(&mut self) -> SearchTicket {
        let seq = self.sequence.issue();
        self.loading = true;
        tracing::debug!(seq, query_len = self.query.chars().count(), "Issuing patient search");
        SearchTicket {
            seq,
            query: self.query.clone(),
        }
    }

    /// Apply a search response. Returns `false` for stale responses.
    pub fn on_response(&mut self, seq: u64, outcome: Result<Vec<PatientSummary>, ApiError>) -> bool {
        if !self.sequence.is_current(seq) {
            tracing::debug!(seq, "Dropping stale search response");
            return false;
        }
        self.loading = false;

        match outcome {
            Ok(patients) => {
                tracing::debug!(seq, count = patients.len(), "Search results received");
                self.results = patients;
            }
            Err(e) => {
                tracing::warn!(seq, "Search failed: {}", e);
                self.results.clear();
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(id: &str, name: &str) -> PatientSummary {
        PatientSummary {
            patient_id: id.to_string(),
            name: name.to_string(),
            age: 45,
            gender: "Male".to_string(),
            diagnosis: "Glioma".to_string(),
        }
    }

    #[test]
    fn test_short_query_clears_without_request() {
        let mut ctl = SearchController::default();
        let now = Instant::now();
        let t = ctl.on_query_changed("Jo", now).expect("issued");
        ctl.on_response(t.seq, Ok(vec![patient("P001", "John Smith")]));
        assert_eq!(ctl.results().len(), 1);

        assert!(ctl.on_query_changed("J", now).is_none());
        assert!(ctl.results().is_empty());
        assert!(!ctl.is_loading());
        assert!(ctl.poll(now + Duration::from_secs(10)).is_none());
    }

    #[test]
    fn test_min_length_counts_characters() {
        let mut ctl = SearchController::default();
        assert!(ctl.on_query_changed("é", Instant::now()).is_none());
        assert!(ctl.on_query_changed("éa", Instant::now()).is_some());
    }

    #[test]
    fn test_empty_response_is_not_an_error() {
        let mut ctl = SearchController::default();
        let t = ctl.on_query_changed("Jo", Instant::now()).expect("issued");
        assert_eq!(t.query, "Jo");
        assert!(ctl.is_loading());

        assert!(ctl.on_response(t.seq, Ok(vec![])));
        assert!(ctl.results().is_empty());
        assert!(!ctl.is_loading());
        assert_eq!(ctl.query(), "Jo");
    }

    #[test]
    fn test_outdated_response_is_ignored() {
        let mut ctl = SearchController::default();
        let now = Instant::now();
        let jo = ctl.on_query_changed("Jo", now).expect("issued");
        let joh = ctl.on_query_changed("Joh", now).expect("issued");

        assert!(ctl.on_response(joh.seq, Ok(vec![patient("P001", "John Smith")])));
        assert!(!ctl.on_response(jo.seq, Ok(vec![patient("P009", "Joanna Doe")])));
        assert_eq!(ctl.results()[0].patient_id, "P001");
    }

    #[test]
    fn test_response_after_shortening_query_is_ignored() {
        let mut ctl = SearchController::default();
        let now = Instant::now();
        let t = ctl.on_query_changed("Sa", now).expect("issued");
        ctl.on_query_changed("S", now);
        assert!(!ctl.on_response(t.seq, Ok(vec![patient("P002", "Sarah Johnson")])));
        assert!(ctl.results().is_empty());
    }

    #[test]
    fn test_failure_degrades_to_empty() {
        let mut ctl = SearchController::default();
        let now = Instant::now();
        let t = ctl.on_query_changed("Jo", now).expect("issued");
        ctl.on_response(t.seq, Ok(vec![patient("P001", "John Smith")]));

        let t = ctl.on_query_changed("Joh", now).expect("issued");
        assert!(ctl.on_response(t.seq, Err(ApiError::Transport("refused".into()))));
        assert!(ctl.results().is_empty());
        assert!(!ctl.is_loading());

        // Typing continues to work.
        assert!(ctl.on_query_changed("John", now).is_some());
    }

    #[test]
    fn test_debounce_issues_latest_query_once() {
        let mut ctl = SearchController::new(Duration::from_millis(250));
        let t0 = Instant::now();
        assert!(ctl.on_query_changed("Jo", t0).is_none());
        assert!(ctl.on_query_changed("Joh", t0 + Duration::from_millis(100)).is_none());

        assert!(ctl.poll(t0 + Duration::from_millis(300)).is_none());
        let t = ctl
            .poll(t0 + Duration::from_millis(350))
            .expect("due after window");
        assert_eq!(t.query, "Joh");
        assert!(ctl.poll(t0 + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_debounce_window_counts_as_loading() {
        let mut ctl = SearchController::new(Duration::from_millis(250));
        let t0 = Instant::now();
        assert!(ctl.on_query_changed("Jo", t0).is_none());
        assert!(ctl.is_loading());
        assert!(ctl.results().is_empty());

        let t = ctl
            .poll(t0 + Duration::from_millis(250))
            .expect("due after window");
        assert!(ctl.is_loading());
        assert!(ctl.on_response(t.seq, Ok(vec![])));
        assert!(!ctl.is_loading());

        // Dropping below the minimum cancels the pending query.
        ctl.on_query_changed("Joh", t0 + Duration::from_secs(1));
        assert!(ctl.is_loading());
        ctl.on_query_changed("J", t0 + Duration::from_secs(1));
        assert!(!ctl.is_loading());
    }
}
