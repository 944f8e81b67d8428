//! Upload controller: Owns one image submission at a time.
//!
//! Lifecycle:
//! `Idle → Ready → Submitting → Succeeded | Failed`
//!
//! Validation happens synchronously inside [`UploadController::select_file`],
//! so there is no observable `Validating` state. The network call itself is
//! performed elsewhere: [`UploadController::begin_submit`] hands out a
//! [`SubmissionTicket`] and the outcome is fed back through
//! [`UploadController::complete`]. Outcomes whose ticket is no longer current
//! are dropped.

use std::time::{Duration, Instant};

use crate::domain::{AnalysisResult, Preview, UploadCandidate, ValidationError};
use crate::ports::{ApiError, ANALYSIS_FALLBACK_MESSAGE};

use super::sequence::RequestSequence;

/// Highest progress fraction shown while a request is in flight.
pub const IN_FLIGHT_PROGRESS_CAP: f64 = 0.90;

/// Default pause between reaching 100% and exposing the result.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Time constant of the simulated progress curve.
const PROGRESS_TAU_SECS: f64 = 2.5;

pub const NO_FILE_MESSAGE: &str = "Please select a file first";

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    /// No candidate selected
    Idle,
    /// A validated candidate is waiting to be submitted
    Ready,
    /// A request is in flight
    Submitting,
    /// The last submission produced a result
    Succeeded,
    /// The last submission failed; the candidate is kept for a retry
    Failed,
}

/// Everything the network layer needs to perform one submission.
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    pub seq: u64,
    pub candidate: UploadCandidate,
}

/// Why `begin_submit` refused to start a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejected {
    #[error("Please select a file first")]
    NoCandidate,

    #[error("A submission is already in progress")]
    AlreadySubmitting,

    #[error("Nothing to submit in the current state")]
    NotReady,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    seq: u64,
    started_at: Instant,
}

/// State machine for the upload/analysis/result lifecycle.
#[derive(Debug)]
pub struct UploadController {
    state: UploadState,
    candidate: Option<UploadCandidate>,
    preview: Option<Preview>,
    error: Option<String>,

    /// Latest successful result; superseded only by the next success
    result: Option<AnalysisResult>,

    /// Progress fraction (0.0 to 1.0)
    progress: f64,

    sequence: RequestSequence,
    in_flight: Option<InFlight>,
    settle_until: Option<Instant>,
    settle_delay: Duration,
}

impl Default for UploadController {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_DELAY)
    }
}

impl UploadController {
    #[must_use]
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            state: UploadState::Idle,
            candidate: None,
            preview: None,
            error: None,
            result: None,
            progress: 0.0,
            sequence: RequestSequence::new(),
            in_flight: None,
            settle_until: None,
            settle_delay,
        }
    }

    #[must_use]
    pub fn state(&self) -> UploadState {
        self.state
    }

    #[must_use]
    pub fn candidate(&self) -> Option<&UploadCandidate> {
        self.candidate.as_ref()
    }

    #[must_use]
    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Progress fraction in `[0.0, 1.0]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    #[must_use]
    pub fn progress_percent(&self) -> u16 {
        (self.progress * 100.0).round() as u16
    }

    /// Whether the analyze action is currently available.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.candidate.is_some() && matches!(self.state, UploadState::Ready | UploadState::Failed)
    }

    /// True while a request is in flight or a fresh result is settling.
    #[must_use]
    pub fn is_busy(&self, now: Instant) -> bool {
        self.state == UploadState::Submitting || self.is_settling(now)
    }

    fn is_settling(&self, now: Instant) -> bool {
        self.settle_until.is_some_and(|until| now < until)
    }

    /// The result to display, hidden until the settle delay has elapsed.
    #[must_use]
    pub fn result(&self, now: Instant) -> Option<&AnalysisResult> {
        if self.is_settling(now) {
            return None;
        }
        self.result.as_ref()
    }

    /// Select a new file.
    ///
    /// On success the controller moves to `Ready` holding the candidate and a
    /// fresh preview; any in-flight submission is orphaned. On failure the
    /// state is left as it was and the error message is recorded.
    ///
    /// # Errors
    /// Returns the validation failure.
    pub fn select_file(&mut self, candidate: UploadCandidate) -> Result<(), ValidationError> {
        if let Err(e) = candidate.validate() {
            tracing::info!(
                mime = %candidate.mime_type,
                size = candidate.size_bytes,
                "Rejected file selection: {}",
                e
            );
            self.error = Some(e.to_string());
            return Err(e);
        }

        if self.in_flight.take().is_some() {
            tracing::debug!("New file selected while submitting; in-flight result will be ignored");
        }
        self.sequence.invalidate();

        self.preview = Some(Preview::for_candidate(&candidate));
        self.candidate = Some(candidate);
        self.error = None;
        self.progress = 0.0;
        self.settle_until = None;
        self.state = UploadState::Ready;
        Ok(())
    }

    /// Record a selection failure that happened before a candidate could be
    /// built (e.g. the file could not be read). State is unchanged.
    pub fn reject_selection(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Start a submission.
    ///
    /// Legal from `Ready`, and from `Failed` as a retry. Clears any previous
    /// error and resets progress.
    ///
    /// # Errors
    /// `AlreadySubmitting` while a request is in flight (no-op),
    /// `NoCandidate` when nothing is selected (an error message is recorded),
    /// `NotReady` otherwise.
    pub fn begin_submit(&mut self, now: Instant) -> Result<SubmissionTicket, SubmitRejected> {
        if self.state == UploadState::Submitting {
            return Err(SubmitRejected::AlreadySubmitting);
        }
        let Some(candidate) = self.candidate.clone() else {
            self.error = Some(NO_FILE_MESSAGE.to_string());
            return Err(SubmitRejected::NoCandidate);
        };
        if !matches!(self.state, UploadState::Ready | UploadState::Failed) {
            return Err(SubmitRejected::NotReady);
        }

        let seq = self.sequence.issue();
        self.in_flight = Some(InFlight {
            seq,
            started_at: now,
        });
        self.state = UploadState::Submitting;
        self.error = None;
        self.progress = 0.0;
        self.settle_until = None;

        tracing::info!(
            seq,
            size = candidate.size_bytes,
            mime = %candidate.mime_type,
            "Submitting image for analysis"
        );

        Ok(SubmissionTicket { seq, candidate })
    }

    /// Apply the outcome of a submission.
    ///
    /// Returns `false` when the ticket is stale and the outcome was dropped.
    pub fn complete(
        &mut self,
        seq: u64,
        outcome: Result<AnalysisResult, ApiError>,
        now: Instant,
    ) -> bool {
        let current = self
            .in_flight
            .is_some_and(|f| f.seq == seq && self.sequence.is_current(seq));
        if !current {
            tracing::debug!(seq, "Dropping stale analysis response");
            return false;
        }
        self.in_flight = None;

        match outcome {
            Ok(result) => {
                tracing::info!(
                    seq,
                    severity = %result.classification().tier,
                    confidence = result.confidence,
                    "Analysis complete"
                );
                self.progress = 1.0;
                self.result = Some(result);
                self.settle_until = Some(now + self.settle_delay);
                self.candidate = None;
                self.preview = None;
                self.state = UploadState::Succeeded;
            }
            Err(e) => {
                tracing::warn!(seq, "Analysis failed: {}", e);
                self.progress = 0.0;
                self.error = Some(e.user_message(ANALYSIS_FALLBACK_MESSAGE));
                self.state = UploadState::Failed;
            }
        }
        true
    }

    /// Advance time-driven state: the simulated progress curve while in
    /// flight, and the post-success reset once the settle delay has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(in_flight) = self.in_flight {
            let elapsed = now.saturating_duration_since(in_flight.started_at).as_secs_f64();
            let k = 1.0 - (-elapsed / PROGRESS_TAU_SECS).exp();
            let desired = (IN_FLIGHT_PROGRESS_CAP * k).clamp(0.0, IN_FLIGHT_PROGRESS_CAP);
            self.progress = desired.max(self.progress).min(IN_FLIGHT_PROGRESS_CAP);
            return;
        }

        if let Some(until) = self.settle_until {
            if now >= until {
                self.settle_until = None;
                self.progress = 0.0;
            }
        }
    }

    /// Discard the candidate, preview, error and progress, and orphan any
    /// in-flight request. The last successful result stays available.
    pub fn clear(&mut self) {
        if self.in_flight.take().is_some() {
            tracing::debug!("Cleared while submitting; in-flight result will be ignored");
        }
        self.sequence.invalidate();
        self.candidate = None;
        self.preview = None;
        self.error = None;
        self.progress = 0.0;
        self.settle_until = None;
        self.state = UploadState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeverityTier;

    fn jpeg(size: usize) -> UploadCandidate {
        UploadCandidate::new("brain_mri.jpg", "image/jpeg", vec![0u8; size])
    }

    fn analysis(diagnosis: &str, severity: &str, confidence: f64) -> AnalysisResult {
        AnalysisResult {
            diagnosis: diagnosis.to_string(),
            description: String::new(),
            confidence,
            severity: Some(severity.to_string()),
            scan_type: "MRI".to_string(),
            analysis_time: "2.1s".to_string(),
            recommendations: vec!["Consult oncologist".to_string()],
            received_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_select_valid_file() {
        let mut ctl = UploadController::default();
        assert_eq!(ctl.state(), UploadState::Idle);

        ctl.select_file(jpeg(1024)).expect("valid");
        assert_eq!(ctl.state(), UploadState::Ready);
        assert!(ctl.preview().is_some());
        assert!(ctl.error().is_none());
        assert!(ctl.can_submit());
    }

    #[test]
    fn test_invalid_file_keeps_previous_state() {
        let mut ctl = UploadController::default();
        let err = ctl
            .select_file(UploadCandidate::new("report.pdf", "application/pdf", vec![1]))
            .unwrap_err();
        assert_eq!(err, ValidationError::NotAnImage);
        assert_eq!(ctl.state(), UploadState::Idle);
        assert_eq!(ctl.error(), Some("Please select a valid image file"));
        assert!(!ctl.can_submit());

        ctl.select_file(jpeg(10)).expect("valid");
        let err = ctl
            .select_file(jpeg(crate::domain::MAX_UPLOAD_BYTES as usize + 1))
            .unwrap_err();
        assert_eq!(err, ValidationError::TooLarge);
        assert_eq!(ctl.state(), UploadState::Ready);
        assert_eq!(ctl.candidate().map(|c| c.size_bytes), Some(10));
        assert_eq!(ctl.error(), Some("File size must be less than 10MB"));
    }

    #[test]
    fn test_submit_requires_candidate() {
        let mut ctl = UploadController::default();
        let err = ctl.begin_submit(Instant::now()).unwrap_err();
        assert_eq!(err, SubmitRejected::NoCandidate);
        assert_eq!(ctl.error(), Some("Please select a file first"));
        assert_eq!(ctl.state(), UploadState::Idle);
    }

    #[test]
    fn test_rejected_file_never_submits() {
        let mut ctl = UploadController::default();
        let _ = ctl.select_file(UploadCandidate::new("a.txt", "text/plain", vec![1]));
        assert!(ctl.begin_submit(Instant::now()).is_err());
        assert_ne!(ctl.state(), UploadState::Submitting);
    }

    #[test]
    fn test_single_submission_in_flight() {
        let mut ctl = UploadController::default();
        ctl.select_file(jpeg(10)).expect("valid");
        let now = Instant::now();
        ctl.begin_submit(now).expect("first submit");
        assert_eq!(
            ctl.begin_submit(now).unwrap_err(),
            SubmitRejected::AlreadySubmitting
        );
        assert_eq!(ctl.state(), UploadState::Submitting);
    }

    #[test]
    fn test_success_snaps_progress_and_settles() {
        let mut ctl = UploadController::new(Duration::from_millis(500));
        ctl.select_file(jpeg(5 * 1024 * 1024)).expect("valid");
        let t0 = Instant::now();
        let ticket = ctl.begin_submit(t0).expect("submit");

        let t1 = t0 + Duration::from_secs(1);
        assert!(ctl.complete(ticket.seq, Ok(analysis("Glioma", "High", 92.0)), t1));
        assert_eq!(ctl.state(), UploadState::Succeeded);
        assert_eq!(ctl.progress_percent(), 100);

        // Result is hidden during the settle window.
        assert!(ctl.result(t1).is_none());
        assert!(ctl.is_busy(t1));

        let t2 = t1 + Duration::from_millis(500);
        let result = ctl.result(t2).expect("visible after settle");
        let class = result.classification();
        assert_eq!(class.tier, SeverityTier::High);
        assert_eq!(class.sort_rank, 0);
        assert_eq!(result.confidence_band().label(), "extremely high");

        ctl.tick(t2);
        assert_eq!(ctl.progress_percent(), 0);
        assert!(!ctl.is_busy(t2));
    }

    #[test]
    fn test_failure_uses_server_detail() {
        let mut ctl = UploadController::default();
        ctl.select_file(jpeg(10)).expect("valid");
        let now = Instant::now();
        let ticket = ctl.begin_submit(now).expect("submit");
        ctl.tick(now + Duration::from_secs(3));
        assert!(ctl.progress() > 0.0);

        let err = ApiError::Server {
            status: 500,
            detail: Some("Analysis failed: model offline".to_string()),
        };
        assert!(ctl.complete(ticket.seq, Err(err), now));
        assert_eq!(ctl.state(), UploadState::Failed);
        assert_eq!(ctl.progress(), 0.0);
        assert_eq!(ctl.error(), Some("Analysis failed: model offline"));
    }

    #[test]
    fn test_failure_without_detail_uses_fallback() {
        let mut ctl = UploadController::default();
        ctl.select_file(jpeg(10)).expect("valid");
        let now = Instant::now();
        let ticket = ctl.begin_submit(now).expect("submit");
        ctl.complete(ticket.seq, Err(ApiError::Transport("refused".into())), now);
        assert_eq!(ctl.error(), Some("Analysis failed. Please try again."));
    }

    #[test]
    fn test_retry_after_failure() {
        let mut ctl = UploadController::default();
        ctl.select_file(jpeg(10)).expect("valid");
        let now = Instant::now();
        let first = ctl.begin_submit(now).expect("submit");
        ctl.complete(first.seq, Err(ApiError::Timeout(Duration::from_secs(30))), now);
        assert!(ctl.can_submit());

        let retry = ctl.begin_submit(now).expect("retry");
        assert!(retry.seq > first.seq);
        assert!(ctl.error().is_none());
    }

    #[test]
    fn test_progress_is_monotonic_and_capped() {
        let mut ctl = UploadController::default();
        ctl.select_file(jpeg(10)).expect("valid");
        let t0 = Instant::now();
        ctl.begin_submit(t0).expect("submit");

        let mut last = 0.0;
        for secs in [0u64, 1, 2, 5, 10, 60, 600, 3600] {
            ctl.tick(t0 + Duration::from_secs(secs));
            let p = ctl.progress();
            assert!(p >= last, "progress went backwards at {secs}s");
            assert!(p <= IN_FLIGHT_PROGRESS_CAP);
            last = p;
        }
        assert!(ctl.progress_percent() <= 90);
        assert!(ctl.progress_percent() >= 89);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut ctl = UploadController::default();
        ctl.select_file(jpeg(10)).expect("valid");
        ctl.clear();
        assert_eq!(ctl.state(), UploadState::Idle);
        assert!(ctl.candidate().is_none());
        assert!(ctl.preview().is_none());
        assert!(ctl.error().is_none());

        ctl.clear();
        assert_eq!(ctl.state(), UploadState::Idle);
        assert_eq!(ctl.progress(), 0.0);
    }

    #[test]
    fn test_clear_while_submitting_drops_late_response() {
        let mut ctl = UploadController::default();
        ctl.select_file(jpeg(10)).expect("valid");
        let now = Instant::now();
        let ticket = ctl.begin_submit(now).expect("submit");
        ctl.clear();

        assert!(!ctl.complete(ticket.seq, Ok(analysis("Glioma", "High", 91.0)), now));
        assert_eq!(ctl.state(), UploadState::Idle);
        assert!(ctl.result(now + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_last_submission_wins() {
        let mut ctl = UploadController::new(Duration::ZERO);
        let now = Instant::now();

        ctl.select_file(UploadCandidate::new("a.jpg", "image/jpeg", vec![1])).expect("valid");
        let a = ctl.begin_submit(now).expect("submit A");

        ctl.select_file(UploadCandidate::new("b.jpg", "image/jpeg", vec![2])).expect("valid");
        let b = ctl.begin_submit(now).expect("submit B");

        // B resolves first, then A arrives late.
        assert!(ctl.complete(b.seq, Ok(analysis("Meningioma", "Medium", 88.0)), now));
        assert!(!ctl.complete(a.seq, Ok(analysis("Glioma", "High", 91.0)), now));

        let shown = ctl.result(now).expect("result");
        assert_eq!(shown.diagnosis, "Meningioma");
    }

    #[test]
    fn test_result_survives_clear_and_new_selection() {
        let mut ctl = UploadController::new(Duration::ZERO);
        let now = Instant::now();
        ctl.select_file(jpeg(10)).expect("valid");
        let t = ctl.begin_submit(now).expect("submit");
        ctl.complete(t.seq, Ok(analysis("Normal Study", "None", 96.0)), now);

        ctl.select_file(jpeg(20)).expect("valid");
        assert_eq!(ctl.state(), UploadState::Ready);
        assert_eq!(ctl.result(now).map(|r| r.diagnosis.as_str()), Some("Normal Study"));

        ctl.clear();
        assert!(ctl.result(now).is_some());
    }
}
