//! Background API worker for non-blocking requests.
//!
//! Requests run as tasks on a tokio runtime so the TUI loop never waits on
//! the network. Every outcome comes back as a [`WorkerEvent`] carrying the
//! sequence token of the ticket that started it; the controllers decide
//! whether the outcome is still current.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::application::{DetailTicket, SearchTicket, SubmissionTicket};
use crate::domain::{AnalysisResult, PatientRecord, PatientSummary};
use crate::ports::{ApiError, HealthStatus, ImagingApi};

/// Completed request reported by the worker.
#[derive(Debug)]
pub enum WorkerEvent {
    Analysis {
        seq: u64,
        outcome: Result<AnalysisResult, ApiError>,
    },
    Search {
        seq: u64,
        outcome: Result<Vec<PatientSummary>, ApiError>,
    },
    PatientDetail {
        seq: u64,
        outcome: Result<PatientRecord, ApiError>,
    },
    Health(Result<HealthStatus, ApiError>),
}

/// Runs `ImagingApi` calls in the background and queues their outcomes.
pub struct ApiWorker<A> {
    api: Arc<A>,
    runtime: Handle,
    timeout: Duration,
    tx: UnboundedSender<WorkerEvent>,
    rx: UnboundedReceiver<WorkerEvent>,
}

async fn with_timeout<T>(
    timeout: Duration,
    request: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    match tokio::time::timeout(timeout, request).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ApiError::Timeout(timeout)),
    }
}

impl<A: ImagingApi + 'static> ApiWorker<A> {
    /// Create a worker spawning onto `runtime`. Each request is abandoned
    /// with `ApiError::Timeout` once `timeout` elapses.
    #[must_use]
    pub fn new(api: A, runtime: Handle, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api: Arc::new(api),
            runtime,
            timeout,
            tx,
            rx,
        }
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn submit_analysis(&self, ticket: SubmissionTicket) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let timeout = self.timeout;
        self.runtime.spawn(async move {
            let outcome = with_timeout(timeout, api.analyze_image(&ticket.candidate)).await;
            // The receiver only goes away on shutdown.
            let _ = tx.send(WorkerEvent::Analysis {
                seq: ticket.seq,
                outcome,
            });
        });
    }

    pub fn search(&self, ticket: SearchTicket) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let timeout = self.timeout;
        self.runtime.spawn(async move {
            let outcome = with_timeout(timeout, api.search_patients(&ticket.query)).await;
            let _ = tx.send(WorkerEvent::Search {
                seq: ticket.seq,
                outcome,
            });
        });
    }

    pub fn load_patient(&self, ticket: DetailTicket) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let timeout = self.timeout;
        self.runtime.spawn(async move {
            let outcome = with_timeout(timeout, api.fetch_patient(&ticket.patient_id)).await;
            let _ = tx.send(WorkerEvent::PatientDetail {
                seq: ticket.seq,
                outcome,
            });
        });
    }

    pub fn check_health(&self) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let timeout = self.timeout;
        self.runtime.spawn(async move {
            let outcome = with_timeout(timeout, api.health()).await;
            let _ = tx.send(WorkerEvent::Health(outcome));
        });
    }

    /// Next queued event, if any (non-blocking).
    pub fn try_recv(&mut self) -> Option<WorkerEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next event.
    pub async fn recv(&mut self) -> Option<WorkerEvent> {
        self.rx.recv().await
    }
}
