//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Dispatching requests to the background worker and routing the
//!   outcomes back into the controllers

use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::runtime::Handle;

use crate::adapters::HttpImagingApi;
use crate::application::{
    PatientDetailLoader, SearchController, SubmitRejected, UploadController, NO_FILE_MESSAGE,
};
use crate::config::ClientConfig;
use crate::domain::{PatientRecord, UploadCandidate};
use crate::ports::ImagingApi;
use crate::MedlensError;

use super::ui::{
    analysis::{render_analysis, AnalysisView},
    patients::{render_patients, PatientsView},
    render_disclaimer, render_header, Connection,
};
use super::worker::{ApiWorker, WorkerEvent};

/// How often the connection indicator is refreshed.
const HEALTH_INTERVAL: Duration = Duration::from_secs(30);

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Analysis,
    Patients,
}

impl Screen {
    fn tab_index(self) -> usize {
        match self {
            Self::Analysis => 0,
            Self::Patients => 1,
        }
    }
}

/// Main application state
pub struct App<A = HttpImagingApi> {
    screen: Screen,
    should_quit: bool,
    worker: ApiWorker<A>,

    upload: UploadController,
    path_input: String,

    search: SearchController,
    highlighted: Option<usize>,
    detail: PatientDetailLoader,
    /// Resolved scan image locations of the selected record.
    image_urls: Vec<String>,

    connection: Connection,
    last_health_check: Option<Instant>,
}

impl App<HttpImagingApi> {
    /// Create an application talking to the configured imaging service.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, runtime: Handle) -> Result<Self> {
        let api = HttpImagingApi::new(&config.api_base, config.request_timeout)?;
        Ok(Self::with_dependencies(api, config, runtime))
    }
}

impl<A: ImagingApi + 'static> App<A> {
    /// Create application with an injected API (Composition Root pattern).
    #[must_use]
    pub fn with_dependencies(api: A, config: &ClientConfig, runtime: Handle) -> Self {
        Self {
            screen: Screen::Analysis,
            should_quit: false,
            worker: ApiWorker::new(api, runtime, config.request_timeout),
            upload: UploadController::new(config.settle_delay),
            path_input: String::new(),
            search: SearchController::new(config.search_debounce),
            highlighted: None,
            detail: PatientDetailLoader::new(),
            image_urls: Vec::new(),
            connection: Connection::Unknown,
            last_health_check: None,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            let now = Instant::now();
            self.update(now);

            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(2),
                        Constraint::Min(0),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                render_header(f, chunks[0], self.screen.tab_index(), &self.connection);

                match self.screen {
                    Screen::Analysis => render_analysis(
                        f,
                        chunks[1],
                        &AnalysisView {
                            path_input: &self.path_input,
                            upload: &self.upload,
                            now,
                        },
                    ),
                    Screen::Patients => render_patients(
                        f,
                        chunks[1],
                        &PatientsView {
                            search: &self.search,
                            highlighted: self.highlighted,
                            detail: &self.detail,
                            image_urls: &self.image_urls,
                        },
                    ),
                }

                render_disclaimer(f, chunks[2]);
            })?;

            // Short poll keeps progress animation and debounce responsive.
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Release {
                        self.handle_key(key.code, key.modifiers, Instant::now());
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Apply finished requests and time-driven state.
    fn update(&mut self, now: Instant) {
        while let Some(event) = self.worker.try_recv() {
            self.apply_event(event, now);
        }

        self.upload.tick(now);

        if let Some(ticket) = self.search.poll(now) {
            self.worker.search(ticket);
        }

        let health_due = self
            .last_health_check
            .map_or(true, |at| now.saturating_duration_since(at) >= HEALTH_INTERVAL);
        if health_due {
            self.last_health_check = Some(now);
            self.worker.check_health();
        }
    }

    fn apply_event(&mut self, event: WorkerEvent, now: Instant) {
        match event {
            WorkerEvent::Analysis { seq, outcome } => {
                self.upload.complete(seq, outcome, now);
            }
            WorkerEvent::Search { seq, outcome } => {
                if self.search.on_response(seq, outcome) {
                    self.highlighted = (!self.search.results().is_empty()).then_some(0);
                }
            }
            WorkerEvent::PatientDetail { seq, outcome } => {
                if let Ok(true) = self.detail.on_response(seq, outcome) {
                    self.image_urls = self
                        .detail
                        .selected()
                        .map(|record| self.resolve_images(record))
                        .unwrap_or_default();
                }
            }
            WorkerEvent::Health(outcome) => {
                self.connection = match outcome {
                    Ok(health) => Connection::Online(health.status),
                    Err(e) => {
                        tracing::warn!("Health check failed: {}", e);
                        Connection::Offline(e.to_string())
                    }
                };
            }
        }
    }

    fn resolve_images(&self, record: &PatientRecord) -> Vec<String> {
        record
            .scan_images
            .iter()
            .filter_map(|image| match self.worker.api().image_url(image) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("Skipping scan image: {}", e);
                    None
                }
            })
            .collect()
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers, now: Instant) {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);

        // Global keys
        match key {
            KeyCode::Char('q') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.screen = match self.screen {
                    Screen::Analysis => Screen::Patients,
                    Screen::Patients => Screen::Analysis,
                };
                return;
            }
            KeyCode::F(2) => {
                self.last_health_check = Some(now);
                self.worker.check_health();
                return;
            }
            _ => {}
        }

        match self.screen {
            Screen::Analysis => self.handle_analysis_key(key, ctrl, now),
            Screen::Patients => self.handle_patients_key(key, ctrl, now),
        }
    }

    fn handle_analysis_key(&mut self, key: KeyCode, ctrl: bool, now: Instant) {
        match key {
            KeyCode::Char('r') if ctrl => self.submit(now),
            KeyCode::F(5) => self.submit(now),
            KeyCode::Char('l') if ctrl => {
                self.upload.clear();
                self.path_input.clear();
            }
            KeyCode::Enter => self.select_path(),
            KeyCode::Esc => self.path_input.clear(),
            KeyCode::Backspace => {
                self.path_input.pop();
            }
            KeyCode::Char(c) if !ctrl => self.path_input.push(c),
            _ => {}
        }
    }

    fn handle_patients_key(&mut self, key: KeyCode, ctrl: bool, now: Instant) {
        match key {
            KeyCode::Up => {
                self.highlighted = self.highlighted.map(|i| i.saturating_sub(1));
            }
            KeyCode::Down => {
                let last = self.search.results().len().checked_sub(1);
                self.highlighted = match (self.highlighted, last) {
                    (_, None) => None,
                    (None, Some(_)) => Some(0),
                    (Some(i), Some(last)) => Some((i + 1).min(last)),
                };
            }
            KeyCode::Enter => self.open_highlighted(),
            KeyCode::Esc => self.set_query(String::new(), now),
            KeyCode::Backspace => {
                let mut query = self.search.query().to_string();
                query.pop();
                self.set_query(query, now);
            }
            KeyCode::Char(c) if !ctrl => {
                let mut query = self.search.query().to_string();
                query.push(c);
                self.set_query(query, now);
            }
            _ => {}
        }
    }

    fn set_query(&mut self, query: String, now: Instant) {
        if let Some(ticket) = self.search.on_query_changed(query, now) {
            self.worker.search(ticket);
        }
        if self.search.results().is_empty() {
            self.highlighted = None;
        }
    }

    fn open_highlighted(&mut self) {
        let Some(patient_id) = self
            .highlighted
            .and_then(|i| self.search.results().get(i))
            .map(|p| p.patient_id.clone())
        else {
            return;
        };
        let ticket = self.detail.select(patient_id);
        self.worker.load_patient(ticket);
    }

    fn select_path(&mut self) {
        let raw = self.path_input.trim();
        if raw.is_empty() {
            self.upload.reject_selection(NO_FILE_MESSAGE);
            return;
        }

        match UploadCandidate::from_path(Path::new(raw)) {
            Ok(candidate) => {
                // Already validated from metadata; a failure here is recorded by the controller.
                if let Err(e) = self.upload.select_file(candidate) {
                    tracing::debug!("Selection refused after read: {}", e);
                }
            }
            Err(MedlensError::Validation(e)) => self.upload.reject_selection(e.to_string()),
            Err(e) => {
                tracing::info!("Could not open selected file: {}", e);
                self.upload.reject_selection(format!("Could not open file: {e}"));
            }
        }
    }

    fn submit(&mut self, now: Instant) {
        match self.upload.begin_submit(now) {
            Ok(ticket) => self.worker.submit_analysis(ticket),
            Err(SubmitRejected::AlreadySubmitting) => {}
            Err(e) => tracing::debug!("Submit rejected: {}", e),
        }
    }
}
