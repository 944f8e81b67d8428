//! TUI module: Terminal User Interface using Ratatui.
//!
//! Two screens:
//! - Image analysis (file selection, submission, severity-tiered result)
//! - Patient search and record lookup

mod app;
mod styles;
mod ui;
mod worker;

pub use app::{App, Screen};
pub use styles::MedicalTheme;
pub use worker::{ApiWorker, WorkerEvent};
