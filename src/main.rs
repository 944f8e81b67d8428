//! Medlens: terminal client for medical image analysis.
//!
//! Main entry point for the terminal application.

use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use medlens::adapters::sanitize::SanitizingMakeWriter;
use medlens::tui::App;
use medlens::ClientConfig;

fn main() -> Result<()> {
    // Initialize logging.
    //
    // Writing logs to the terminal corrupts the TUI (alternate screen), so an
    // interactive session logs to a file unless told otherwise.
    let log_mode = std::env::var("MEDLENS_LOG_MODE").unwrap_or_else(|_| "auto".to_string());

    let interactive = std::io::stdout().is_terminal();
    let use_file = match log_mode.as_str() {
        "file" => true,
        "stdout" => false,
        // auto
        _ => interactive,
    };

    let (writer, _guard) = if use_file {
        let log_file =
            std::env::var("MEDLENS_LOG_FILE").unwrap_or_else(|_| "medlens.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            if !parent.as_os_str().is_empty() {
                // Best-effort: a missing directory surfaces as an open error below.
                let _ = std::fs::create_dir_all(parent);
            }
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(!use_file)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    let config = ClientConfig::from_env()?;
    tracing::info!(
        api_base = %config.api_base,
        timeout_secs = config.request_timeout.as_secs(),
        "Starting Medlens..."
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("medlens-io")
        .build()?;

    // Run the TUI application
    let mut app = App::new(&config, runtime.handle().clone())?;
    app.run()?;

    // Abandon requests still in flight.
    runtime.shutdown_timeout(std::time::Duration::from_secs(1));

    tracing::info!("Medlens shutdown complete.");
    Ok(())
}
