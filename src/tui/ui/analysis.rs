//! Image analysis view: file selection, submission progress and result.

use std::time::Instant;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::application::{UploadController, UploadState};
use crate::domain::AnalysisResult;
use crate::tui::styles::MedicalTheme;

use super::key_hints;

/// Everything the analysis screen shows.
pub struct AnalysisView<'a> {
    pub path_input: &'a str,
    pub upload: &'a UploadController,
    pub now: Instant,
}

/// Render the analysis screen
pub fn render_analysis(f: &mut Frame, area: Rect, view: &AnalysisView<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Path input
            Constraint::Length(4), // Selection + error
            Constraint::Length(3), // Progress
            Constraint::Min(0),    // Result
            Constraint::Length(2), // Footer
        ])
        .split(area);

    render_path_input(f, chunks[0], view);
    render_selection(f, chunks[1], view.upload);
    render_progress(f, chunks[2], view.upload);

    match view.upload.result(view.now) {
        Some(result) => render_result(f, chunks[3], result),
        None => render_placeholder(f, chunks[3], view.upload, view.now),
    }

    render_footer(f, chunks[4], view.upload);
}

fn render_path_input(f: &mut Frame, area: Rect, view: &AnalysisView<'_>) {
    let input = Paragraph::new(Line::from(vec![
        Span::styled(view.path_input.to_string(), MedicalTheme::text()),
        Span::styled("▏", MedicalTheme::focused()),
    ]))
    .block(
        Block::default()
            .title(Span::styled(" Image file ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border_focused()),
    );
    f.render_widget(input, area);
}

fn render_selection(f: &mut Frame, area: Rect, upload: &UploadController) {
    let mut lines = match upload.preview() {
        Some(preview) => vec![
            Line::from(vec![
                Span::styled("Selected: ", MedicalTheme::text_secondary()),
                Span::styled(preview.file_name.clone(), MedicalTheme::text()),
                Span::styled(format!("  ({})", preview.size_label), MedicalTheme::text_muted()),
            ]),
            Line::from(Span::styled(preview.reference.clone(), MedicalTheme::text_muted())),
        ],
        None => vec![Line::from(Span::styled(
            "No file selected. Type a path to a JPG or PNG image (max 10MB)",
            MedicalTheme::text_muted(),
        ))],
    };

    if let Some(error) = upload.error() {
        lines.push(Line::from(Span::styled(format!("! {error}"), MedicalTheme::danger())));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

fn render_progress(f: &mut Frame, area: Rect, upload: &UploadController) {
    let progress = upload.progress();
    if progress <= 0.0 {
        return;
    }

    let label = if upload.state() == UploadState::Submitting {
        format!("Analyzing... {}%", upload.progress_percent())
    } else {
        "Complete".to_string()
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::info())
        .percent(upload.progress_percent())
        .label(label);
    f.render_widget(gauge, area);
}

fn render_placeholder(f: &mut Frame, area: Rect, upload: &UploadController, now: Instant) {
    let message = if upload.is_busy(now) {
        "Waiting for analysis result..."
    } else {
        "Upload a medical image to see AI analysis results"
    };

    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text_secondary())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .title(Span::styled(" Analysis Results ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(content, area);
}

fn render_result(f: &mut Frame, area: Rect, result: &AnalysisResult) {
    let classification = result.classification();
    let severity_style = MedicalTheme::severity(classification.tier);

    let block = Block::default()
        .title(Span::styled(" Analysis Results ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(severity_style);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Diagnosis + severity
            Constraint::Length(3), // Confidence gauge
            Constraint::Min(0),    // Details
        ])
        .margin(1)
        .split(inner);

    let headline = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                format!("{} {}", MedicalTheme::icon(classification.icon_key), result.diagnosis),
                severity_style.add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", classification.tier), severity_style),
        ]),
        Line::from(Span::styled(result.description.clone(), MedicalTheme::text_secondary())),
    ])
    .wrap(Wrap { trim: true });
    f.render_widget(headline, chunks[0]);

    let band = result.confidence_band();
    let ratio = if result.confidence.is_finite() {
        (result.confidence / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Confidence ", MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::confidence(result.confidence))
        .ratio(ratio)
        .label(format!("{:.1}% ({})", result.confidence, band.label()));
    f.render_widget(gauge, chunks[1]);

    let mut details = vec![
        Line::from(vec![
            Span::styled("Scan type: ", MedicalTheme::text_secondary()),
            Span::styled(result.scan_type.clone(), MedicalTheme::text()),
            Span::styled("   Analysis time: ", MedicalTheme::text_secondary()),
            Span::styled(result.analysis_time.clone(), MedicalTheme::text()),
        ]),
        Line::from(vec![
            Span::styled("Received: ", MedicalTheme::text_secondary()),
            Span::styled(
                result.received_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                MedicalTheme::text_muted(),
            ),
        ]),
        Line::from(""),
    ];

    if !result.recommendations.is_empty() {
        details.push(Line::from(Span::styled("Recommendations", MedicalTheme::subtitle())));
        details.extend(
            result
                .recommendations
                .iter()
                .map(|r| Line::from(Span::styled(format!("  • {r}"), MedicalTheme::text()))),
        );
    }

    f.render_widget(Paragraph::new(details).wrap(Wrap { trim: false }), chunks[2]);
}

fn render_footer(f: &mut Frame, area: Rect, upload: &UploadController) {
    let line = match upload.state() {
        UploadState::Submitting => Line::from(Span::styled("Analyzing...", MedicalTheme::text_muted())),
        UploadState::Failed => key_hints(&[("Ctrl+R", "Retry"), ("Ctrl+L", "Clear"), ("Tab", "Patients")]),
        _ => key_hints(&[
            ("Enter", "Select file"),
            ("Ctrl+R", "Analyze"),
            ("Ctrl+L", "Clear"),
            ("Tab", "Patients"),
            ("Ctrl+Q", "Quit"),
        ]),
    };

    let footer = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(footer, area);
}
