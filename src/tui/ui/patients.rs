//! Patient search and record view.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::application::{PatientDetailLoader, SearchController, MIN_QUERY_CHARS};
use crate::domain::PatientRecord;
use crate::tui::styles::MedicalTheme;

use super::key_hints;

/// Everything the patients screen shows.
pub struct PatientsView<'a> {
    pub search: &'a SearchController,
    pub highlighted: Option<usize>,
    pub detail: &'a PatientDetailLoader,
    /// Scan image locations of the selected record, already resolved.
    pub image_urls: &'a [String],
}

/// Render the patients screen
pub fn render_patients(f: &mut Frame, area: Rect, view: &PatientsView<'_>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search input
            Constraint::Min(0),    // List + detail
            Constraint::Length(2), // Footer
        ])
        .split(area);

    render_search_input(f, rows[0], view.search);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    render_results(f, columns[0], view);
    render_detail(f, columns[1], view);

    let footer = Paragraph::new(key_hints(&[
        ("↑/↓", "Move"),
        ("Enter", "Open record"),
        ("Tab", "Image Analysis"),
        ("Ctrl+Q", "Quit"),
    ]))
    .block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(footer, rows[2]);
}

fn render_search_input(f: &mut Frame, area: Rect, search: &SearchController) {
    let mut spans = vec![
        Span::styled(search.query().to_string(), MedicalTheme::text()),
        Span::styled("▏", MedicalTheme::focused()),
    ];
    if search.is_loading() {
        spans.push(Span::styled("  searching...", MedicalTheme::text_muted()));
    }

    let input = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title(Span::styled(
                " Search patients by name or ID ",
                MedicalTheme::subtitle(),
            ))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border_focused()),
    );
    f.render_widget(input, area);
}

fn render_results(f: &mut Frame, area: Rect, view: &PatientsView<'_>) {
    let block = Block::default()
        .title(Span::styled(" Results ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let results = view.search.results();
    if results.is_empty() {
        let hint = if view.search.query().chars().count() < MIN_QUERY_CHARS {
            "Type at least two characters to search"
        } else if view.search.is_loading() {
            "Searching..."
        } else {
            "No patients found"
        };
        let p = Paragraph::new(Span::styled(hint, MedicalTheme::text_muted())).block(block);
        f.render_widget(p, area);
        return;
    }

    let items: Vec<ListItem> = results
        .iter()
        .map(|p| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(p.name.clone(), MedicalTheme::text()),
                    Span::styled(format!("  {}", p.patient_id), MedicalTheme::text_muted()),
                ]),
                Line::from(Span::styled(
                    format!("{} · {} · {}", p.age, p.gender, p.diagnosis),
                    MedicalTheme::text_secondary(),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(MedicalTheme::selected())
        .highlight_symbol("› ");

    let mut state = ListState::default().with_selected(view.highlighted);
    f.render_stateful_widget(list, area, &mut state);
}

fn render_detail(f: &mut Frame, area: Rect, view: &PatientsView<'_>) {
    let block = Block::default()
        .title(Span::styled(" Patient Record ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let mut lines = Vec::new();
    if let Some(id) = view.detail.pending_id() {
        lines.push(Line::from(Span::styled(
            format!("Loading {id}..."),
            MedicalTheme::text_muted(),
        )));
    }
    if let Some(err) = view.detail.last_error() {
        lines.push(Line::from(Span::styled(format!("! {err}"), MedicalTheme::danger())));
    }

    match view.detail.selected() {
        Some(record) => lines.extend(record_lines(record, view.image_urls)),
        None if lines.is_empty() => lines.push(Line::from(Span::styled(
            "Select a patient to view their record",
            MedicalTheme::text_muted(),
        ))),
        None => {}
    }

    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn record_lines(record: &PatientRecord, image_urls: &[String]) -> Vec<Line<'static>> {
    let s = &record.summary;
    let mut lines = vec![
        Line::from(Span::styled(s.name.clone(), MedicalTheme::title())),
        Line::from(vec![
            Span::styled("ID: ", MedicalTheme::text_secondary()),
            Span::styled(s.patient_id.clone(), MedicalTheme::text()),
            Span::styled("   Age: ", MedicalTheme::text_secondary()),
            Span::styled(s.age.to_string(), MedicalTheme::text()),
            Span::styled("   Gender: ", MedicalTheme::text_secondary()),
            Span::styled(s.gender.clone(), MedicalTheme::text()),
        ]),
        Line::from(vec![
            Span::styled("Diagnosis: ", MedicalTheme::text_secondary()),
            Span::styled(s.diagnosis.clone(), MedicalTheme::focused()),
            Span::styled("   Scan type: ", MedicalTheme::text_secondary()),
            Span::styled(record.scan_type_label().to_string(), MedicalTheme::text()),
        ]),
        Line::from(""),
        Line::from(Span::styled("Medical History", MedicalTheme::subtitle())),
        Line::from(Span::styled(
            record.medical_history_text().to_string(),
            MedicalTheme::text(),
        )),
    ];

    if let Some(summary) = record.medical_summary.as_deref() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("AI Summary", MedicalTheme::subtitle())));
        lines.push(Line::from(Span::styled(summary.to_string(), MedicalTheme::text())));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Scan Images", MedicalTheme::subtitle())));
    if image_urls.is_empty() {
        lines.push(Line::from(Span::styled(
            "No scan images available for this patient",
            MedicalTheme::text_muted(),
        )));
    } else {
        lines.extend(
            image_urls
                .iter()
                .map(|url| Line::from(Span::styled(format!("  {url}"), MedicalTheme::info()))),
        );
    }

    lines
}
