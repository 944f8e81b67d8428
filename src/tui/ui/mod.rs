//! UI module: View components for the TUI.
//!
//! Every function here is a projection of controller state; none of them
//! mutate anything.

pub mod analysis;
pub mod patients;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::tui::styles::MedicalTheme;

/// Service reachability as last reported by `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Connection {
    #[default]
    Unknown,
    Online(String),
    Offline(String),
}

pub fn render_header(f: &mut Frame, area: Rect, selected_tab: usize, connection: &Connection) {
    let status = match connection {
        Connection::Unknown => Span::styled("● checking", MedicalTheme::text_muted()),
        Connection::Online(status) => Span::styled(format!("● {status}"), MedicalTheme::success()),
        Connection::Offline(reason) => {
            Span::styled(format!("● offline ({reason})"), MedicalTheme::danger())
        }
    };

    let tabs = Tabs::new(vec![
        Line::from(" Image Analysis "),
        Line::from(" Patients "),
    ])
    .select(selected_tab)
    .style(MedicalTheme::text_secondary())
    .highlight_style(MedicalTheme::selected())
    .block(
        Block::default()
            .title(Line::from(vec![
                Span::styled(" Medlens ", MedicalTheme::title()),
                status,
                Span::raw(" "),
            ]))
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(tabs, area);
}

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![Line::from(vec![Span::styled(
        "DISCLAIMER: AI analysis is for research and educational purposes only. Always consult qualified medical professionals for diagnosis and treatment.",
        MedicalTheme::text_muted(),
    )])];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}

/// Key hints as alternating key and description spans.
pub(crate) fn key_hints(hints: &[(&'static str, &'static str)]) -> Line<'static> {
    let spans = hints
        .iter()
        .flat_map(|&(key, desc)| {
            [
                Span::styled(format!("[{key}] "), MedicalTheme::key_hint()),
                Span::styled(format!("{desc}  "), MedicalTheme::key_desc()),
            ]
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}
