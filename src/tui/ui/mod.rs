//! UI module: View components for the TUI.

pub mod dashboard;
pub mod form;
pub mod result;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::MedicalTheme;

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            "DISCLAIMER: Predictions are statistical estimates and do not replace professional medical evaluation.",
            MedicalTheme::text_muted(),
        )),
        Line::from(Span::styled(
            "The model was trained on historical records and may not reflect current treatment outcomes.",
            MedicalTheme::text_muted(),
        )),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}

/// One-line banner for transient notifications.
pub fn render_notification(f: &mut Frame, area: Rect, message: &str) {
    let p = Paragraph::new(Line::from(Span::styled(
        format!(" {message} "),
        MedicalTheme::notification(),
    )))
    .alignment(ratatui::layout::Alignment::Center);
    f.render_widget(p, area);
}
