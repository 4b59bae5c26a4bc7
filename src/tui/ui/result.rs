//! Prediction result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::application::SubmissionOutcome;
use crate::domain::SurvivalLabel;
use crate::tui::styles::MedicalTheme;

/// Result screen state
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    #[default]
    Idle,
    Complete {
        outcome: SubmissionOutcome,
    },
    Error {
        message: String,
    },
}

/// Render the result screen
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_result_header(f, chunks[0]);
    match state {
        ResultState::Idle => render_idle(f, chunks[1]),
        ResultState::Complete { outcome } => render_outcome(f, chunks[1], outcome),
        ResultState::Error { message } => render_error(f, chunks[1], message),
    }
    render_result_footer(f, chunks[2], state);
}

fn render_result_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Prediction", MedicalTheme::title()),
        Span::styled(" │ Survival Outcome", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(Line::from(Span::styled(
        "No submission yet",
        MedicalTheme::text_muted(),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(content, area);
}

fn render_outcome(f: &mut Frame, area: Rect, outcome: &SubmissionOutcome) {
    let block = Block::default()
        .title(Span::styled(" Prediction Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Label
            Constraint::Length(4), // Probability
            Constraint::Length(3), // Persistence
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    let label = outcome.prediction.label;
    let label_style = MedicalTheme::survival_label(label);
    let icon = match label {
        SurvivalLabel::Survived => "OK",
        SurvivalLabel::NotSurvived => "!",
    };

    let verdict = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{icon} {label}"),
            label_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(label.headline(), MedicalTheme::text_secondary())),
    ])
    .alignment(Alignment::Center);
    f.render_widget(verdict, chunks[0]);

    match outcome.prediction.probability {
        Some(p) => {
            let gauge = Gauge::default()
                .block(
                    Block::default()
                        .title(Span::styled(
                            " Predicted probability of survival (class=1) ",
                            MedicalTheme::text_secondary(),
                        ))
                        .borders(Borders::ALL)
                        .border_style(MedicalTheme::border()),
                )
                .gauge_style(MedicalTheme::gauge(p))
                .ratio(p.clamp(0.0, 1.0))
                .label(outcome.prediction.probability_percent().unwrap_or_default());
            f.render_widget(gauge, chunks[1]);
        }
        None => {
            let note = Paragraph::new(Line::from(Span::styled(
                "This model does not report probabilities",
                MedicalTheme::text_muted(),
            )))
            .alignment(Alignment::Center);
            f.render_widget(note, chunks[1]);
        }
    }

    let persistence_style = if outcome.persistence.is_stored() {
        MedicalTheme::success()
    } else {
        MedicalTheme::warning()
    };
    let persistence = Paragraph::new(Line::from(Span::styled(
        outcome.persistence.message(),
        persistence_style,
    )))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(persistence, chunks[2]);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Prediction failed", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect, state: &ResultState) {
    let content = match state {
        ResultState::Error { .. } => Line::from(vec![
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Back to Form ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Dashboard", MedicalTheme::key_desc()),
        ]),
        _ => Line::from(vec![
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Dashboard ", MedicalTheme::key_desc()),
            Span::styled("[N] ", MedicalTheme::key_hint()),
            Span::styled("New Submission", MedicalTheme::key_desc()),
        ]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
