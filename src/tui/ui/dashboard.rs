//! Dashboard view: Main overview screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::{PersistedRecord, SurvivalLabel};
use crate::ports::ModelInfo;
use crate::tui::styles::MedicalTheme;

/// Outcome counts over the most recent rows. Names are never shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecentSummary {
    pub total: usize,
    pub survived: usize,
    pub not_survived: usize,
    pub negative_delays: usize,
}

impl RecentSummary {
    #[must_use]
    pub fn from_rows(rows: &[PersistedRecord]) -> Self {
        rows.iter().fold(
            Self {
                total: rows.len(),
                ..Self::default()
            },
            |mut acc, row| {
                match row.result {
                    SurvivalLabel::Survived => acc.survived += 1,
                    SurvivalLabel::NotSurvived => acc.not_survived += 1,
                }
                if row.treatment_delay_days < 0 {
                    acc.negative_delays += 1;
                }
                acc
            },
        )
    }
}

/// Dashboard state for rendering.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub model: Option<ModelInfo>,
    pub table: String,
    /// `None` when the sink could not be queried
    pub submission_count: Option<usize>,
    pub recent: RecentSummary,
}

/// Render the main dashboard view.
pub fn render_dashboard(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
        ])
        .split(area);

    render_header(f, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    render_status_panels(f, columns[0], state);
    render_recent_summary(f, columns[1], state.recent);
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Survival Intake", MedicalTheme::title()),
        Span::styled(" │ ", MedicalTheme::text_muted()),
        Span::styled(
            "Lung Cancer Survival Prediction",
            MedicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_status_panels(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(0)])
        .margin(1)
        .split(area);

    let mut status_items = Vec::new();
    match &state.model {
        Some(info) => {
            status_items.push(format_status_item("Model Loaded", true));
            status_items.push(key_value("Kind", info.kind.clone()));
            status_items.push(key_value("Estimators", info.estimators.to_string()));
            status_items.push(key_value("Encoding", info.encoding_version.clone()));
            status_items.push(format_status_item("Signed Manifest", info.signed));
        }
        None => status_items.push(format_status_item("Model Loaded", false)),
    }
    status_items.push(key_value(
        "Stored rows",
        state
            .submission_count
            .map_or_else(|| "unavailable".to_string(), |n| format!("{n} in {}", state.table)),
    ));

    let status = Paragraph::new(status_items).block(
        Block::default()
            .title(Span::styled(" System Status ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(status, chunks[0]);

    let actions = vec![
        Line::from(vec![
            Span::styled("[N] ", MedicalTheme::key_hint()),
            Span::styled("New Submission", MedicalTheme::key_desc()),
        ]),
        Line::from(vec![
            Span::styled("[R] ", MedicalTheme::key_hint()),
            Span::styled("Refresh", MedicalTheme::key_desc()),
        ]),
        Line::from(vec![
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
    ];

    let actions_list = Paragraph::new(actions).block(
        Block::default()
            .title(Span::styled(" Quick Actions ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(actions_list, chunks[1]);
}

fn key_value(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label}: "), MedicalTheme::text_secondary()),
        Span::styled(value, MedicalTheme::text()),
    ])
}

fn format_status_item(label: &str, ok: bool) -> Line<'static> {
    let (icon, style) = if ok {
        ("OK", MedicalTheme::success())
    } else {
        ("NO", MedicalTheme::warning())
    };

    Line::from(vec![
        Span::styled(format!("  {icon} "), style),
        Span::styled(label.to_string(), MedicalTheme::text()),
    ])
}

fn render_recent_summary(f: &mut Frame, area: Rect, recent: RecentSummary) {
    let block = Block::default()
        .title(Span::styled(
            " Recent Results (Aggregated) ",
            MedicalTheme::subtitle(),
        ))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    if recent.total == 0 {
        let empty_msg = Paragraph::new(Line::from(Span::styled(
            "No submissions yet. Press [N] to start.",
            MedicalTheme::text_muted(),
        )))
        .block(block);
        f.render_widget(empty_msg, area);
        return;
    }

    let lines = vec![
        Line::from(vec![
            Span::styled("Last ", MedicalTheme::text_secondary()),
            Span::styled(recent.total.to_string(), MedicalTheme::text()),
            Span::styled(" submissions", MedicalTheme::text_muted()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Survived: ", MedicalTheme::text_secondary()),
            Span::styled(
                recent.survived.to_string(),
                MedicalTheme::survival_label(SurvivalLabel::Survived),
            ),
            Span::styled("  Not survived: ", MedicalTheme::text_secondary()),
            Span::styled(
                recent.not_survived.to_string(),
                MedicalTheme::survival_label(SurvivalLabel::NotSurvived),
            ),
        ]),
        Line::from(vec![
            Span::styled("Treatment before diagnosis: ", MedicalTheme::text_secondary()),
            Span::styled(recent.negative_delays.to_string(), MedicalTheme::info()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Patient names are not displayed.",
            MedicalTheme::text_muted(),
        )),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(result: SurvivalLabel, delay: i64) -> PersistedRecord {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");
        PersistedRecord {
            name: "x".into(),
            age: 50,
            bmi: 22.0,
            cholesterol: 190.0,
            gender: 0,
            family_history: 0,
            smoking_status: 0,
            treatment_type: 0,
            diagnosis_date: date,
            treatment_start: date,
            treatment_end: date,
            cancer_stage: 0,
            hypertension: 0,
            asthma: 0,
            cirrhosis: 0,
            other_cancer: 0,
            treatment_delay_days: delay,
            treatment_duration_days: 0,
            result,
        }
    }

    #[test]
    fn test_recent_summary_counts() {
        let rows = vec![
            row(SurvivalLabel::Survived, 3),
            row(SurvivalLabel::NotSurvived, -2),
            row(SurvivalLabel::Survived, 0),
        ];
        let summary = RecentSummary::from_rows(&rows);
        assert_eq!(
            summary,
            RecentSummary {
                total: 3,
                survived: 2,
                not_survived: 1,
                negative_delays: 1,
            }
        );
        assert_eq!(RecentSummary::from_rows(&[]), RecentSummary::default());
    }
}
