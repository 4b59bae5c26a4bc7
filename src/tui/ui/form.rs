//! Clinical intake form.

use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{
    CancerStage, Category, ClinicalRecord, Gender, SmokingStatus, TreatmentType, YesNo,
};
use crate::tui::styles::MedicalTheme;

const DATE_FORMAT: &str = "%Y-%m-%d";
const MAX_NAME_LEN: usize = 100;

/// Fields in focus order. Columns split after `FamilyHistory` and `EndDate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldId {
    Name,
    Age,
    Bmi,
    Cholesterol,
    Gender,
    FamilyHistory,
    SmokingStatus,
    TreatmentType,
    DiagnosisDate,
    StartDate,
    EndDate,
    CancerStage,
    Hypertension,
    Asthma,
    Cirrhosis,
    OtherCancer,
}

const COLUMN_SPLITS: [usize; 2] = [6, 12];

#[derive(Debug, Clone)]
enum FieldKind {
    Text,
    Integer,
    Decimal,
    Date,
    Choice {
        options: Vec<&'static str>,
        index: usize,
    },
}

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    id: FieldId,
    pub label: &'static str,
    pub hint: &'static str,
    kind: FieldKind,
    pub value: String,
}

impl FormField {
    fn text(id: FieldId, label: &'static str, hint: &'static str, kind: FieldKind) -> Self {
        Self {
            id,
            label,
            hint,
            kind,
            value: String::new(),
        }
    }

    fn date(id: FieldId, label: &'static str, today: NaiveDate) -> Self {
        Self {
            value: today.format(DATE_FORMAT).to_string(),
            ..Self::text(id, label, "YYYY-MM-DD", FieldKind::Date)
        }
    }

    fn choice<C: Category>(id: FieldId, label: &'static str) -> Self {
        let options: Vec<&'static str> = C::ALL.iter().map(|c| c.label()).collect();
        Self {
            value: options[0].to_string(),
            ..Self::text(id, label, "←/→ to change", FieldKind::Choice { options, index: 0 })
        }
    }

    #[must_use]
    pub fn is_choice(&self) -> bool {
        matches!(self.kind, FieldKind::Choice { .. })
    }

    fn accepts(&self, c: char) -> bool {
        match self.kind {
            FieldKind::Text => !c.is_control() && self.value.chars().count() < MAX_NAME_LEN,
            FieldKind::Integer => c.is_ascii_digit(),
            FieldKind::Decimal => c.is_ascii_digit() || (c == '.' && !self.value.contains('.')),
            FieldKind::Date => (c.is_ascii_digit() || c == '-') && self.value.len() < 10,
            FieldKind::Choice { .. } => false,
        }
    }

    fn select(&mut self, target: &str) {
        if let FieldKind::Choice { options, index } = &mut self.kind {
            if let Some(pos) = options.iter().position(|o| *o == target) {
                *index = pos;
                self.value = options[pos].to_string();
            }
        } else {
            self.value = target.to_string();
        }
    }
}

/// Intake form state
pub struct IntakeFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
    today: NaiveDate,
}

impl IntakeFormState {
    /// Empty form; dates default to `today`.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        use FieldId as F;
        Self {
            fields: vec![
                FormField::text(F::Name, "Name", "Enter your name here", FieldKind::Text),
                FormField::text(F::Age, "Age", "years (0-120)", FieldKind::Integer),
                FormField::text(F::Bmi, "BMI", "e.g. 24.5", FieldKind::Decimal),
                FormField::text(F::Cholesterol, "Cholesterol level", "e.g. 200", FieldKind::Decimal),
                FormField::choice::<Gender>(F::Gender, "Gender"),
                FormField::choice::<YesNo>(F::FamilyHistory, "Family History"),
                FormField::choice::<SmokingStatus>(F::SmokingStatus, "Smoking Status"),
                FormField::choice::<TreatmentType>(F::TreatmentType, "Treatment Type"),
                FormField::date(F::DiagnosisDate, "Date of Diagnosis", today),
                FormField::date(F::StartDate, "Beginning of treatment date", today),
                FormField::date(F::EndDate, "End of treatment date", today),
                FormField::choice::<CancerStage>(F::CancerStage, "Cancer Stage"),
                FormField::choice::<YesNo>(F::Hypertension, "Hypertension"),
                FormField::choice::<YesNo>(F::Asthma, "Asthma"),
                FormField::choice::<YesNo>(F::Cirrhosis, "Cirrhosis"),
                FormField::choice::<YesNo>(F::OtherCancer, "Other Cancer"),
            ],
            selected_field: 0,
            error_message: None,
            today,
        }
    }

    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current field
    pub fn input_char(&mut self, c: char) {
        let field = &mut self.fields[self.selected_field];
        if field.accepts(c) {
            field.value.push(c);
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        let field = &mut self.fields[self.selected_field];
        if !field.is_choice() {
            field.value.pop();
        }
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        let field = &mut self.fields[self.selected_field];
        if !field.is_choice() {
            field.value.zeroize();
        }
    }

    /// Step the current choice field; no-op on other fields.
    pub fn cycle_choice(&mut self, forward: bool) {
        let field = &mut self.fields[self.selected_field];
        if let FieldKind::Choice { options, index } = &mut field.kind {
            let len = options.len();
            *index = if forward { (*index + 1) % len } else { (*index + len - 1) % len };
            field.value = options[*index].to_string();
            self.error_message = None;
        }
    }

    /// Wipe every buffer and restore defaults.
    pub fn clear_sensitive(&mut self) {
        for field in self.fields.iter_mut() {
            field.value.zeroize();
        }
        let today = self.today;
        *self = Self::new(today);
    }

    fn value(&self, id: FieldId) -> &str {
        self.fields
            .iter()
            .find(|f| f.id == id)
            .map_or("", |f| f.value.trim())
    }

    fn field(&self, id: FieldId) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == id)
    }

    fn parse<T: std::str::FromStr>(&self, id: FieldId, what: &str) -> Result<T, String> {
        let label = self.field(id).map_or("", |f| f.label);
        let raw = self.value(id);
        if raw.is_empty() {
            return Err(format!("{label}: required"));
        }
        raw.parse()
            .map_err(|_| format!("{label}: invalid {what} '{raw}'"))
    }

    fn parse_date(&self, id: FieldId) -> Result<NaiveDate, String> {
        let label = self.field(id).map_or("", |f| f.label);
        let raw = self.value(id);
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|_| format!("{label}: expected YYYY-MM-DD, got '{raw}'"))
    }

    /// Convert the buffers into a record. Range checks happen at submission.
    ///
    /// # Errors
    /// Returns a message naming the first field that cannot be parsed.
    pub fn to_record(&self) -> Result<ClinicalRecord, String> {
        use FieldId as F;
        Ok(ClinicalRecord {
            name: self.value(F::Name).to_string(),
            age: self.parse(F::Age, "whole number")?,
            bmi: self.parse(F::Bmi, "number")?,
            cholesterol: self.parse(F::Cholesterol, "number")?,
            gender: self.parse(F::Gender, "choice")?,
            family_history: self.parse(F::FamilyHistory, "choice")?,
            smoking_status: self.parse(F::SmokingStatus, "choice")?,
            treatment_type: self.parse(F::TreatmentType, "choice")?,
            cancer_stage: self.parse(F::CancerStage, "choice")?,
            diagnosis_date: self.parse_date(F::DiagnosisDate)?,
            treatment_start: self.parse_date(F::StartDate)?,
            treatment_end: self.parse_date(F::EndDate)?,
            hypertension: self.parse(F::Hypertension, "choice")?,
            asthma: self.parse(F::Asthma, "choice")?,
            cirrhosis: self.parse(F::Cirrhosis, "choice")?,
            other_cancer: self.parse(F::OtherCancer, "choice")?,
        })
    }

    /// Load a sample record for demonstration
    pub fn load_sample_data(&mut self) {
        use FieldId as F;
        let sample = [
            (F::Name, "Sample Patient"),
            (F::Age, "65"),
            (F::Bmi, "24.5"),
            (F::Cholesterol, "200"),
            (F::Gender, "Male"),
            (F::FamilyHistory, "No"),
            (F::SmokingStatus, "Current Smoker"),
            (F::TreatmentType, "Chemotherapy"),
            (F::DiagnosisDate, "2023-01-01"),
            (F::StartDate, "2023-01-10"),
            (F::EndDate, "2023-06-10"),
            (F::CancerStage, "III"),
            (F::Hypertension, "Yes"),
            (F::Asthma, "No"),
            (F::Cirrhosis, "No"),
            (F::OtherCancer, "No"),
        ];
        for (id, value) in sample {
            if let Some(field) = self.fields.iter_mut().find(|f| f.id == id) {
                field.value.zeroize();
                field.select(value);
            }
        }
        self.error_message = None;
    }
}

/// Render the intake form
pub fn render_intake_form(f: &mut Frame, area: Rect, state: &IntakeFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Lung Cancer Survival Prediction", MedicalTheme::title()),
        Span::styled(" │ Patient Intake", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &IntakeFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .margin(1)
        .split(area);

    let [first, second] = COLUMN_SPLITS;
    let ranges = [0..first, first..second, second..state.fields.len()];
    for (column, range) in columns.iter().zip(ranges) {
        let offset = range.start;
        render_field_column(f, *column, &state.fields[range], offset, state.selected_field);
    }
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        if field.is_choice() {
            spans.push(Span::styled("‹ ", MedicalTheme::text_muted()));
            spans.push(Span::styled(field.value.as_str(), MedicalTheme::text()));
            spans.push(Span::styled(" ›", MedicalTheme::text_muted()));
        } else if field.value.is_empty() {
            spans.push(Span::styled(field.hint, MedicalTheme::text_muted()));
        } else {
            spans.push(Span::styled(field.value.as_str(), MedicalTheme::text()));
        }
        if is_selected && !field.is_choice() {
            spans.push(Span::styled("▌", MedicalTheme::cursor()));
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &IntakeFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓/Tab] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[←→] ", MedicalTheme::key_hint()),
            Span::styled("Choose ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Submit ", MedicalTheme::key_desc()),
            Span::styled("[F2] ", MedicalTheme::key_hint()),
            Span::styled("Sample Data ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Cancel", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
