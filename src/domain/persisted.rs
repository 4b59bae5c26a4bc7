//! Row appended to the results table for every completed prediction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::prediction::{PredictionResult, SurvivalLabel};
use super::record::{Category, ClinicalRecord};

/// Column names of the results table, in insertion order.
///
/// The spelling (`treatement_type`, `begining_of_treatement`) matches the
/// existing table consumed by the reporting dashboard.
pub const COLUMNS: [&str; 19] = [
    "name",
    "age",
    "bmi",
    "cholesterol",
    "gender",
    "family_history",
    "smoking_status",
    "treatement_type",
    "diagnosis_date",
    "begining_of_treatement",
    "end_treatment_date",
    "cancer_stage",
    "hypertension",
    "asthma",
    "cirrhosis",
    "other_cancer",
    "treatment_delay_days",
    "treatment_duration_days",
    "result",
];

/// Submitted record with categorical fields as codes, plus the outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub name: String,
    pub age: u32,
    pub bmi: f64,
    pub cholesterol: f64,
    pub gender: u8,
    pub family_history: u8,
    pub smoking_status: u8,
    pub treatment_type: u8,
    pub diagnosis_date: NaiveDate,
    pub treatment_start: NaiveDate,
    pub treatment_end: NaiveDate,
    pub cancer_stage: u8,
    pub hypertension: u8,
    pub asthma: u8,
    pub cirrhosis: u8,
    pub other_cancer: u8,
    pub treatment_delay_days: i64,
    pub treatment_duration_days: i64,
    pub result: SurvivalLabel,
}

impl PersistedRecord {
    /// Combine a submission with its prediction.
    #[must_use]
    pub fn new(record: &ClinicalRecord, prediction: &PredictionResult) -> Self {
        Self {
            name: record.name.trim().to_string(),
            age: record.age,
            bmi: record.bmi,
            cholesterol: record.cholesterol,
            gender: record.gender.code(),
            family_history: record.family_history.code(),
            smoking_status: record.smoking_status.code(),
            treatment_type: record.treatment_type.code(),
            diagnosis_date: record.diagnosis_date,
            treatment_start: record.treatment_start,
            treatment_end: record.treatment_end,
            cancer_stage: record.cancer_stage.code(),
            hypertension: record.hypertension.code(),
            asthma: record.asthma.code(),
            cirrhosis: record.cirrhosis.code(),
            other_cancer: record.other_cancer.code(),
            treatment_delay_days: record.treatment_delay_days(),
            treatment_duration_days: record.treatment_duration_days(),
            result: prediction.label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{CancerStage, Gender, SmokingStatus, TreatmentType, YesNo};

    #[test]
    fn test_codes_replace_labels() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).expect("valid date");
        let record = ClinicalRecord {
            name: "  Jane Roe ".into(),
            age: 48,
            bmi: 31.2,
            cholesterol: 180.0,
            gender: Gender::Female,
            family_history: YesNo::Yes,
            smoking_status: SmokingStatus::FormerSmoker,
            treatment_type: TreatmentType::Radiation,
            cancer_stage: CancerStage::II,
            diagnosis_date: date(2022, 5, 1),
            treatment_start: date(2022, 4, 20),
            treatment_end: date(2022, 9, 1),
            hypertension: YesNo::No,
            asthma: YesNo::Yes,
            cirrhosis: YesNo::No,
            other_cancer: YesNo::Yes,
        };
        let prediction = PredictionResult::new(SurvivalLabel::NotSurvived, Some(0.2));

        let row = PersistedRecord::new(&record, &prediction);
        assert_eq!(row.name, "Jane Roe");
        assert_eq!(row.gender, 0);
        assert_eq!(row.family_history, 1);
        assert_eq!(row.smoking_status, 1);
        assert_eq!(row.treatment_type, 1);
        assert_eq!(row.cancer_stage, 1);
        assert_eq!((row.hypertension, row.asthma, row.cirrhosis, row.other_cancer), (0, 1, 0, 1));
        assert_eq!(row.treatment_delay_days, -11);
        assert_eq!(row.treatment_duration_days, 134);
        assert_eq!(row.result, SurvivalLabel::NotSurvived);
    }

    #[test]
    fn test_column_layout() {
        assert_eq!(COLUMNS.len(), 19);
        assert_eq!(COLUMNS[0], "name");
        assert_eq!(COLUMNS[7], "treatement_type");
        assert_eq!(COLUMNS[9], "begining_of_treatement");
        assert_eq!(COLUMNS[18], "result");
    }
}
