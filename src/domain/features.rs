//! Feature encoding for the survival model.
//!
//! The vector layout is a contract with the trained model artifact. It is
//! published as [`FEATURE_NAMES`] plus [`ENCODING_VERSION`] and checked
//! against the artifact manifest at load time.

use serde::Serialize;

use super::record::{Category, ClinicalRecord};

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 14;

/// Version tag of the category maps and feature order below.
///
/// Bump whenever a code, a name or the order changes.
pub const ENCODING_VERSION: &str = "lung-survival-v1";

/// Feature names in model input order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "cancer_stage",
    "smoking_status",
    "bmi",
    "cholesterol",
    "hypertension",
    "asthma",
    "cirrhosis",
    "other_cancer",
    "treatment_type",
    "gender",
    "family_history",
    "treatment_delay_days",
    "treatment_duration_days",
];

/// Fixed-order numeric encoding of one [`ClinicalRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EncodedFeatureVector([f64; FEATURE_COUNT]);

impl EncodedFeatureVector {
    /// Encode a record.
    ///
    /// Pure: the same record always yields the same vector.
    #[must_use]
    pub fn encode(record: &ClinicalRecord) -> Self {
        Self([
            f64::from(record.age),
            f64::from(record.cancer_stage.code()),
            f64::from(record.smoking_status.code()),
            record.bmi,
            record.cholesterol,
            f64::from(record.hypertension.code()),
            f64::from(record.asthma.code()),
            f64::from(record.cirrhosis.code()),
            f64::from(record.other_cancer.code()),
            f64::from(record.treatment_type.code()),
            f64::from(record.gender.code()),
            f64::from(record.family_history.code()),
            record.treatment_delay_days() as f64,
            record.treatment_duration_days() as f64,
        ])
    }

    /// Wrap raw values already in model order.
    #[must_use]
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Value of a feature by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.0[i])
    }

    /// Feature name of the first non-finite value, if any.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.0
            .iter()
            .position(|v| !v.is_finite())
            .map(|i| FEATURE_NAMES[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{
        CancerStage, Gender, SmokingStatus, TreatmentType, YesNo,
    };
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn reference_record() -> ClinicalRecord {
        ClinicalRecord {
            name: "Reference".into(),
            age: 65,
            bmi: 24.5,
            cholesterol: 200.0,
            gender: Gender::Male,
            family_history: YesNo::No,
            smoking_status: SmokingStatus::CurrentSmoker,
            treatment_type: TreatmentType::Chemotherapy,
            cancer_stage: CancerStage::III,
            diagnosis_date: date(2023, 1, 1),
            treatment_start: date(2023, 1, 10),
            treatment_end: date(2023, 6, 10),
            hypertension: YesNo::Yes,
            asthma: YesNo::No,
            cirrhosis: YesNo::No,
            other_cancer: YesNo::No,
        }
    }

    fn index(name: &str) -> usize {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .expect("known feature")
    }

    #[test]
    fn test_reference_vector() {
        let v = EncodedFeatureVector::encode(&reference_record());
        assert_eq!(
            v.as_slice(),
            &[65.0, 2.0, 3.0, 24.5, 200.0, 1.0, 0.0, 0.0, 0.0, 2.0, 1.0, 0.0, 9.0, 151.0]
        );
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let record = reference_record();
        assert_eq!(
            EncodedFeatureVector::encode(&record),
            EncodedFeatureVector::encode(&record)
        );
    }

    #[test]
    fn test_smoking_codes_at_index() {
        let expected = [
            (SmokingStatus::NeverSmoked, 0.0),
            (SmokingStatus::FormerSmoker, 1.0),
            (SmokingStatus::PassiveSmoker, 2.0),
            (SmokingStatus::CurrentSmoker, 3.0),
        ];
        for (status, code) in expected {
            let mut r = reference_record();
            r.smoking_status = status;
            let v = EncodedFeatureVector::encode(&r);
            assert_eq!(v.as_slice()[index("smoking_status")], code, "{status}");
        }
    }

    #[test]
    fn test_treatment_codes_at_index() {
        let expected = [
            (TreatmentType::Surgery, 0.0),
            (TreatmentType::Radiation, 1.0),
            (TreatmentType::Chemotherapy, 2.0),
            (TreatmentType::Combined, 3.0),
        ];
        for (treatment, code) in expected {
            let mut r = reference_record();
            r.treatment_type = treatment;
            let v = EncodedFeatureVector::encode(&r);
            assert_eq!(v.as_slice()[index("treatment_type")], code, "{treatment}");
        }
    }

    #[test]
    fn test_stage_codes_at_index() {
        let expected = [
            (CancerStage::I, 0.0),
            (CancerStage::II, 1.0),
            (CancerStage::III, 2.0),
            (CancerStage::IV, 3.0),
        ];
        for (stage, code) in expected {
            let mut r = reference_record();
            r.cancer_stage = stage;
            let v = EncodedFeatureVector::encode(&r);
            assert_eq!(v.as_slice()[index("cancer_stage")], code, "{stage}");
        }
    }

    #[test]
    fn test_gender_codes_at_index() {
        for (gender, code) in [(Gender::Male, 1.0), (Gender::Female, 0.0)] {
            let mut r = reference_record();
            r.gender = gender;
            let v = EncodedFeatureVector::encode(&r);
            assert_eq!(v.as_slice()[index("gender")], code, "{gender}");
        }
    }

    #[test]
    fn test_yes_no_flags_at_index() {
        type Setter = fn(&mut ClinicalRecord, YesNo);
        let flags: [(&str, Setter); 5] = [
            ("hypertension", |r, v| r.hypertension = v),
            ("asthma", |r, v| r.asthma = v),
            ("cirrhosis", |r, v| r.cirrhosis = v),
            ("other_cancer", |r, v| r.other_cancer = v),
            ("family_history", |r, v| r.family_history = v),
        ];

        for (name, set) in flags {
            for (flag, code) in [(YesNo::Yes, 1.0), (YesNo::No, 0.0)] {
                let mut r = reference_record();
                set(&mut r, flag);
                let v = EncodedFeatureVector::encode(&r);
                assert_eq!(v.get(name), Some(code), "{name}={flag}");
            }
        }
    }

    #[test]
    fn test_leap_year_delay() {
        let mut r = reference_record();
        r.diagnosis_date = date(2024, 2, 28);
        r.treatment_start = date(2024, 3, 1);
        let v = EncodedFeatureVector::encode(&r);
        assert_eq!(v.get("treatment_delay_days"), Some(2.0));
    }

    #[test]
    fn test_non_finite_detection() {
        let mut r = reference_record();
        r.bmi = f64::INFINITY;
        let v = EncodedFeatureVector::encode(&r);
        assert_eq!(v.first_non_finite(), Some("bmi"));
        assert_eq!(
            EncodedFeatureVector::encode(&reference_record()).first_non_finite(),
            None
        );
    }
}
