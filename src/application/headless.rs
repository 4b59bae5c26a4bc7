//! Headless submission: one JSON record in, result text and an exit status out.
//!
//! Exit codes:
//! - `0`: prediction made (the row may still have failed to store)
//! - `1`: the model failed
//! - `2`: the input is not a valid clinical record, including JSON that
//!   does not deserialize (wrong types, unknown labels, negative ages)

use chrono::NaiveDate;

use crate::adapters::StorageError;
use crate::domain::ClinicalRecord;
use crate::ports::{RecordSink, SurvivalModel};
use crate::IntakeError;

use super::IntakeService;

/// How a headless run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessStatus {
    Completed,
    Rejected,
    Failed,
}

impl HeadlessStatus {
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::Failed => 1,
            Self::Rejected => 2,
        }
    }
}

/// Text for stdout and stderr plus the final status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessReport {
    pub status: HeadlessStatus,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl HeadlessReport {
    fn rejected(problems: impl IntoIterator<Item = String>) -> Self {
        let mut stderr = vec!["Invalid clinical record:".to_string()];
        stderr.extend(problems.into_iter().map(|p| format!("  - {p}")));
        Self {
            status: HeadlessStatus::Rejected,
            stdout: Vec::new(),
            stderr,
        }
    }
}

/// Parse `raw` as a [`ClinicalRecord`] and submit it, checking dates
/// against `today`.
pub fn submit_json<M, S>(
    service: &IntakeService<M, S>,
    raw: &str,
    today: NaiveDate,
) -> HeadlessReport
where
    M: SurvivalModel,
    S: RecordSink,
    S::Error: Into<StorageError>,
{
    let record: ClinicalRecord = match serde_json::from_str(raw) {
        Ok(record) => record,
        Err(e) => {
            tracing::info!("Submission rejected: record JSON did not parse");
            return HeadlessReport::rejected([e.to_string()]);
        }
    };

    match service.submit_on(&record, today) {
        Ok(outcome) => HeadlessReport {
            status: HeadlessStatus::Completed,
            stdout: outcome.lines(),
            stderr: Vec::new(),
        },
        Err(IntakeError::Validation(problems)) => HeadlessReport::rejected(problems),
        Err(e) => HeadlessReport {
            status: HeadlessStatus::Failed,
            stdout: Vec::new(),
            stderr: vec![e.to_string()],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fakes::{FakeModel, MemorySink};
    use crate::domain::SurvivalLabel;
    use std::sync::Arc;

    const RECORD: &str = include_str!("../../demos/record.json");

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
    }

    fn service(model: FakeModel, sink: MemorySink) -> IntakeService<FakeModel, MemorySink> {
        IntakeService::new(Arc::new(model), Arc::new(sink))
    }

    fn with_field(field: &str, value: serde_json::Value) -> String {
        let mut json: serde_json::Value = serde_json::from_str(RECORD).expect("demo record");
        json[field] = value;
        json.to_string()
    }

    #[test]
    fn test_completed_run_prints_result() {
        let svc = service(
            FakeModel::returning(SurvivalLabel::Survived, Some(0.5191)),
            MemorySink::default(),
        );
        let report = submit_json(&svc, RECORD, today());

        assert_eq!(report.status, HeadlessStatus::Completed);
        assert_eq!(report.status.exit_code(), 0);
        assert_eq!(
            report.stdout,
            vec![
                "The model predicts a HIGH chance of survival!".to_string(),
                "Predicted probability of survival (class=1): 51.91%".to_string(),
                "Data inserted successfully into table `output1`.".to_string(),
            ]
        );
        assert!(report.stderr.is_empty());
    }

    #[test]
    fn test_out_of_range_values_exit_2() {
        let svc = service(
            FakeModel::returning(SurvivalLabel::Survived, None),
            MemorySink::default(),
        );
        let report = submit_json(&svc, &with_field("age", serde_json::json!(130)), today());

        assert_eq!(report.status.exit_code(), 2);
        assert_eq!(report.stderr[0], "Invalid clinical record:");
        assert!(report.stderr[1].contains("Age 130"));
        assert_eq!(svc.submission_count().expect("count"), 0);
    }

    #[test]
    fn test_undeserializable_values_exit_2() {
        let svc = service(
            FakeModel::returning(SurvivalLabel::Survived, None),
            MemorySink::default(),
        );

        for raw in [
            with_field("age", serde_json::json!(-1)),
            with_field("cancer_stage", serde_json::json!("V")),
            "{ not json".to_string(),
        ] {
            let report = submit_json(&svc, &raw, today());
            assert_eq!(report.status, HeadlessStatus::Rejected, "{raw}");
            assert_eq!(report.status.exit_code(), 2);
            assert_eq!(report.stderr.len(), 2);
        }
        assert_eq!(svc.submission_count().expect("count"), 0);
    }

    #[test]
    fn test_inference_failure_exits_1() {
        let svc = service(FakeModel::failing(), MemorySink::default());
        let report = submit_json(&svc, RECORD, today());

        assert_eq!(report.status, HeadlessStatus::Failed);
        assert_eq!(report.status.exit_code(), 1);
        assert!(report.stdout.is_empty());
        assert!(report.stderr[0].starts_with("Prediction failed"));
        assert_eq!(svc.submission_count().expect("count"), 0);
    }

    #[test]
    fn test_persistence_failure_still_exits_0() {
        let svc = service(
            FakeModel::returning(SurvivalLabel::NotSurvived, None),
            MemorySink {
                fail: true,
                ..MemorySink::default()
            },
        );
        let report = submit_json(&svc, RECORD, today());

        assert_eq!(report.status.exit_code(), 0);
        assert_eq!(report.stdout[0], "The model predicts a LOW chance of survival.");
        assert!(report.stdout[1].starts_with("Failed to store the result:"));
    }
}
