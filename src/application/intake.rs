//! Intake service: Runs one submission from validation to persistence.
//!
//! Steps:
//! - Validate the clinical record
//! - Encode the feature vector
//! - Predict label and probability
//! - Append the coded row to the sink
//!
//! A sink failure never hides the prediction: it is reported in the outcome.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::adapters::StorageError;
use crate::domain::{ClinicalRecord, EncodedFeatureVector, PersistedRecord, PredictionResult};
use crate::ports::{ModelInfo, RecordSink, SurvivalModel};
use crate::IntakeError;

/// Whether the result row reached the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceStatus {
    Stored { table: String },
    Failed { message: String },
}

impl PersistenceStatus {
    #[must_use]
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }

    /// User-facing status line.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Stored { table } => format!("Data inserted successfully into table `{table}`."),
            Self::Failed { message } => format!("Failed to store the result: {message}"),
        }
    }
}

/// Everything produced by one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub prediction: PredictionResult,
    pub features: EncodedFeatureVector,
    pub persistence: PersistenceStatus,
}

impl SubmissionOutcome {
    /// Result text in display order: headline, probability, persistence.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.prediction.label.headline().to_string()];
        if let Some(line) = self.prediction.probability_line() {
            lines.push(line);
        }
        lines.push(self.persistence.message());
        lines
    }
}

/// Service for running survival predictions on submitted records.
pub struct IntakeService<M, S>
where
    M: SurvivalModel,
    S: RecordSink,
{
    model: Arc<M>,
    sink: Arc<S>,
}

impl<M, S> IntakeService<M, S>
where
    M: SurvivalModel,
    S: RecordSink,
    S::Error: Into<StorageError>,
{
    /// Create a new intake service.
    pub fn new(model: Arc<M>, sink: Arc<S>) -> Self {
        Self { model, sink }
    }

    /// Submit a record, validating dates against the local date.
    ///
    /// # Errors
    /// Returns `Validation` for invalid input and `Inference` if the model
    /// fails. Storage failures are reported in the outcome instead.
    pub fn submit(&self, record: &ClinicalRecord) -> Result<SubmissionOutcome, IntakeError> {
        self.submit_on(record, chrono::Local::now().date_naive())
    }

    /// Submit a record, validating dates against `today`.
    ///
    /// # Errors
    /// Same as [`Self::submit`].
    pub fn submit_on(
        &self,
        record: &ClinicalRecord,
        today: NaiveDate,
    ) -> Result<SubmissionOutcome, IntakeError> {
        if let Err(problems) = record.validate(today) {
            tracing::info!("Submission rejected: {} invalid field(s)", problems.len());
            return Err(IntakeError::Validation(problems));
        }

        let features = EncodedFeatureVector::encode(record);
        let (delay, duration) = (record.treatment_delay_days(), record.treatment_duration_days());
        if delay < 0 || duration < 0 {
            tracing::debug!(
                "Negative day count accepted (delay={}, duration={})",
                delay,
                duration
            );
        }
        tracing::debug!("Encoded {} features", features.as_slice().len());

        let label = self.model.predict(&features)?;
        let probability = self.model.predict_proba(&features)?;
        let prediction = PredictionResult::new(label, probability);
        tracing::info!(
            "Prediction: {} (probability={})",
            prediction.label,
            prediction
                .probability_percent()
                .unwrap_or_else(|| "n/a".to_string())
        );

        let row = PersistedRecord::new(record, &prediction);
        let persistence = match self.sink.append(&row) {
            Ok(()) => PersistenceStatus::Stored {
                table: self.sink.destination().to_string(),
            },
            Err(e) => {
                let err: StorageError = e.into();
                tracing::error!("Failed to append result row: {}", err);
                PersistenceStatus::Failed {
                    message: err.to_string(),
                }
            }
        };

        Ok(SubmissionOutcome {
            prediction,
            features,
            persistence,
        })
    }

    /// Metadata of the loaded model.
    #[must_use]
    pub fn model_info(&self) -> ModelInfo {
        self.model.info()
    }

    /// Number of rows in the results table.
    ///
    /// # Errors
    /// Returns error if the sink cannot be queried.
    pub fn submission_count(&self) -> Result<usize, IntakeError> {
        self.sink
            .count()
            .map_err(|e| IntakeError::Storage(e.into()))
    }

    /// Most recent rows, newest first.
    ///
    /// # Errors
    /// Returns error if the sink cannot be queried.
    pub fn recent_results(&self, limit: usize) -> Result<Vec<PersistedRecord>, IntakeError> {
        self.sink
            .recent(limit)
            .map_err(|e| IntakeError::Storage(e.into()))
    }

    #[must_use]
    pub fn destination(&self) -> &str {
        self.sink.destination()
    }
}
