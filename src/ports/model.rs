//! Model port: Trait for survival classifiers.
//!
//! This trait abstracts the serialized model artifact from the intake logic.
//! Implementations are loaded once and shared read-only.

use crate::domain::{EncodedFeatureVector, SurvivalLabel};

/// Error raised while evaluating a model on one feature vector.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("Feature count mismatch: got {got}, expected {expected}")]
    FeatureCount { got: usize, expected: usize },

    #[error("Feature {0} is not a finite number")]
    NonFinite(&'static str),

    #[error("Model evaluation failed: {0}")]
    Evaluation(String),
}

/// Descriptive metadata shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model family, e.g. `tree_ensemble`
    pub kind: String,
    /// Number of trees, or 1 for single-stage models
    pub estimators: usize,
    /// Encoding version the artifact was trained against
    pub encoding_version: String,
    /// Whether the artifact manifest carried a verified signature
    pub signed: bool,
}

/// Trait for survival classifiers.
pub trait SurvivalModel: Send + Sync {
    /// Predict the survival label.
    ///
    /// # Errors
    /// Returns `PredictionError` if the model cannot evaluate the vector.
    fn predict(&self, features: &EncodedFeatureVector) -> Result<SurvivalLabel, PredictionError>;

    /// Probability of the survived class.
    ///
    /// `None` when the model has no probabilistic output.
    ///
    /// # Errors
    /// Returns `PredictionError` if the model cannot evaluate the vector.
    fn predict_proba(
        &self,
        _features: &EncodedFeatureVector,
    ) -> Result<Option<f64>, PredictionError> {
        Ok(None)
    }

    /// Metadata about the loaded model.
    fn info(&self) -> ModelInfo;
}
