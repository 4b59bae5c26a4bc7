//! In-memory model and sink doubles for the application tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::adapters::StorageError;
use crate::domain::{EncodedFeatureVector, PersistedRecord, SurvivalLabel, ENCODING_VERSION};
use crate::ports::{ModelInfo, PredictionError, RecordSink, SurvivalModel};

pub(crate) struct FakeModel {
    pub label: SurvivalLabel,
    pub probability: Option<f64>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeModel {
    pub fn returning(label: SurvivalLabel, probability: Option<f64>) -> Self {
        Self {
            label,
            probability,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::returning(SurvivalLabel::Survived, None)
        }
    }
}

impl SurvivalModel for FakeModel {
    fn predict(&self, _features: &EncodedFeatureVector) -> Result<SurvivalLabel, PredictionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PredictionError::Evaluation("boom".into()));
        }
        Ok(self.label)
    }

    fn predict_proba(
        &self,
        _features: &EncodedFeatureVector,
    ) -> Result<Option<f64>, PredictionError> {
        Ok(self.probability)
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            kind: "fake".into(),
            estimators: 1,
            encoding_version: ENCODING_VERSION.into(),
            signed: false,
        }
    }
}

/// Sink that records rows in memory or always fails.
#[derive(Default)]
pub(crate) struct MemorySink {
    pub rows: Mutex<Vec<PersistedRecord>>,
    pub fail: bool,
}

impl RecordSink for MemorySink {
    type Error = StorageError;

    fn append(&self, record: &PersistedRecord) -> Result<(), Self::Error> {
        if self.fail {
            return Err(StorageError::LockPoisoned);
        }
        self.rows
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .push(record.clone());
        Ok(())
    }

    fn count(&self) -> Result<usize, Self::Error> {
        Ok(self.rows.lock().map_err(|_| StorageError::LockPoisoned)?.len())
    }

    fn recent(&self, limit: usize) -> Result<Vec<PersistedRecord>, Self::Error> {
        let rows = self.rows.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(rows.iter().rev().take(limit).cloned().collect())
    }

    fn destination(&self) -> &str {
        "output1"
    }
}
