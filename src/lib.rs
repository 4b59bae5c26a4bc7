//! # Survival Intake
//!
//! Lung cancer survival prediction intake.
//!
//! This crate provides:
//! - A clinical intake record with validation and a fixed 14-feature encoding
//! - Verified loading of a pre-trained classifier (tree ensemble or linear)
//! - An append-only SQLite results table
//! - Terminal UI and a headless `predict` command
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (ClinicalRecord, EncodedFeatureVector, PredictionResult)
//! - `ports`: Trait definitions for the model and the results sink
//! - `adapters`: Concrete implementations (model artifacts, SQLite, log sanitizing)
//! - `application`: The intake use case orchestrating domain and ports
//! - `config`: Environment and secret-file configuration
//! - `tui`: Terminal user interface

use std::sync::Arc;

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use application::{IntakeService, PersistenceStatus, SubmissionOutcome};
pub use config::IntakeConfig;
pub use domain::{ClinicalRecord, EncodedFeatureVector, PredictionResult, SurvivalLabel};

use adapters::model::{ArtifactModel, LoadOptions};
use adapters::sqlite::SqliteSink;

/// Result type for intake operations
pub type Result<T> = std::result::Result<T, IntakeError>;

/// Main error type for the intake
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Invalid clinical record: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Prediction failed: {0}")]
    Inference(#[from] ports::PredictionError),

    #[error("Model could not be loaded: {0}")]
    ModelLoad(#[from] adapters::model::LoadError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Intake service wired to the production adapters.
pub type DefaultIntakeService = IntakeService<ArtifactModel, SqliteSink>;

/// Load the model and prepare the sink described by `config`.
///
/// An unreachable database does not stop startup: the sink connects on
/// demand and each failed write is reported with its prediction.
///
/// # Errors
/// Returns `ModelLoad` if the artifact is missing or corrupt, and `Storage`
/// if the table name is not a plain identifier.
pub fn build_service(config: &IntakeConfig) -> Result<DefaultIntakeService> {
    let options = LoadOptions {
        pubkey_file: config.model_pubkey_file.clone(),
        require_signature: config.require_signed_model,
    };
    let model = ArtifactModel::load(&config.model_dir, &options)?;
    let sink = SqliteSink::open(&config.database, &config.table)?;
    Ok(IntakeService::new(Arc::new(model), Arc::new(sink)))
}
