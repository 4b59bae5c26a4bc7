//! Ports layer: Trait definitions for external operations.
//!
//! These traits define the boundaries between the intake controller and the
//! model artifact and results store.

mod model;
mod sink;

pub use model::{ModelInfo, PredictionError, SurvivalModel};
pub use sink::RecordSink;
