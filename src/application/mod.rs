//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the intake use case and its headless variant.

#[cfg(test)]
mod fakes;
mod headless;
mod intake;

pub use headless::{submit_json, HeadlessReport, HeadlessStatus};
pub use intake::{IntakeService, PersistenceStatus, SubmissionOutcome};
