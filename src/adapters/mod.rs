//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `model`: verified model artifacts (serde_json, sha2, ed25519-dalek)
//! - `sqlite`: SQLite results table
//! - `sanitize`: credential and contact filtering for logs

pub mod model;
pub mod sanitize;
pub mod sqlite;

// Re-export storage error for lib.rs
pub use sqlite::StorageError;
