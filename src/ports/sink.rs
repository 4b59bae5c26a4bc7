//! Sink port: Trait for the append-only results store.
//!
//! There is deliberately no update or delete operation.

use crate::domain::PersistedRecord;

/// Trait for the relational results store.
pub trait RecordSink: Send + Sync {
    /// Error type for sink operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Append one row.
    ///
    /// # Errors
    /// Returns error if the write fails. Callers do not retry.
    fn append(&self, record: &PersistedRecord) -> Result<(), Self::Error>;

    /// Number of stored rows.
    ///
    /// # Errors
    /// Returns error if the query fails.
    fn count(&self) -> Result<usize, Self::Error>;

    /// Most recently appended rows, newest first.
    ///
    /// # Errors
    /// Returns error if the query fails.
    fn recent(&self, limit: usize) -> Result<Vec<PersistedRecord>, Self::Error>;

    /// Name of the destination table.
    fn destination(&self) -> &str;
}
