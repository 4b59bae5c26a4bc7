//! SQLite adapter: Implementation of RecordSink.
//!
//! Appends one row per completed prediction to the results table.
//!
//! # Connection Behavior
//!
//! The connection is opened on first use and cached. When an operation on a
//! file database fails, the cached connection is dropped and the next call
//! opens a fresh one; nothing is retried within a call. An unreachable store
//! therefore fails individual writes, never startup.
//!
//! The cached connection is protected by a `Mutex`. A poisoned mutex (from a
//! panic in another thread) is reported as `StorageError::LockPoisoned`,
//! which the intake controller surfaces as a failed write.
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use crate::config::DatabaseLocation;
use crate::domain::{PersistedRecord, SurvivalLabel, COLUMNS};
use crate::ports::RecordSink;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid table name {0:?}: use letters, digits and underscores")]
    InvalidTable(String),

    #[error("Database connection lock poisoned")]
    LockPoisoned,

    #[error("Failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// SQLite results sink.
pub struct SqliteSink {
    location: DatabaseLocation,
    conn: Mutex<Option<Connection>>,
    table: String,
}

impl SqliteSink {
    /// Prepare a sink for `table` at `location`.
    ///
    /// A first connection is attempted right away so a healthy store is
    /// ready before the first submission. If it fails, the sink is still
    /// returned and each later call tries again.
    ///
    /// # Errors
    /// Returns `InvalidTable` if the table name is not a plain identifier.
    pub fn open(location: &DatabaseLocation, table: &str) -> Result<Self, StorageError> {
        validate_table_name(table)?;
        let sink = Self {
            location: location.clone(),
            conn: Mutex::new(None),
            table: table.to_string(),
        };
        match sink.with_connection(|_| Ok(())) {
            Ok(()) => tracing::info!("Results sink ready: {} (table {})", location, sink.table),
            Err(e) => tracing::warn!(
                "Results sink {} unavailable, results will not be stored until it is reachable: {}",
                location,
                e
            ),
        }
        Ok(sink)
    }

    /// Create an in-memory database (for testing).
    ///
    /// # Errors
    /// Returns error if the table name is invalid.
    pub fn in_memory(table: &str) -> Result<Self, StorageError> {
        Self::open(&DatabaseLocation::InMemory, table)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn connect(&self) -> Result<Connection, StorageError> {
        let conn = match &self.location {
            DatabaseLocation::InMemory => Connection::open_in_memory()?,
            DatabaseLocation::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                Connection::open(path)?
            }
        };
        init_schema(&conn, &self.table)?;
        tracing::debug!("Opened results database {}", self.location);
        Ok(conn)
    }

    /// Run `op` on the cached connection, opening one if needed.
    fn with_connection<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut cached = self.lock()?;
        let conn = match cached.take() {
            Some(conn) => conn,
            None => self.connect()?,
        };
        let result = op(&conn);
        // An in-memory database lives only as long as its connection.
        if result.is_ok() || self.location == DatabaseLocation::InMemory {
            *cached = Some(conn);
        }
        result
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<PersistedRecord> {
        let date = |idx: usize| -> rusqlite::Result<NaiveDate> {
            let text: String = row.get(idx)?;
            NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
            })
        };
        let result_text: String = row.get(18)?;
        let result = result_text.parse::<SurvivalLabel>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                18,
                Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            )
        })?;

        Ok(PersistedRecord {
            name: row.get(0)?,
            age: row.get(1)?,
            bmi: row.get(2)?,
            cholesterol: row.get(3)?,
            gender: row.get(4)?,
            family_history: row.get(5)?,
            smoking_status: row.get(6)?,
            treatment_type: row.get(7)?,
            diagnosis_date: date(8)?,
            treatment_start: date(9)?,
            treatment_end: date(10)?,
            cancer_stage: row.get(11)?,
            hypertension: row.get(12)?,
            asthma: row.get(13)?,
            cirrhosis: row.get(14)?,
            other_cancer: row.get(15)?,
            treatment_delay_days: row.get(16)?,
            treatment_duration_days: row.get(17)?,
            result,
        })
    }
}

impl RecordSink for SqliteSink {
    type Error = StorageError;

    fn append(&self, record: &PersistedRecord) -> Result<(), Self::Error> {
        let placeholders = (1..=COLUMNS.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            COLUMNS.join(", "),
            placeholders
        );

        self.with_connection(|conn| {
            conn.execute(
                &sql,
                params![
                    record.name,
                    record.age,
                    record.bmi,
                    record.cholesterol,
                    record.gender,
                    record.family_history,
                    record.smoking_status,
                    record.treatment_type,
                    record.diagnosis_date.format(DATE_FORMAT).to_string(),
                    record.treatment_start.format(DATE_FORMAT).to_string(),
                    record.treatment_end.format(DATE_FORMAT).to_string(),
                    record.cancer_stage,
                    record.hypertension,
                    record.asthma,
                    record.cirrhosis,
                    record.other_cancer,
                    record.treatment_delay_days,
                    record.treatment_duration_days,
                    record.result.as_str(),
                ],
            )?;
            Ok(())
        })?;

        tracing::debug!("Appended result row to {}", self.table);
        Ok(())
    }

    fn count(&self) -> Result<usize, Self::Error> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 =
            self.with_connection(|conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn recent(&self, limit: usize) -> Result<Vec<PersistedRecord>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid DESC LIMIT ?1",
            COLUMNS.join(", "),
            self.table
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let records = stmt
                .query_map(params![limit], Self::row_to_record)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
    }

    fn destination(&self) -> &str {
        &self.table
    }
}

fn init_schema(conn: &Connection, table: &str) -> Result<(), StorageError> {
    conn.execute_batch(&format!(
        r"
        CREATE TABLE IF NOT EXISTS {table} (
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            bmi REAL NOT NULL,
            cholesterol REAL NOT NULL,
            gender INTEGER NOT NULL,
            family_history INTEGER NOT NULL,
            smoking_status INTEGER NOT NULL,
            treatement_type INTEGER NOT NULL,
            diagnosis_date TEXT NOT NULL,
            begining_of_treatement TEXT NOT NULL,
            end_treatment_date TEXT NOT NULL,
            cancer_stage INTEGER NOT NULL,
            hypertension INTEGER NOT NULL,
            asthma INTEGER NOT NULL,
            cirrhosis INTEGER NOT NULL,
            other_cancer INTEGER NOT NULL,
            treatment_delay_days INTEGER NOT NULL,
            treatment_duration_days INTEGER NOT NULL,
            result TEXT NOT NULL
        );
        "
    ))?;
    Ok(())
}

/// Accept only `[A-Za-z_][A-Za-z0-9_]*`; the name is interpolated into SQL.
fn validate_table_name(table: &str) -> Result<(), StorageError> {
    let mut chars = table.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidTable(table.to_string()))
    }
}
