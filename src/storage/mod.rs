//! Storage module for persisting collection sessions
//!
//! This module handles all database operations for the harvester,
//! including:
//! - SQLite database initialization and schema management
//! - Per-page session checkpointing
//! - Recovery of partial results from interrupted sessions
//! - Score persistence for rescoring stored batches

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::ScoutError;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(ScoutError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, ScoutError> {
    SqliteStorage::new(path)
}

/// Represents a collection session
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: SessionStatus,
    pub stop_reason: Option<String>,
    pub page_limit: Option<u32>,
    pub pages_visited: u32,
    pub duplicates_dropped: u64,
}

/// Status of a collection session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The session is (or was, if the process died) in progress
    Running,

    /// The session finished and recorded a stop reason
    Completed,

    /// An interrupted session whose partial results were recovered
    Recovered,
}

impl SessionStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Recovered => "recovered",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "recovered" => Some(Self::Recovered),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_status_roundtrip() {
        for status in &[
            SessionStatus::Running,
            SessionStatus::Completed,
            SessionStatus::Recovered,
        ] {
            let db = status.to_db_string();
            assert_eq!(SessionStatus::from_db_string(db), Some(*status));
        }
        assert_eq!(SessionStatus::from_db_string("unknown"), None);
    }
}
