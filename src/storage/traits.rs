//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::StopReason;
use crate::listing::Listing;
use crate::storage::SessionRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session not found: {0}")]
    SessionNotFound(i64),

    #[error("Corrupt session record: {0}")]
    CorruptRecord(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The coordinator checkpoints through this trait after every page;
/// recovery and rescoring read back through it.
pub trait Storage {
    // ===== Session Management =====

    /// Creates a new collection session
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `page_limit` - The session's page limit, if bounded
    ///
    /// # Returns
    ///
    /// The ID of the newly created session
    fn create_session(&mut self, config_hash: &str, page_limit: Option<u32>)
        -> StorageResult<i64>;

    /// Gets a session by ID
    fn get_session(&self, session_id: i64) -> StorageResult<SessionRecord>;

    /// Gets the most recent session
    fn get_latest_session(&self) -> StorageResult<Option<SessionRecord>>;

    /// Marks a session as completed with the given stop reason
    fn complete_session(&mut self, session_id: i64, stop_reason: StopReason) -> StorageResult<()>;

    /// Marks an interrupted session's partial results as recovered
    fn mark_recovered(&mut self, session_id: i64) -> StorageResult<()>;

    // ===== Checkpointing =====

    /// Persists the session counters and accumulated listings
    ///
    /// Listings already checkpointed in an earlier call are left
    /// untouched; the accumulator only ever grows within a session.
    fn checkpoint_session(
        &mut self,
        session_id: i64,
        pages_visited: u32,
        duplicates_dropped: u64,
        listings: &[Listing],
    ) -> StorageResult<()>;

    /// Writes the scores of an already-checkpointed batch
    fn update_scores(&mut self, session_id: i64, listings: &[Listing]) -> StorageResult<()>;

    /// Loads a session's listings in first-seen order
    fn load_listings(&self, session_id: i64) -> StorageResult<Vec<Listing>>;
}
