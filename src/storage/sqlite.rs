//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::StopReason;
use crate::listing::Listing;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{SessionRecord, SessionStatus};
use crate::ScoutError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(ScoutError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ScoutError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, ScoutError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
        let status_str: String = row.get("status")?;
        let status = SessionStatus::from_db_string(&status_str).unwrap_or(SessionStatus::Running);
        let page_limit: Option<i64> = row.get("page_limit")?;
        let pages_visited: i64 = row.get("pages_visited")?;
        let duplicates_dropped: i64 = row.get("duplicates_dropped")?;

        Ok(SessionRecord {
            id: row.get("id")?,
            started_at: row.get("started_at")?,
            finished_at: row.get("finished_at")?,
            config_hash: row.get("config_hash")?,
            status,
            stop_reason: row.get("stop_reason")?,
            page_limit: page_limit.map(|l| l as u32),
            pages_visited: pages_visited as u32,
            duplicates_dropped: duplicates_dropped as u64,
        })
    }

    fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<Listing> {
        let reviews: i64 = row.get("reviews")?;
        Ok(Listing {
            title: row.get("title")?,
            identity_key: row.get("identity_key")?,
            rating: row.get("rating")?,
            reviews: reviews.max(0) as u64,
            price: row.get("price")?,
            url: row.get("url")?,
            score: row.get("score")?,
        })
    }
}

impl Storage for SqliteStorage {
    // ===== Session Management =====

    fn create_session(
        &mut self,
        config_hash: &str,
        page_limit: Option<u32>,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO sessions (started_at, config_hash, status, page_limit)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                now,
                config_hash,
                SessionStatus::Running.to_db_string(),
                page_limit.map(i64::from)
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_session(&self, session_id: i64) -> StorageResult<SessionRecord> {
        self.conn
            .query_row(
                "SELECT * FROM sessions WHERE id = ?1",
                params![session_id],
                Self::session_from_row,
            )
            .optional()?
            .ok_or(StorageError::SessionNotFound(session_id))
    }

    fn get_latest_session(&self) -> StorageResult<Option<SessionRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT * FROM sessions ORDER BY id DESC LIMIT 1",
                [],
                Self::session_from_row,
            )
            .optional()?)
    }

    fn complete_session(&mut self, session_id: i64, stop_reason: StopReason) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE sessions SET status = ?1, stop_reason = ?2, finished_at = ?3 WHERE id = ?4",
            params![
                SessionStatus::Completed.to_db_string(),
                stop_reason.to_db_string(),
                now,
                session_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::SessionNotFound(session_id));
        }
        Ok(())
    }

    fn mark_recovered(&mut self, session_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE sessions SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![SessionStatus::Recovered.to_db_string(), now, session_id],
        )?;
        if updated == 0 {
            return Err(StorageError::SessionNotFound(session_id));
        }
        Ok(())
    }

    // ===== Checkpointing =====

    fn checkpoint_session(
        &mut self,
        session_id: i64,
        pages_visited: u32,
        duplicates_dropped: u64,
        listings: &[Listing],
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        let updated = tx.execute(
            "UPDATE sessions SET pages_visited = ?1, duplicates_dropped = ?2 WHERE id = ?3",
            params![pages_visited, duplicates_dropped as i64, session_id],
        )?;
        if updated == 0 {
            return Err(StorageError::SessionNotFound(session_id));
        }

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO listings
                 (session_id, position, identity_key, title, rating, reviews, price, url, score)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for (position, listing) in listings.iter().enumerate() {
                stmt.execute(params![
                    session_id,
                    position as i64,
                    listing.identity_key,
                    listing.title,
                    listing.rating,
                    listing.reviews as i64,
                    listing.price,
                    listing.url,
                    listing.score,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn update_scores(&mut self, session_id: i64, listings: &[Listing]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE listings SET score = ?1 WHERE session_id = ?2 AND identity_key = ?3",
            )?;
            for listing in listings {
                stmt.execute(params![listing.score, session_id, listing.identity_key])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_listings(&self, session_id: i64) -> StorageResult<Vec<Listing>> {
        let mut stmt = self.conn.prepare(
            "SELECT identity_key, title, rating, reviews, price, url, score
             FROM listings WHERE session_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![session_id], Self::listing_from_row)?;

        let mut listings = Vec::new();
        for row in rows {
            listings.push(row?);
        }
        Ok(listings)
    }
}
