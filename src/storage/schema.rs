//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Shelf-Scout
//! checkpoint database.

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track collection sessions
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    stop_reason TEXT,
    page_limit INTEGER,
    pages_visited INTEGER NOT NULL DEFAULT 0,
    duplicates_dropped INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_sessions_status ON sessions(status);

-- Accumulated listings, checkpointed after every page
CREATE TABLE IF NOT EXISTS listings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL REFERENCES sessions(id),
    position INTEGER NOT NULL,
    identity_key TEXT NOT NULL,
    title TEXT NOT NULL,
    rating REAL NOT NULL,
    reviews INTEGER NOT NULL,
    price REAL NOT NULL,
    url TEXT,
    score REAL,
    UNIQUE(session_id, identity_key)
);

CREATE INDEX IF NOT EXISTS idx_listings_session ON listings(session_id);
"#;

/// Creates all tables and indexes if they do not exist
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
