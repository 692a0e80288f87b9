//! Table and index DDL.

use crate::{Error, Result};
use rusqlite::Connection;

const TABLES: &str = "
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pages (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    icon TEXT NOT NULL,
    parent_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS blocks (
    id TEXT PRIMARY KEY,
    page_id TEXT NOT NULL,
    block_type TEXT NOT NULL,
    content TEXT NOT NULL,
    sort_order INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS nodes (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    node_type TEXT NOT NULL,
    tags TEXT NOT NULL,
    pos_x REAL NOT NULL,
    pos_y REAL NOT NULL,
    frequency TEXT NOT NULL,
    parent_id TEXT,
    merged_from TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    last_touched TEXT NOT NULL,
    archived INTEGER NOT NULL DEFAULT 0,
    archived_at TEXT,
    restored_at TEXT
);

CREATE TABLE IF NOT EXISTS archives (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    frequency TEXT NOT NULL,
    name TEXT NOT NULL,
    nodes TEXT NOT NULL,
    node_count INTEGER NOT NULL,
    type_counts TEXT NOT NULL,
    archived_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pattern_logs (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    frequency TEXT NOT NULL,
    action TEXT NOT NULL,
    affect TEXT NOT NULL,
    text TEXT NOT NULL,
    model TEXT NOT NULL,
    node_count INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
";

const INDEXES: &str = "
CREATE INDEX IF NOT EXISTS idx_pages_user ON pages(user_id);
CREATE INDEX IF NOT EXISTS idx_pages_parent ON pages(parent_id);
CREATE INDEX IF NOT EXISTS idx_blocks_page_order ON blocks(page_id, sort_order);
CREATE INDEX IF NOT EXISTS idx_nodes_owner_freq ON nodes(user_id, frequency, archived);
CREATE INDEX IF NOT EXISTS idx_archives_user ON archives(user_id, archived_at DESC);
CREATE INDEX IF NOT EXISTS idx_pattern_logs_user ON pattern_logs(user_id, created_at DESC);
";

/// Creates every table and index if missing.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(TABLES)
        .map_err(|e| Error::failed("create_tables", e))?;

    // Index creation failures only cost query speed
    if let Err(e) = conn.execute_batch(INDEXES) {
        tracing::warn!(error = %e, "Failed to create SQLite indexes");
    }
    Ok(())
}
