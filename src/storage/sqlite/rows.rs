//! Column encoding and row conversion.
//!
//! Timestamps are stored as RFC 3339 text with nanosecond precision and a
//! `Z` suffix, which sorts lexicographically in time order. Lists and maps
//! are stored as JSON text.

use crate::models::{
    Action, Affect, ArchiveRecord, Block, Frequency, Node, NodeId, NodeType, Page, PatternLog,
    Position, User,
};
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
#[error("invalid stored value: {0}")]
struct InvalidColumn(String);

fn invalid(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(InvalidColumn(msg)))
}

/// Encodes a timestamp for storage.
pub fn ts(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Encodes an optional timestamp for storage.
pub fn opt_ts(value: Option<&DateTime<Utc>>) -> Option<String> {
    value.map(ts)
}

/// Encodes any serializable value as JSON text.
pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::failed("encode_json_column", e))
}

fn get_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| invalid(idx, format!("timestamp {raw}: {e}")))
}

fn get_opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| invalid(idx, format!("timestamp {raw}: {e}")))
    })
    .transpose()
}

fn get_json<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| invalid(idx, format!("json: {e}")))
}

fn get_enum<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| invalid(idx, format!("enum value {raw}")))
}

fn get_count(row: &Row<'_>, idx: usize) -> rusqlite::Result<usize> {
    let raw: i64 = row.get(idx)?;
    usize::try_from(raw).map_err(|_| invalid(idx, format!("count {raw}")))
}

/// Column list matching [`user_from_row`].
pub const USER_COLUMNS: &str = "id, email, name, password_hash, created_at";

/// Builds a [`User`] from a row selected with [`USER_COLUMNS`].
pub fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: get_ts(row, 4)?,
    })
}

/// Column list matching [`page_from_row`].
pub const PAGE_COLUMNS: &str = "id, user_id, title, icon, parent_id, created_at, updated_at";

/// Builds a [`Page`] from a row selected with [`PAGE_COLUMNS`].
pub fn page_from_row(row: &Row<'_>) -> rusqlite::Result<Page> {
    Ok(Page {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        icon: row.get(3)?,
        parent_id: row.get(4)?,
        created_at: get_ts(row, 5)?,
        updated_at: get_ts(row, 6)?,
    })
}

/// Column list matching [`block_from_row`].
pub const BLOCK_COLUMNS: &str =
    "id, page_id, block_type, content, sort_order, created_at, updated_at";

/// Builds a [`Block`] from a row selected with [`BLOCK_COLUMNS`].
pub fn block_from_row(row: &Row<'_>) -> rusqlite::Result<Block> {
    Ok(Block {
        id: row.get(0)?,
        page_id: row.get(1)?,
        block_type: row.get(2)?,
        content: get_json(row, 3)?,
        order: row.get(4)?,
        created_at: get_ts(row, 5)?,
        updated_at: get_ts(row, 6)?,
    })
}

/// Column list matching [`node_from_row`].
pub const NODE_COLUMNS: &str = "id, user_id, title, content, node_type, tags, pos_x, pos_y, \
     frequency, parent_id, merged_from, created_at, updated_at, last_touched, archived, \
     archived_at, restored_at";

/// Builds a [`Node`] from a row selected with [`NODE_COLUMNS`].
pub fn node_from_row(row: &Row<'_>) -> rusqlite::Result<Node> {
    let id: String = row.get(0)?;
    let parent_id: Option<String> = row.get(9)?;
    let merged_from: Vec<String> = get_json(row, 10)?;
    Ok(Node {
        id: NodeId::new(id),
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        node_type: get_enum(row, 4, NodeType::parse)?,
        tags: get_json(row, 5)?,
        position: Position::new(row.get(6)?, row.get(7)?),
        frequency: get_enum(row, 8, Frequency::parse)?,
        parent_id: parent_id.map(NodeId::new),
        merged_from: merged_from.into_iter().map(NodeId::new).collect(),
        created_at: get_ts(row, 11)?,
        updated_at: get_ts(row, 12)?,
        last_touched: get_ts(row, 13)?,
        archived: row.get(14)?,
        archived_at: get_opt_ts(row, 15)?,
        restored_at: get_opt_ts(row, 16)?,
    })
}

/// Column list matching [`archive_from_row`].
pub const ARCHIVE_COLUMNS: &str =
    "id, user_id, frequency, name, nodes, node_count, type_counts, archived_at";

/// Builds an [`ArchiveRecord`] from a row selected with [`ARCHIVE_COLUMNS`].
pub fn archive_from_row(row: &Row<'_>) -> rusqlite::Result<ArchiveRecord> {
    Ok(ArchiveRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        frequency: get_enum(row, 2, Frequency::parse)?,
        name: row.get(3)?,
        nodes: get_json(row, 4)?,
        node_count: get_count(row, 5)?,
        type_counts: get_json(row, 6)?,
        archived_at: get_ts(row, 7)?,
    })
}

/// Column list matching [`pattern_from_row`].
pub const PATTERN_COLUMNS: &str =
    "id, user_id, frequency, action, affect, text, model, node_count, created_at";

/// Builds a [`PatternLog`] from a row selected with [`PATTERN_COLUMNS`].
pub fn pattern_from_row(row: &Row<'_>) -> rusqlite::Result<PatternLog> {
    Ok(PatternLog {
        id: row.get(0)?,
        user_id: row.get(1)?,
        frequency: get_enum(row, 2, Frequency::parse)?,
        action: get_enum(row, 3, Action::parse)?,
        affect: get_enum(row, 4, Affect::parse)?,
        text: row.get(5)?,
        model: row.get(6)?,
        node_count: get_count(row, 7)?,
        created_at: get_ts(row, 8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_encoding_sorts_in_time_order() {
        let earlier = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let later = earlier + chrono::Duration::nanoseconds(1);
        assert!(ts(&earlier) < ts(&later));
        assert!(ts(&earlier).ends_with('Z'));
    }
}
