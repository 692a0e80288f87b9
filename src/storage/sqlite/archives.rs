//! `ArchiveStore` and `PatternStore` for `SQLite`.

use super::rows::{ARCHIVE_COLUMNS, PATTERN_COLUMNS, archive_from_row, json, pattern_from_row, ts};
use super::{SqliteStore, sql_err};
use crate::models::{ArchiveRecord, PatternLog};
use crate::storage::traits::{ArchiveStore, PatternStore};
use crate::{Error, Result};
use rusqlite::{OptionalExtension, params};
use tracing::instrument;

fn count_to_sql(count: usize) -> Result<i64> {
    i64::try_from(count).map_err(|e| Error::failed("encode_count", e))
}

impl ArchiveStore for SqliteStore {
    #[instrument(skip(self, record), fields(operation = "insert_archive", backend = "sqlite", archive.id = %record.id))]
    fn insert_archive(&self, record: &ArchiveRecord) -> Result<()> {
        let nodes = json(&record.nodes)?;
        let type_counts = json(&record.type_counts)?;
        let node_count = count_to_sql(record.node_count)?;
        self.with_conn("insert_archive", |conn| {
            conn.execute(
                "INSERT INTO archives (id, user_id, frequency, name, nodes, node_count, type_counts, archived_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    record.user_id,
                    record.frequency.as_str(),
                    record.name,
                    nodes,
                    node_count,
                    type_counts,
                    ts(&record.archived_at)
                ],
            )
            .map_err(sql_err("insert_archive"))?;
            Ok(())
        })
    }

    #[instrument(skip(self), fields(operation = "get_archive", backend = "sqlite"))]
    fn get_archive(&self, id: &str) -> Result<Option<ArchiveRecord>> {
        self.with_conn("get_archive", |conn| {
            conn.query_row(
                &format!("SELECT {ARCHIVE_COLUMNS} FROM archives WHERE id = ?1"),
                params![id],
                archive_from_row,
            )
            .optional()
            .map_err(sql_err("get_archive"))
        })
    }

    #[instrument(skip(self), fields(operation = "list_archives", backend = "sqlite"))]
    fn list_archives(&self, user_id: &str) -> Result<Vec<ArchiveRecord>> {
        self.with_conn("list_archives", |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {ARCHIVE_COLUMNS} FROM archives WHERE user_id = ?1 ORDER BY archived_at DESC"
                ))
                .map_err(sql_err("list_archives"))?;
            let rows = stmt
                .query_map(params![user_id], archive_from_row)
                .map_err(sql_err("list_archives"))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_err("list_archives"))
        })
    }
}

impl PatternStore for SqliteStore {
    #[instrument(skip(self, log), fields(operation = "append_pattern", backend = "sqlite"))]
    fn append_pattern(&self, log: &PatternLog) -> Result<()> {
        let node_count = count_to_sql(log.node_count)?;
        self.with_conn("append_pattern", |conn| {
            conn.execute(
                "INSERT INTO pattern_logs (id, user_id, frequency, action, affect, text, model, node_count, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    log.id,
                    log.user_id,
                    log.frequency.as_str(),
                    log.action.as_str(),
                    log.affect.as_str(),
                    log.text,
                    log.model,
                    node_count,
                    ts(&log.created_at)
                ],
            )
            .map_err(sql_err("append_pattern"))?;
            Ok(())
        })
    }

    #[instrument(skip(self), fields(operation = "recent_patterns", backend = "sqlite"))]
    fn recent_patterns(&self, user_id: &str, limit: usize) -> Result<Vec<PatternLog>> {
        let limit = count_to_sql(limit)?;
        self.with_conn("recent_patterns", |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {PATTERN_COLUMNS} FROM pattern_logs
                     WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2"
                ))
                .map_err(sql_err("recent_patterns"))?;
            let rows = stmt
                .query_map(params![user_id, limit], pattern_from_row)
                .map_err(sql_err("recent_patterns"))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_err("recent_patterns"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, Affect, Frequency, Node, NodeType, Position};
    use chrono::{Duration, Utc};
    use std::collections::BTreeMap;

    fn log(user: &str, text: &str, offset_secs: i64) -> PatternLog {
        PatternLog {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.to_string(),
            frequency: Frequency::Focus,
            action: Action::Create,
            affect: Affect::Flow,
            text: text.to_string(),
            model: "hermes".to_string(),
            node_count: 1,
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn test_archive_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        let node = Node::new("u1", "Alpha", NodeType::Ritual, Frequency::Dream, Position::ORIGIN);
        let record = ArchiveRecord {
            id: "a1".to_string(),
            user_id: "u1".to_string(),
            frequency: Frequency::Dream,
            name: "Alpha".to_string(),
            nodes: vec![node],
            node_count: 1,
            type_counts: BTreeMap::from([(NodeType::Ritual, 1)]),
            archived_at: Utc::now(),
        };
        store.insert_archive(&record).unwrap();

        assert_eq!(store.get_archive("a1").unwrap(), Some(record));
        assert_eq!(store.list_archives("u1").unwrap().len(), 1);
        assert!(store.list_archives("u2").unwrap().is_empty());
    }

    #[test]
    fn test_recent_patterns_newest_first_and_limited() {
        let store = SqliteStore::in_memory().unwrap();
        store.append_pattern(&log("u1", "first", 0)).unwrap();
        store.append_pattern(&log("u1", "second", 1)).unwrap();
        store.append_pattern(&log("u1", "third", 2)).unwrap();
        store.append_pattern(&log("u2", "other", 3)).unwrap();

        let recent = store.recent_patterns("u1", 2).unwrap();
        let texts: Vec<&str> = recent.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["third", "second"]);
    }
}
