//! `NodeStore` for `SQLite`.

use super::connection::in_transaction;
use super::rows::{NODE_COLUMNS, json, node_from_row, opt_ts, ts};
use super::{SqliteStore, sql_err};
use crate::Result;
use crate::models::{Frequency, Node, NodeId};
use crate::storage::traits::NodeStore;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use tracing::instrument;

impl NodeStore for SqliteStore {
    #[instrument(skip(self, node), fields(operation = "upsert_node", backend = "sqlite", node.id = %node.id))]
    fn upsert_node(&self, node: &Node) -> Result<()> {
        let tags = json(&node.tags)?;
        let merged_from = json(&node.merged_from)?;
        self.with_conn("upsert_node", |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO nodes (id, user_id, title, content, node_type, tags, pos_x, pos_y,
                    frequency, parent_id, merged_from, created_at, updated_at, last_touched, archived,
                    archived_at, restored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                params![
                    node.id.as_str(),
                    node.user_id,
                    node.title,
                    node.content,
                    node.node_type.as_str(),
                    tags,
                    node.position.x,
                    node.position.y,
                    node.frequency.as_str(),
                    node.parent_id.as_ref().map(NodeId::as_str),
                    merged_from,
                    ts(&node.created_at),
                    ts(&node.updated_at),
                    ts(&node.last_touched),
                    node.archived,
                    opt_ts(node.archived_at.as_ref()),
                    opt_ts(node.restored_at.as_ref()),
                ],
            )
            .map_err(sql_err("upsert_node"))?;
            Ok(())
        })
    }

    #[instrument(skip(self), fields(operation = "get_node", backend = "sqlite", node.id = %id))]
    fn get_node(&self, id: &NodeId) -> Result<Option<Node>> {
        self.with_conn("get_node", |conn| {
            conn.query_row(
                &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1"),
                params![id.as_str()],
                node_from_row,
            )
            .optional()
            .map_err(sql_err("get_node"))
        })
    }

    #[instrument(skip(self), fields(operation = "list_nodes", backend = "sqlite"))]
    fn list_nodes(
        &self,
        user_id: &str,
        frequency: Option<Frequency>,
        include_archived: bool,
    ) -> Result<Vec<Node>> {
        self.with_conn("list_nodes", |conn| {
            let sql = format!(
                "SELECT {NODE_COLUMNS} FROM nodes
                 WHERE user_id = ?1
                   AND (?2 IS NULL OR frequency = ?2)
                   AND (?3 OR archived = 0)
                 ORDER BY created_at, id"
            );
            let mut stmt = conn.prepare(&sql).map_err(sql_err("list_nodes"))?;
            let rows = stmt
                .query_map(
                    params![user_id, frequency.map(|f| f.as_str()), include_archived],
                    node_from_row,
                )
                .map_err(sql_err("list_nodes"))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_err("list_nodes"))
        })
    }

    #[instrument(skip(self), fields(operation = "delete_node", backend = "sqlite", node.id = %id))]
    fn delete_node(&self, id: &NodeId) -> Result<bool> {
        self.with_conn("delete_node", |conn| {
            let removed = conn
                .execute("DELETE FROM nodes WHERE id = ?1", params![id.as_str()])
                .map_err(sql_err("delete_node"))?;
            Ok(removed > 0)
        })
    }

    #[instrument(skip(self, ids), fields(operation = "mark_archived", backend = "sqlite", count = ids.len()))]
    fn mark_archived(&self, ids: &[NodeId], at: DateTime<Utc>) -> Result<usize> {
        let stamp = ts(&at);
        self.with_conn("mark_archived", |conn| {
            in_transaction(conn, || {
                let mut stmt = conn
                    .prepare(
                        "UPDATE nodes SET archived = 1, archived_at = ?2, updated_at = ?2
                         WHERE id = ?1",
                    )
                    .map_err(sql_err("mark_archived"))?;
                let mut changed = 0;
                for id in ids {
                    changed += stmt
                        .execute(params![id.as_str(), stamp])
                        .map_err(sql_err("mark_archived"))?;
                }
                Ok(changed)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeType, Position};

    fn node(user: &str, title: &str, frequency: Frequency) -> Node {
        Node::new(user, title, NodeType::Thought, frequency, Position::ORIGIN)
    }

    #[test]
    fn test_upsert_and_get_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        let mut n = node("u1", "Morning Anchor", Frequency::Reflect);
        n.tags = vec!["calm".to_string()];
        n.parent_id = Some(NodeId::new("parent"));
        n.merged_from = vec![NodeId::new("a"), NodeId::new("b")];
        n.position = Position::new(612.0, 388.0);
        store.upsert_node(&n).unwrap();

        assert_eq!(store.get_node(&n.id).unwrap(), Some(n));
    }

    #[test]
    fn test_list_filters_owner_frequency_and_archived() {
        let store = SqliteStore::in_memory().unwrap();
        let a = node("u1", "Alpha", Frequency::Reflect);
        let b = node("u1", "Beta", Frequency::Focus);
        let c = node("u2", "Gamma", Frequency::Reflect);
        let mut d = node("u1", "Delta", Frequency::Reflect);
        d.archived = true;
        for n in [&a, &b, &c, &d] {
            store.upsert_node(n).unwrap();
        }

        assert_eq!(store.list_nodes("u1", None, false).unwrap().len(), 2);
        assert_eq!(store.list_nodes("u1", None, true).unwrap().len(), 3);
        let reflect = store.list_live_nodes("u1", Frequency::Reflect).unwrap();
        assert_eq!(reflect.len(), 1);
        assert_eq!(reflect[0].title, "Alpha");
    }

    #[test]
    fn test_mark_archived() {
        let store = SqliteStore::in_memory().unwrap();
        let a = node("u1", "Alpha", Frequency::Dream);
        let b = node("u1", "Beta", Frequency::Dream);
        store.upsert_node(&a).unwrap();
        store.upsert_node(&b).unwrap();

        let changed = store
            .mark_archived(&[a.id.clone(), NodeId::new("missing")], Utc::now())
            .unwrap();
        assert_eq!(changed, 1);

        let stored = store.get_node(&a.id).unwrap().unwrap();
        assert!(stored.archived);
        assert!(stored.archived_at.is_some());
        assert!(!store.get_node(&b.id).unwrap().unwrap().archived);
    }

    #[test]
    fn test_delete_node() {
        let store = SqliteStore::in_memory().unwrap();
        let a = node("u1", "Alpha", Frequency::Focus);
        store.upsert_node(&a).unwrap();
        assert!(store.delete_node(&a.id).unwrap());
        assert!(!store.delete_node(&a.id).unwrap());
    }
}
