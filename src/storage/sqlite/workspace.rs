//! `PageStore` for `SQLite`.

use super::connection::in_transaction;
use super::rows::{BLOCK_COLUMNS, PAGE_COLUMNS, block_from_row, json, page_from_row, ts};
use super::{SqliteStore, sql_err};
use crate::Result;
use crate::models::{Block, Page};
use crate::storage::traits::PageStore;
use rusqlite::{OptionalExtension, params};
use tracing::instrument;

impl PageStore for SqliteStore {
    #[instrument(skip(self, page), fields(operation = "save_page", backend = "sqlite", page.id = %page.id))]
    fn save_page(&self, page: &Page) -> Result<()> {
        self.with_conn("save_page", |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO pages (id, user_id, title, icon, parent_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    page.id,
                    page.user_id,
                    page.title,
                    page.icon,
                    page.parent_id,
                    ts(&page.created_at),
                    ts(&page.updated_at)
                ],
            )
            .map_err(sql_err("save_page"))?;
            Ok(())
        })
    }

    #[instrument(skip(self), fields(operation = "get_page", backend = "sqlite"))]
    fn get_page(&self, id: &str) -> Result<Option<Page>> {
        self.with_conn("get_page", |conn| {
            conn.query_row(
                &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = ?1"),
                params![id],
                page_from_row,
            )
            .optional()
            .map_err(sql_err("get_page"))
        })
    }

    #[instrument(skip(self), fields(operation = "list_pages", backend = "sqlite"))]
    fn list_pages(&self, user_id: &str) -> Result<Vec<Page>> {
        self.with_conn("list_pages", |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {PAGE_COLUMNS} FROM pages WHERE user_id = ?1 ORDER BY created_at, id"
                ))
                .map_err(sql_err("list_pages"))?;
            let rows = stmt
                .query_map(params![user_id], page_from_row)
                .map_err(sql_err("list_pages"))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_err("list_pages"))
        })
    }

    #[instrument(skip(self), fields(operation = "list_child_pages", backend = "sqlite"))]
    fn list_child_pages(&self, parent_id: &str) -> Result<Vec<Page>> {
        self.with_conn("list_child_pages", |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {PAGE_COLUMNS} FROM pages WHERE parent_id = ?1 ORDER BY created_at, id"
                ))
                .map_err(sql_err("list_child_pages"))?;
            let rows = stmt
                .query_map(params![parent_id], page_from_row)
                .map_err(sql_err("list_child_pages"))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_err("list_child_pages"))
        })
    }

    #[instrument(skip(self), fields(operation = "delete_page", backend = "sqlite"))]
    fn delete_page(&self, id: &str) -> Result<bool> {
        self.with_conn("delete_page", |conn| {
            in_transaction(conn, || {
                conn.execute("DELETE FROM blocks WHERE page_id = ?1", params![id])
                    .map_err(sql_err("delete_page_blocks"))?;
                let removed = conn
                    .execute("DELETE FROM pages WHERE id = ?1", params![id])
                    .map_err(sql_err("delete_page"))?;
                Ok(removed > 0)
            })
        })
    }

    #[instrument(skip(self, block), fields(operation = "save_block", backend = "sqlite", block.id = %block.id))]
    fn save_block(&self, block: &Block) -> Result<()> {
        let content = json(&block.content)?;
        self.with_conn("save_block", |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO blocks (id, page_id, block_type, content, sort_order, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    block.id,
                    block.page_id,
                    block.block_type,
                    content,
                    block.order,
                    ts(&block.created_at),
                    ts(&block.updated_at)
                ],
            )
            .map_err(sql_err("save_block"))?;
            Ok(())
        })
    }

    #[instrument(skip(self), fields(operation = "get_block", backend = "sqlite"))]
    fn get_block(&self, id: &str) -> Result<Option<Block>> {
        self.with_conn("get_block", |conn| {
            conn.query_row(
                &format!("SELECT {BLOCK_COLUMNS} FROM blocks WHERE id = ?1"),
                params![id],
                block_from_row,
            )
            .optional()
            .map_err(sql_err("get_block"))
        })
    }

    #[instrument(skip(self), fields(operation = "list_blocks", backend = "sqlite"))]
    fn list_blocks(&self, page_id: &str) -> Result<Vec<Block>> {
        self.with_conn("list_blocks", |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {BLOCK_COLUMNS} FROM blocks WHERE page_id = ?1 ORDER BY sort_order, created_at"
                ))
                .map_err(sql_err("list_blocks"))?;
            let rows = stmt
                .query_map(params![page_id], block_from_row)
                .map_err(sql_err("list_blocks"))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_err("list_blocks"))
        })
    }

    #[instrument(skip(self), fields(operation = "delete_block", backend = "sqlite"))]
    fn delete_block(&self, id: &str) -> Result<bool> {
        self.with_conn("delete_block", |conn| {
            let removed = conn
                .execute("DELETE FROM blocks WHERE id = ?1", params![id])
                .map_err(sql_err("delete_block"))?;
            Ok(removed > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn page(id: &str, user: &str, parent: Option<&str>) -> Page {
        let now = Utc::now();
        Page {
            id: id.to_string(),
            user_id: user.to_string(),
            title: "Untitled".to_string(),
            icon: "📄".to_string(),
            parent_id: parent.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn block(id: &str, page_id: &str, order: i64) -> Block {
        let now = Utc::now();
        Block {
            id: id.to_string(),
            page_id: page_id.to_string(),
            block_type: "text".to_string(),
            content: json!({ "text": id }),
            order,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_page_roundtrip_and_listing() {
        let store = SqliteStore::in_memory().unwrap();
        let p = page("p1", "u1", None);
        store.save_page(&p).unwrap();
        store.save_page(&page("p2", "u2", None)).unwrap();

        assert_eq!(store.get_page("p1").unwrap(), Some(p));
        let listed = store.list_pages("u1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "p1");
    }

    #[test]
    fn test_blocks_ordered_by_order() {
        let store = SqliteStore::in_memory().unwrap();
        store.save_page(&page("p1", "u1", None)).unwrap();
        store.save_block(&block("b3", "p1", 3)).unwrap();
        store.save_block(&block("b1", "p1", 1)).unwrap();
        store.save_block(&block("b2", "p1", 2)).unwrap();

        let ids: Vec<String> = store
            .list_blocks("p1")
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["b1", "b2", "b3"]);
        assert_eq!(store.get_block("b1").unwrap().unwrap().content, json!({"text": "b1"}));
    }

    #[test]
    fn test_delete_page_removes_blocks() {
        let store = SqliteStore::in_memory().unwrap();
        store.save_page(&page("p1", "u1", None)).unwrap();
        store.save_block(&block("b1", "p1", 0)).unwrap();

        assert!(store.delete_page("p1").unwrap());
        assert!(store.get_block("b1").unwrap().is_none());
        assert!(!store.delete_page("p1").unwrap());
    }

    #[test]
    fn test_list_child_pages() {
        let store = SqliteStore::in_memory().unwrap();
        store.save_page(&page("root", "u1", None)).unwrap();
        store.save_page(&page("child", "u1", Some("root"))).unwrap();

        let children = store.list_child_pages("root").unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, "child");
    }
}
