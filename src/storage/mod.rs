//! Storage layer.
//!
//! A single embedded `SQLite` database backs every collection: users, pages,
//! blocks, nodes, archive records and pattern logs.

pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStore;
pub use traits::{ArchiveStore, DocumentStore, NodeStore, PageStore, PatternStore, UserStore};
