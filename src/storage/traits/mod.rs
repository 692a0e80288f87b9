//! Storage traits for the document collections.
//!
//! Every collection is owner-scoped at the service layer; the store itself
//! only knows how to read and write rows. Services hold the store as
//! `Arc<dyn DocumentStore>`.

use crate::Result;
use crate::models::{ArchiveRecord, Block, Frequency, Node, NodeId, Page, PatternLog, User};
use chrono::{DateTime, Utc};

/// Registered accounts.
pub trait UserStore: Send + Sync {
    /// Inserts a user. Fails with [`crate::Error::InvalidInput`] if the email is taken.
    fn insert_user(&self, user: &User) -> Result<()>;

    /// Retrieves a user by ID.
    fn get_user(&self, id: &str) -> Result<Option<User>>;

    /// Retrieves a user by email (exact match on the stored lowercase form).
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
}

/// Editor pages and their blocks.
pub trait PageStore: Send + Sync {
    /// Inserts or replaces a page.
    fn save_page(&self, page: &Page) -> Result<()>;

    /// Retrieves a page by ID.
    fn get_page(&self, id: &str) -> Result<Option<Page>>;

    /// Lists pages owned by a user, oldest first.
    fn list_pages(&self, user_id: &str) -> Result<Vec<Page>>;

    /// Lists direct children of a page.
    fn list_child_pages(&self, parent_id: &str) -> Result<Vec<Page>>;

    /// Deletes a page and its blocks. Returns false if the page did not exist.
    fn delete_page(&self, id: &str) -> Result<bool>;

    /// Inserts or replaces a block.
    fn save_block(&self, block: &Block) -> Result<()>;

    /// Retrieves a block by ID.
    fn get_block(&self, id: &str) -> Result<Option<Block>>;

    /// Lists blocks of a page ordered by `order` ascending.
    fn list_blocks(&self, page_id: &str) -> Result<Vec<Block>>;

    /// Deletes a block. Returns false if it did not exist.
    fn delete_block(&self, id: &str) -> Result<bool>;
}

/// Canvas nodes.
pub trait NodeStore: Send + Sync {
    /// Inserts or replaces a node.
    fn upsert_node(&self, node: &Node) -> Result<()>;

    /// Retrieves a node by ID, archived or not.
    fn get_node(&self, id: &NodeId) -> Result<Option<Node>>;

    /// Lists a user's nodes, optionally narrowed to one frequency.
    fn list_nodes(
        &self,
        user_id: &str,
        frequency: Option<Frequency>,
        include_archived: bool,
    ) -> Result<Vec<Node>>;

    /// Deletes a node. Returns false if it did not exist.
    fn delete_node(&self, id: &NodeId) -> Result<bool>;

    /// Flags the given nodes archived. Returns the number of rows changed.
    fn mark_archived(&self, ids: &[NodeId], at: DateTime<Utc>) -> Result<usize>;

    /// Lists live nodes of a user in one frequency.
    fn list_live_nodes(&self, user_id: &str, frequency: Frequency) -> Result<Vec<Node>> {
        self.list_nodes(user_id, Some(frequency), false)
    }
}

/// Archive snapshots.
pub trait ArchiveStore: Send + Sync {
    /// Writes a new archive record.
    fn insert_archive(&self, record: &ArchiveRecord) -> Result<()>;

    /// Retrieves an archive by ID.
    fn get_archive(&self, id: &str) -> Result<Option<ArchiveRecord>>;

    /// Lists a user's archives, newest first.
    fn list_archives(&self, user_id: &str) -> Result<Vec<ArchiveRecord>>;
}

/// Conversation telemetry.
pub trait PatternStore: Send + Sync {
    /// Appends a log entry.
    fn append_pattern(&self, log: &PatternLog) -> Result<()>;

    /// Returns the `limit` most recent entries of a user, newest first.
    fn recent_patterns(&self, user_id: &str, limit: usize) -> Result<Vec<PatternLog>>;
}

/// Every collection the application needs.
pub trait DocumentStore: UserStore + PageStore + NodeStore + ArchiveStore + PatternStore {}

impl<T> DocumentStore for T where T: UserStore + PageStore + NodeStore + ArchiveStore + PatternStore {}
