//! Pages and blocks of the document editor.
//!
//! Pages are owner-scoped: a foreign page reads as missing. Blocks carry no
//! owner of their own and inherit it from their page, so a block whose page
//! belongs to someone else is forbidden rather than missing.

use crate::models::{Block, BlockPatch, NewBlock, NewPage, Page, PagePatch};
use crate::storage::DocumentStore;
use crate::{Error, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

/// Service for pages and their blocks.
#[derive(Clone)]
pub struct PageService {
    store: Arc<dyn DocumentStore>,
}

impl PageService {
    /// Creates a new page service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Creates a page.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn create_page(&self, user_id: &str, new: NewPage) -> Result<Page> {
        let now = Utc::now();
        let page = Page {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: new.title,
            icon: new.icon,
            parent_id: new.parent_id,
            created_at: now,
            updated_at: now,
        };
        self.store.save_page(&page)?;
        Ok(page)
    }

    /// Lists the caller's pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn list_pages(&self, user_id: &str) -> Result<Vec<Page>> {
        self.store.list_pages(user_id)
    }

    /// Fetches one of the caller's pages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when absent or foreign.
    pub fn get_page(&self, user_id: &str, page_id: &str) -> Result<Page> {
        self.store
            .get_page(page_id)?
            .filter(|p| p.user_id == user_id)
            .ok_or_else(|| Error::NotFound("Page not found".to_string()))
    }

    /// Applies the provided fields and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when absent or foreign.
    pub fn update_page(&self, user_id: &str, page_id: &str, patch: PagePatch) -> Result<Page> {
        let mut page = self.get_page(user_id, page_id)?;
        if let Some(title) = patch.title {
            page.title = title;
        }
        if let Some(icon) = patch.icon {
            page.icon = icon;
        }
        if let Some(parent_id) = patch.parent_id {
            page.parent_id = Some(parent_id);
        }
        page.updated_at = Utc::now();
        self.store.save_page(&page)?;
        Ok(page)
    }

    /// Deletes a page, its blocks, and its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when absent or foreign.
    #[instrument(skip(self), fields(operation = "delete_page"))]
    pub fn delete_page(&self, user_id: &str, page_id: &str) -> Result<()> {
        let root = self.get_page(user_id, page_id)?;

        let mut pending = vec![root.id];
        let mut deleted = 0usize;
        while let Some(id) = pending.pop() {
            pending.extend(
                self.store
                    .list_child_pages(&id)?
                    .into_iter()
                    .filter(|child| child.user_id == user_id)
                    .map(|child| child.id),
            );
            if self.store.delete_page(&id)? {
                deleted += 1;
            }
        }

        tracing::debug!(deleted, "Deleted page tree");
        Ok(())
    }

    /// Creates a block on one of the caller's pages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the page is absent or foreign.
    pub fn create_block(&self, user_id: &str, new: NewBlock) -> Result<Block> {
        let page = self.get_page(user_id, &new.page_id)?;
        let now = Utc::now();
        let block = Block {
            id: uuid::Uuid::new_v4().to_string(),
            page_id: page.id,
            block_type: new.block_type,
            content: new.content,
            order: new.order,
            created_at: now,
            updated_at: now,
        };
        self.store.save_block(&block)?;
        Ok(block)
    }

    /// Lists a page's blocks by ascending `order`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the page is absent or foreign.
    pub fn list_blocks(&self, user_id: &str, page_id: &str) -> Result<Vec<Block>> {
        let page = self.get_page(user_id, page_id)?;
        self.store.list_blocks(&page.id)
    }

    /// Applies the provided fields and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the block is absent and
    /// [`Error::Forbidden`] when its page is not the caller's.
    pub fn update_block(&self, user_id: &str, block_id: &str, patch: BlockPatch) -> Result<Block> {
        let mut block = self.owned_block(user_id, block_id)?;
        if let Some(block_type) = patch.block_type {
            block.block_type = block_type;
        }
        if let Some(content) = patch.content {
            block.content = content;
        }
        if let Some(order) = patch.order {
            block.order = order;
        }
        block.updated_at = Utc::now();
        self.store.save_block(&block)?;
        Ok(block)
    }

    /// Deletes a block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the block is absent and
    /// [`Error::Forbidden`] when its page is not the caller's.
    pub fn delete_block(&self, user_id: &str, block_id: &str) -> Result<()> {
        let block = self.owned_block(user_id, block_id)?;
        self.store.delete_block(&block.id)?;
        Ok(())
    }

    fn owned_block(&self, user_id: &str, block_id: &str) -> Result<Block> {
        let block = self
            .store
            .get_block(block_id)?
            .ok_or_else(|| Error::NotFound("Block not found".to_string()))?;

        let owned = self
            .store
            .get_page(&block.page_id)?
            .is_some_and(|p| p.user_id == user_id);
        if !owned {
            return Err(Error::Forbidden("Unauthorized".to_string()));
        }
        Ok(block)
    }
}
