//! In-memory stand-in for the comment persistence backend.
//!
//! The real backend is whatever the integrating application talks to; this
//! one keeps everything in a `Vec` and can be switched offline to exercise
//! the fetch-failure path.

use marginalia_engine::{BlockId, CommentBlockId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("comment backend unavailable")]
    Unavailable,
}

/// One stored comment, shaped like the record a backend would return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub comment_block_id: CommentBlockId,
    pub block_id: BlockId,
    pub content: String,
}

#[derive(Debug, Default)]
pub struct CommentStore {
    comments: Vec<Comment>,
    offline: bool,
}

impl CommentStore {
    pub fn new() -> Self {
        CommentStore::default()
    }

    /// Simulate the backend going away; subsequent fetches fail.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Persist a comment. A missing comment block id means this is the first
    /// comment on a fresh selection, so the store mints one, the same way a
    /// backend would. Returns the full thread the comment belongs to.
    pub fn save(
        &mut self,
        comment_block_id: Option<CommentBlockId>,
        block_id: BlockId,
        content: &str,
    ) -> Result<Vec<Comment>, StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable);
        }
        let comment_block_id =
            comment_block_id.unwrap_or_else(|| CommentBlockId::new(Uuid::new_v4().to_string()));
        self.comments.push(Comment {
            id: Uuid::new_v4().to_string(),
            comment_block_id: comment_block_id.clone(),
            block_id,
            content: content.to_string(),
        });
        self.list_by_block(&comment_block_id)
    }

    pub fn list_by_block(&self, id: &CommentBlockId) -> Result<Vec<Comment>, StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable);
        }
        Ok(self
            .comments
            .iter()
            .filter(|c| &c.comment_block_id == id)
            .cloned()
            .collect())
    }

    /// Delete every comment in a block, returning how many are left (always
    /// zero; shaped like the backend's delete response).
    pub fn delete_block(&mut self, id: &CommentBlockId) -> Result<usize, StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable);
        }
        self.comments.retain(|c| &c.comment_block_id != id);
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_save_mints_a_comment_block_id() {
        let mut store = CommentStore::new();
        let thread = store
            .save(None, BlockId::new("b1"), "first!")
            .unwrap();
        assert_eq!(thread.len(), 1);

        let id = thread[0].comment_block_id.clone();
        let thread = store
            .save(Some(id.clone()), BlockId::new("b1"), "second")
            .unwrap();
        assert_eq!(thread.len(), 2);
        assert!(thread.iter().all(|c| c.comment_block_id == id));
    }

    #[test]
    fn offline_store_fails_fetches() {
        let mut store = CommentStore::new();
        let thread = store.save(None, BlockId::new("b1"), "hi").unwrap();
        let id = thread[0].comment_block_id.clone();

        store.set_offline(true);
        assert!(store.list_by_block(&id).is_err());
    }

    #[test]
    fn delete_block_empties_the_thread() {
        let mut store = CommentStore::new();
        let thread = store.save(None, BlockId::new("b1"), "hi").unwrap();
        let id = thread[0].comment_block_id.clone();

        assert_eq!(store.delete_block(&id).unwrap(), 0);
        assert!(store.list_by_block(&id).unwrap().is_empty());
    }
}
