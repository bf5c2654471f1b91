use crate::domain::value_objects::{BookId, UserId, WishlistEntryId};
use crate::domain::wishlist::WishlistEntry;
use crate::ports::wishlist_repository::WishlistRepository as WishlistRepositoryTrait;
use crate::ports::Result;
use async_trait::async_trait;
use std::sync::Mutex;

use super::poisoned;

/// WishlistRepositoryのメモリ実装
pub struct WishlistRepository {
    entries: Mutex<Vec<WishlistEntry>>,
}

impl WishlistRepository {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl Default for WishlistRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WishlistRepositoryTrait for WishlistRepository {
    async fn find(&self, user_id: UserId, book_id: BookId) -> Result<Option<WishlistEntry>> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries
            .iter()
            .find(|e| e.user_id == user_id && e.book_id == book_id)
            .cloned())
    }

    async fn insert(&self, entry: &WishlistEntry) -> Result<bool> {
        let mut entries = self.entries.lock().map_err(poisoned)?;

        if entries
            .iter()
            .any(|e| e.user_id == entry.user_id && e.book_id == entry.book_id)
        {
            return Ok(false);
        }

        entries.push(entry.clone());
        Ok(true)
    }

    async fn delete(&self, entry_id: WishlistEntryId) -> Result<()> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.retain(|e| e.entry_id != entry_id);
        Ok(())
    }

    async fn delete_for(&self, user_id: UserId, book_id: BookId) -> Result<u64> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        let before = entries.len();
        entries.retain(|e| !(e.user_id == user_id && e.book_id == book_id));
        Ok((before - entries.len()) as u64)
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<WishlistEntry>> {
        let entries = self.entries.lock().map_err(poisoned)?;
        let mut found: Vec<WishlistEntry> = entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}
