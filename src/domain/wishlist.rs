use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, UserId, WishlistEntryId};

/// ウィッシュリスト項目 - 利用者がある書籍に興味を持っていることを示す
///
/// 貸出状態とは独立。(user_id, book_id) は一意。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub entry_id: WishlistEntryId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub created_at: DateTime<Utc>,
}

impl WishlistEntry {
    pub fn new(user_id: UserId, book_id: BookId, created_at: DateTime<Utc>) -> Self {
        Self {
            entry_id: WishlistEntryId::new(),
            user_id,
            book_id,
            created_at,
        }
    }
}

/// トグル操作の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WishlistChange {
    Added,
    Removed,
}
