use crate::domain::value_objects::{BookId, UserId, WishlistEntryId};
use crate::domain::wishlist::WishlistEntry;
use async_trait::async_trait;

use super::Result;

/// ウィッシュリストリポジトリポート
#[async_trait]
pub trait WishlistRepository: Send + Sync {
    /// 利用者・書籍の項目を取得する
    async fn find(&self, user_id: UserId, book_id: BookId) -> Result<Option<WishlistEntry>>;

    /// 項目を追加する
    ///
    /// 同じ(user_id, book_id)が既にある場合は`false`を返し、何もしない。
    async fn insert(&self, entry: &WishlistEntry) -> Result<bool>;

    /// IDで項目を削除する
    async fn delete(&self, entry_id: WishlistEntryId) -> Result<()>;

    /// 利用者・書籍の項目をすべて削除し、削除件数を返す
    async fn delete_for(&self, user_id: UserId, book_id: BookId) -> Result<u64>;

    /// 利用者の全項目（追加日時の新しい順）
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<WishlistEntry>>;
}
