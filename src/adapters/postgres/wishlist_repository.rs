use crate::domain::value_objects::{BookId, UserId, WishlistEntryId};
use crate::domain::wishlist::WishlistEntry;
use crate::ports::wishlist_repository::WishlistRepository as WishlistRepositoryTrait;
use crate::ports::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

fn map_row_to_entry(row: &PgRow) -> WishlistEntry {
    WishlistEntry {
        entry_id: WishlistEntryId::from_uuid(row.get("entry_id")),
        user_id: UserId::from_uuid(row.get("user_id")),
        book_id: BookId::from_uuid(row.get("book_id")),
        created_at: row.get("created_at"),
    }
}

/// WishlistRepositoryのPostgreSQL実装
///
/// (user_id, book_id)の一意性は`wishlist_entries_user_book_key`で保証する。
pub struct WishlistRepository {
    pool: PgPool,
}

impl WishlistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WishlistRepositoryTrait for WishlistRepository {
    async fn find(&self, user_id: UserId, book_id: BookId) -> Result<Option<WishlistEntry>> {
        let row = sqlx::query(
            r#"
            SELECT entry_id, user_id, book_id, created_at
            FROM wishlist_entries
            WHERE user_id = $1 AND book_id = $2
            "#,
        )
        .bind(user_id.value())
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_entry))
    }

    /// 重複時は`ON CONFLICT DO NOTHING`で0行となり、`false`を返す
    async fn insert(&self, entry: &WishlistEntry) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO wishlist_entries (entry_id, user_id, book_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, book_id) DO NOTHING
            "#,
        )
        .bind(entry.entry_id.value())
        .bind(entry.user_id.value())
        .bind(entry.book_id.value())
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, entry_id: WishlistEntryId) -> Result<()> {
        sqlx::query("DELETE FROM wishlist_entries WHERE entry_id = $1")
            .bind(entry_id.value())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_for(&self, user_id: UserId, book_id: BookId) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM wishlist_entries WHERE user_id = $1 AND book_id = $2")
                .bind(user_id.value())
                .bind(book_id.value())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<WishlistEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT entry_id, user_id, book_id, created_at
            FROM wishlist_entries
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_entry).collect())
    }
}
