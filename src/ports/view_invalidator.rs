use crate::domain::value_objects::{BookId, UserId};
use async_trait::async_trait;
use std::fmt;

/// 表示層の論理ビュー（パスで識別する）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Books,
    BookDetail(BookId),
    AdminDashboard,
    UserProfile(UserId),
    Wishlist,
}

impl View {
    pub fn path(&self) -> String {
        match self {
            View::Books => "/books".to_string(),
            View::BookDetail(book_id) => format!("/books/{}", book_id),
            View::AdminDashboard => "/admin".to_string(),
            View::UserProfile(user_id) => format!("/users/{}", user_id),
            View::Wishlist => "/wishlist".to_string(),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// ビュー無効化ポート
///
/// 更新系ユースケースは書き込みに成功した後に呼び出し、表示層は次の描画で
/// ビューを再計算する。無効化がユースケースを失敗させることはない。
#[async_trait]
pub trait ViewInvalidator: Send + Sync {
    async fn invalidate(&self, view: View);
}
