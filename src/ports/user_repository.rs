use crate::domain::user::User;
use crate::domain::value_objects::UserId;
use async_trait::async_trait;

use super::Result;

/// 利用者リポジトリポート
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 利用者を保存する
    ///
    /// メールアドレスが既に登録されている場合は`false`を返す。
    async fn insert(&self, user: &User) -> Result<bool>;

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// 全利用者（登録日時の新しい順）
    async fn list(&self) -> Result<Vec<User>>;
}
