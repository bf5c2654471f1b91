pub mod catalog_repository;
pub mod cover_storage;
pub mod loan_repository;
pub mod user_repository;
pub mod view_invalidator;
pub mod wishlist_repository;

pub use catalog_repository::*;
pub use cover_storage::*;
pub use loan_repository::*;
pub use user_repository::*;
pub use view_invalidator::*;
pub use wishlist_repository::*;

/// ポート共通のResult型
///
/// アダプター固有のエラー（sqlx, I/O など）をそのまま運ぶ。
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
