//! メモリ上のアダプター
//!
//! テストと開発用。すべての実装は`Mutex`で保護されたマップを持ち、
//! PostgreSQL実装と同じ一意性ルールをロック内で保証する。

pub mod catalog_repository;
pub mod cover_storage;
pub mod loan_repository;
pub mod user_repository;
pub mod view_registry;
pub mod wishlist_repository;

pub use catalog_repository::CatalogRepository as MemoryCatalogRepository;
pub use cover_storage::CoverStorage as MemoryCoverStorage;
pub use loan_repository::LoanRepository as MemoryLoanRepository;
pub use user_repository::UserRepository as MemoryUserRepository;
pub use view_registry::ViewRegistry;
pub use wishlist_repository::WishlistRepository as MemoryWishlistRepository;

use std::sync::PoisonError;

/// ロックが壊れていた場合のエラー
fn poisoned<T>(_: PoisonError<T>) -> Box<dyn std::error::Error + Send + Sync> {
    "in-memory store lock poisoned".into()
}
