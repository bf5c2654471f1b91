pub mod catalog_repository;
pub mod loan_repository;
pub mod user_repository;
pub mod wishlist_repository;

// パブリックに型を再エクスポート
pub use catalog_repository::CatalogRepository as PostgresCatalogRepository;
pub use loan_repository::LoanRepository as PostgresLoanRepository;
pub use user_repository::UserRepository as PostgresUserRepository;
pub use wishlist_repository::WishlistRepository as PostgresWishlistRepository;

/// 一意性制約違反なら、その制約名を返す
fn violated_unique_constraint(err: &sqlx::Error) -> Option<String> {
    let db_err = err.as_database_error()?;
    if db_err.is_unique_violation() {
        db_err.constraint().map(str::to_string)
    } else {
        None
    }
}

/// 外部キー制約違反なら、その制約名を返す
fn violated_foreign_key(err: &sqlx::Error) -> Option<String> {
    let db_err = err.as_database_error()?;
    if db_err.is_foreign_key_violation() {
        db_err.constraint().map(str::to_string)
    } else {
        None
    }
}

/// 列の値がドメインの型に変換できなかったことを表すエラー
fn invalid_data(message: String) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}
