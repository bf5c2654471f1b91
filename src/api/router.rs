use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::*;

/// 表紙画像を含むリクエストの上限
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Creates the API router
///
/// Public:
/// - GET /books, /books/:id, /authors, /genres
/// - POST /auth/register, /auth/login
/// - POST /books/:id/wishlist, DELETE /wishlist/:book_id (no-op without a token)
///
/// Authenticated:
/// - POST /books/:id/borrow, /loans/:id/return, /loans/:id/extend
/// - GET /me/loans, /wishlist
///
/// Admin:
/// - POST /books (multipart), PUT/DELETE /books/:id, POST /authors, /genres
/// - GET /admin/loans, POST /admin/loans/:id/approve, /admin/loans/:id/reject
/// - GET /users, /users/:id
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Accounts
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        // Catalog
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/authors", get(list_authors).post(add_author))
        .route("/genres", get(list_genres).post(add_genre))
        // Loans
        .route("/books/:id/borrow", post(borrow_book))
        .route("/loans/:id/return", post(return_book))
        .route("/loans/:id/extend", post(extend_loan))
        .route("/me/loans", get(my_loans))
        .route("/admin/loans", get(admin_loans))
        .route("/admin/loans/:id/approve", post(approve_loan))
        .route("/admin/loans/:id/reject", post(reject_loan))
        // Wishlist
        .route("/books/:id/wishlist", post(toggle_wishlist))
        .route("/wishlist", get(my_wishlist))
        .route("/wishlist/:book_id", delete(remove_from_wishlist))
        // Views
        .route("/views/*path", get(view_generation))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
