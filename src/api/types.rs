use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::catalog::{Author, Book, BookDetail, Genre};
use crate::domain::loan::Loan;
use crate::domain::user::Principal;
use crate::domain::value_objects::LoanStatus;
use crate::domain::wishlist::WishlistChange;

/// ログインリクエスト（POST /auth/login）
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// トークンレスポンス（POST /auth/login）
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub user: Principal,
}

impl TokenResponse {
    pub fn bearer(token: String, user: Principal) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
            user,
        }
    }
}

/// 貸出レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanResponse {
    pub loan_id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub status: LoanStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub extended: bool,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            loan_id: loan.loan_id.value(),
            user_id: loan.user_id.value(),
            book_id: loan.book_id.value(),
            status: loan.status,
            requested_at: loan.requested_at,
            approved_at: loan.approved_at,
            due_date: loan.due_date,
            returned_at: loan.returned_at,
            extended: loan.extended,
        }
    }
}

/// 書籍詳細レスポンス（GET /books/:id）
#[derive(Debug, Serialize)]
pub struct BookDetailResponse {
    #[serde(flatten)]
    pub book: Book,
    pub authors: Vec<Author>,
    pub genres: Vec<Genre>,
}

impl From<BookDetail> for BookDetailResponse {
    fn from(detail: BookDetail) -> Self {
        Self {
            book: detail.book,
            authors: detail.authors,
            genres: detail.genres,
        }
    }
}

/// ウィッシュリスト切り替えのレスポンス
///
/// 未ログインの場合`change`は`null`。
#[derive(Debug, Serialize, Deserialize)]
pub struct WishlistToggleResponse {
    pub change: Option<WishlistChange>,
}

/// ビューの世代（GET /views/*path）
#[derive(Debug, Serialize, Deserialize)]
pub struct ViewGenerationResponse {
    pub path: String,
    pub generation: u64,
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
