use crate::application::ApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
/// 認証ヘッダーやリクエスト形式のエラーはAPI層で発生する。
#[derive(Debug)]
pub enum ApiError {
    Application(ApplicationError),
    /// トークンがない、または不正
    Authentication(String),
    /// リクエストの形式が不正（multipartの読み取り失敗など）
    BadRequest(String),
    Internal,
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        ApiError::Application(err)
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        let err = match self {
            ApiError::Authentication(reason) => {
                tracing::debug!("Authentication failed: {}", reason);
                return (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHENTICATED",
                    "Authentication required".to_string(),
                );
            }
            ApiError::BadRequest(msg) => {
                return (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone());
            }
            ApiError::Internal => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                );
            }
            ApiError::Application(err) => err,
        };

        let message = err.to_string();
        match err {
            // 403 Forbidden - 存在の有無を区別しない中立なメッセージ
            ApplicationError::Unauthorized => (StatusCode::FORBIDDEN, "UNAUTHORIZED", message),
            ApplicationError::NotOwner => (StatusCode::FORBIDDEN, "NOT_OWNER", message),

            // 401 - 認証情報の誤り
            ApplicationError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", message)
            }

            // 404 Not Found
            ApplicationError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", message),

            // 409 Conflict - 現在の状態と衝突するビジネスルール違反
            ApplicationError::AlreadyBorrowed => (StatusCode::CONFLICT, "ALREADY_BORROWED", message),
            ApplicationError::AlreadyRequested => {
                (StatusCode::CONFLICT, "ALREADY_REQUESTED", message)
            }
            ApplicationError::AlreadyExtended => (StatusCode::CONFLICT, "ALREADY_EXTENDED", message),
            ApplicationError::NotActive => (StatusCode::CONFLICT, "NOT_ACTIVE", message),
            ApplicationError::NotPending => (StatusCode::CONFLICT, "NOT_PENDING", message),
            ApplicationError::BookHasLoans => (StatusCode::CONFLICT, "BOOK_HAS_LOANS", message),
            ApplicationError::EmailTaken => (StatusCode::CONFLICT, "EMAIL_TAKEN", message),

            // 422 Unprocessable Entity - 入力・データの不整合
            ApplicationError::MissingDueDate => {
                (StatusCode::UNPROCESSABLE_ENTITY, "MISSING_DUE_DATE", message)
            }
            ApplicationError::Validation(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
            }

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            ApplicationError::RepositoryError(e) => {
                tracing::error!("Repository error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPOSITORY_ERROR",
                    "Failed to access storage".to_string(),
                )
            }
            ApplicationError::CoverStorageError(e) => {
                tracing::error!("Cover storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COVER_STORAGE_ERROR",
                    "Failed to store cover image".to_string(),
                )
            }
            ApplicationError::PasswordHashError(e) => {
                tracing::error!("Password hashing error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = self.parts();
        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
