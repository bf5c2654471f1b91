use crate::adapters::memory::ViewRegistry;
use crate::application::{
    self, ServiceDependencies,
    account::UserDetail,
    catalog::CoverUpload,
    loan::LoanSummary,
};
use crate::domain::catalog::{Author, Book, Genre};
use crate::domain::commands::{
    ApproveBorrow, BookForm, ExtendLoan, NameForm, RegisterForm, RejectBorrow, RequestBorrow,
    ReturnBook, ToggleWishlist,
};
use crate::domain::user::Principal;
use crate::domain::value_objects::{BookId, LoanId, UserId};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    auth::{AuthSettings, Authenticated, MaybeAuthenticated, issue_token},
    error::ApiError,
    types::{
        BookDetailResponse, LoanResponse, LoginRequest, TokenResponse, ViewGenerationResponse,
        WishlistToggleResponse,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
    pub auth: AuthSettings,
    /// `service_deps.views`と同じインスタンス（世代の参照用）
    pub views: Arc<ViewRegistry>,
}

// ============================================================================
// Accounts
// ============================================================================

/// POST /auth/register - 利用者登録
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<Principal>), ApiError> {
    let principal = application::account::register(&state.service_deps, &form, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(principal)))
}

/// POST /auth/login - ログインしてセッショントークンを受け取る
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let principal =
        application::account::authenticate(&state.service_deps, &req.email, &req.password).await?;
    let token = issue_token(&state.auth, &principal)?;

    Ok(Json(TokenResponse::bearer(token, principal)))
}

/// GET /users - 利用者一覧（管理者のみ）
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
) -> Result<Json<Vec<Principal>>, ApiError> {
    let users = application::account::list_users(&state.service_deps, &principal).await?;
    Ok(Json(users))
}

/// GET /users/:id - 利用者詳細（管理者のみ）
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserDetail>, ApiError> {
    let detail = application::account::user_detail(
        &state.service_deps,
        &principal,
        UserId::from_uuid(user_id),
    )
    .await?;
    Ok(Json(detail))
}

// ============================================================================
// Catalog
// ============================================================================

/// 書籍フォームをmultipartから読み取る
///
/// 項目名はフォームのキャメルケース（`publishedYear`など）とスネークケースの両方を受け付ける。
/// ファイルが選択されなかった`cover`は空のパートとして届く。
async fn read_book_form(
    mut multipart: Multipart,
) -> Result<(BookForm, Option<CoverUpload>), ApiError> {
    let mut form = BookForm::default();
    let mut cover = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "cover" || name == "coverImage" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            cover = Some(CoverUpload {
                file_name,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        match name.as_str() {
            "title" => form.title = value,
            "description" => form.description = value,
            "publishedYear" | "published_year" => form.published_year = value,
            "authorId" | "author_id" => form.author_id = value,
            "genreId" | "genre_id" => form.genre_id = value,
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok((form, cover))
}

/// GET /books - 書籍一覧
pub async fn list_books(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Book>>, ApiError> {
    let books = application::catalog::list_books(&state.service_deps).await?;
    Ok(Json(books))
}

/// GET /books/:id - 書籍詳細
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookDetailResponse>, ApiError> {
    let detail =
        application::catalog::get_book(&state.service_deps, BookId::from_uuid(book_id)).await?;
    Ok(Json(detail.into()))
}

/// POST /books - 書籍登録（管理者のみ、multipart）
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let (form, cover) = read_book_form(multipart).await?;

    let book = application::catalog::create_book(
        &state.service_deps,
        &principal,
        &form,
        cover.as_ref(),
        Utc::now(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(book)))
}

/// PUT /books/:id - 書籍更新（管理者のみ、multipart）
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    Path(book_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Book>, ApiError> {
    let (form, cover) = read_book_form(multipart).await?;

    let book = application::catalog::update_book(
        &state.service_deps,
        &principal,
        BookId::from_uuid(book_id),
        &form,
        cover.as_ref(),
    )
    .await?;

    Ok(Json(book))
}

/// DELETE /books/:id - 書籍削除（管理者のみ）
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    Path(book_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    application::catalog::delete_book(&state.service_deps, &principal, BookId::from_uuid(book_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /authors
pub async fn list_authors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Author>>, ApiError> {
    Ok(Json(application::catalog::list_authors(&state.service_deps).await?))
}

/// POST /authors - 著者追加（管理者のみ）
pub async fn add_author(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    Json(form): Json<NameForm>,
) -> Result<(StatusCode, Json<Author>), ApiError> {
    let author = application::catalog::add_author(&state.service_deps, &principal, &form).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// GET /genres
pub async fn list_genres(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Genre>>, ApiError> {
    Ok(Json(application::catalog::list_genres(&state.service_deps).await?))
}

/// POST /genres - ジャンル追加（管理者のみ）
pub async fn add_genre(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    Json(form): Json<NameForm>,
) -> Result<(StatusCode, Json<Genre>), ApiError> {
    let genre = application::catalog::add_genre(&state.service_deps, &principal, &form).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

// ============================================================================
// Loans
// ============================================================================

/// POST /books/:id/borrow - 貸出を申請
///
/// 強制されるビジネスルール:
/// - 書籍が存在すること
/// - 書籍が貸出中でないこと
/// - 同じ書籍を申請中でないこと
pub async fn borrow_book(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    Path(book_id): Path<Uuid>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let cmd = RequestBorrow {
        book_id: BookId::from_uuid(book_id),
        requested_at: Utc::now(),
    };

    let loan = application::loan::request_borrow(&state.service_deps, &principal, cmd).await?;

    Ok((StatusCode::CREATED, Json(loan.into())))
}

/// POST /admin/loans/:id/approve - 貸出申請を承認（管理者のみ）
pub async fn approve_loan(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let cmd = ApproveBorrow {
        loan_id: LoanId::from_uuid(loan_id),
        approved_at: Utc::now(),
    };

    let loan = application::loan::approve_borrow(&state.service_deps, &principal, cmd).await?;

    Ok(Json(loan.into()))
}

/// POST /admin/loans/:id/reject - 貸出申請を却下（管理者のみ）
pub async fn reject_loan(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let cmd = RejectBorrow {
        loan_id: LoanId::from_uuid(loan_id),
    };

    let loan = application::loan::reject_borrow(&state.service_deps, &principal, cmd).await?;

    Ok(Json(loan.into()))
}

/// POST /loans/:id/return - 書籍を返却
///
/// 強制されるビジネスルール:
/// - 借りた本人であること
/// - 貸出中であること
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let cmd = ReturnBook {
        loan_id: LoanId::from_uuid(loan_id),
        returned_at: Utc::now(),
    };

    let loan = application::loan::return_book(&state.service_deps, &principal, cmd).await?;

    Ok(Json(loan.into()))
}

/// POST /loans/:id/extend - 貸出を延長
///
/// 強制されるビジネスルール:
/// - 借りた本人であること
/// - 延長は1回まで
/// - 貸出中であること
pub async fn extend_loan(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let cmd = ExtendLoan {
        loan_id: LoanId::from_uuid(loan_id),
    };

    let loan = application::loan::extend_loan(&state.service_deps, &principal, cmd).await?;

    Ok(Json(loan.into()))
}

/// GET /admin/loans - 全貸出（管理者のみ）
pub async fn admin_loans(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
) -> Result<Json<Vec<LoanSummary>>, ApiError> {
    let loans =
        application::loan::admin_dashboard(&state.service_deps, &principal, Utc::now()).await?;
    Ok(Json(loans))
}

/// GET /me/loans - 自分の貸出
pub async fn my_loans(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
) -> Result<Json<Vec<LoanSummary>>, ApiError> {
    let loans = application::loan::my_loans(&state.service_deps, &principal, Utc::now()).await?;
    Ok(Json(loans))
}

// ============================================================================
// Wishlist
// ============================================================================

/// POST /books/:id/wishlist - ウィッシュリストの切り替え
///
/// 未ログインの場合は何もしない（`change: null`）。
pub async fn toggle_wishlist(
    State(state): State<Arc<AppState>>,
    MaybeAuthenticated(principal): MaybeAuthenticated,
    Path(book_id): Path<Uuid>,
) -> Result<Json<WishlistToggleResponse>, ApiError> {
    let cmd = ToggleWishlist {
        book_id: BookId::from_uuid(book_id),
        toggled_at: Utc::now(),
    };

    let change =
        application::wishlist::toggle_wishlist(&state.service_deps, principal.as_ref(), cmd)
            .await?;

    Ok(Json(WishlistToggleResponse { change }))
}

/// GET /wishlist - 自分のウィッシュリスト
pub async fn my_wishlist(
    State(state): State<Arc<AppState>>,
    Authenticated(principal): Authenticated,
) -> Result<Json<Vec<Book>>, ApiError> {
    let books = application::wishlist::my_wishlist(&state.service_deps, &principal).await?;
    Ok(Json(books))
}

/// DELETE /wishlist/:book_id - ウィッシュリストから外す
pub async fn remove_from_wishlist(
    State(state): State<Arc<AppState>>,
    MaybeAuthenticated(principal): MaybeAuthenticated,
    Path(book_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    application::wishlist::remove_from_wishlist(
        &state.service_deps,
        principal.as_ref(),
        BookId::from_uuid(book_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Views
// ============================================================================

/// GET /views/*path - ビューの現在の世代
pub async fn view_generation(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Json<ViewGenerationResponse> {
    let path = format!("/{}", path.trim_start_matches('/'));
    let generation = state.views.generation(&path);

    Json(ViewGenerationResponse { path, generation })
}
