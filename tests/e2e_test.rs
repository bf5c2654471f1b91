use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use rusty_library_lending::api::{AppState, AuthSettings, create_router};
use rusty_library_lending::api::types::*;
use rusty_library_lending::domain::value_objects::*;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

mod common;

use common::*;

const ADMIN_EMAIL: &str = "librarian@arteveldehs.be";

// ============================================================================
// E2Eテスト用のヘルパー関数
// ============================================================================

/// E2Eテスト用のアプリケーションセットアップ
///
/// メモリアダプターと実際のAPIルーターを使用する。
/// `ADMIN_EMAIL`で登録した利用者は管理者になる。
fn setup_e2e_app() -> (TestContext, axum::Router) {
    let mut settings = default_settings();
    settings.admin_emails = vec![ADMIN_EMAIL.to_string()];
    let ctx = setup_with(settings);

    let app_state = Arc::new(AppState {
        service_deps: ctx.deps.clone(),
        auth: AuthSettings {
            jwt_secret: "e2e-secret".to_string(),
            token_ttl_hours: 1,
        },
        views: ctx.views.clone(),
    });

    (ctx, create_router(app_state))
}

async fn send(app: &axum::Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// 登録してログインし、トークンを返す
async fn register_and_login(app: &axum::Router, email: &str, name: &str) -> String {
    let response = send(
        app,
        json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "email": email, "name": name, "password": "hunter2" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        app,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": email, "password": "hunter2" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let token: TokenResponse = json_body(response).await;
    assert_eq!(token.token_type, "Bearer");
    token.token
}

// ============================================================================
// E2Eテスト: 正常系フロー
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (_ctx, app) = setup_e2e_app();

    let response = send(&app, empty_request("GET", "/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_e2e_full_loan_flow() {
    let (ctx, app) = setup_e2e_app();
    let book_id = seed_book(&ctx, "Dune").await;
    let admin_token = register_and_login(&app, ADMIN_EMAIL, "Librarian").await;
    let student_token =
        register_and_login(&app, "ada@student.arteveldehs.be", "Ada").await;

    // Step 1: 貸出申請（POST /books/:id/borrow）
    let response = send(
        &app,
        empty_request(
            "POST",
            &format!("/books/{}/borrow", book_id),
            Some(&student_token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let requested: LoanResponse = json_body(response).await;
    assert_eq!(requested.status, LoanStatus::Pending);
    assert_eq!(requested.book_id, book_id.value());

    // 同じ書籍の二重申請
    let response = send(
        &app,
        empty_request(
            "POST",
            &format!("/books/{}/borrow", book_id),
            Some(&student_token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.error, "ALREADY_REQUESTED");

    // Step 2: 承認（POST /admin/loans/:id/approve）
    let response = send(
        &app,
        empty_request(
            "POST",
            &format!("/admin/loans/{}/approve", requested.loan_id),
            Some(&admin_token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let approved: LoanResponse = json_body(response).await;
    assert_eq!(approved.status, LoanStatus::Approved);
    let due_date = approved.due_date.unwrap();

    // Step 3: 延長（POST /loans/:id/extend）
    let response = send(
        &app,
        empty_request(
            "POST",
            &format!("/loans/{}/extend", requested.loan_id),
            Some(&student_token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let extended: LoanResponse = json_body(response).await;
    assert!(extended.extended);
    assert_eq!(
        extended.due_date.unwrap() - due_date,
        chrono::Duration::days(7)
    );

    // 二度目の延長は不可
    let response = send(
        &app,
        empty_request(
            "POST",
            &format!("/loans/{}/extend", requested.loan_id),
            Some(&student_token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.error, "ALREADY_EXTENDED");

    // Step 4: 自分の貸出一覧（GET /me/loans）
    let response = send(&app, empty_request("GET", "/me/loans", Some(&student_token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let loans: Vec<Value> = json_body(response).await;
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0]["book_title"], "Dune");
    assert_eq!(loans[0]["status"], "APPROVED");
    assert_eq!(loans[0]["overdue"], false);

    // Step 5: 返却（POST /loans/:id/return）
    let response = send(
        &app,
        empty_request(
            "POST",
            &format!("/loans/{}/return", requested.loan_id),
            Some(&student_token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let returned: LoanResponse = json_body(response).await;
    assert_eq!(returned.status, LoanStatus::Returned);
    assert!(returned.returned_at.is_some());

    // 管理画面の一覧（GET /admin/loans）
    let response = send(&app, empty_request("GET", "/admin/loans", Some(&admin_token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let loans: Vec<Value> = json_body(response).await;
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0]["borrower_name"], "Ada");
    assert_eq!(loans[0]["status"], "RETURNED");
}

#[tokio::test]
async fn test_e2e_create_book_with_cover() {
    let (ctx, app) = setup_e2e_app();
    let (author_id, genre_id) = seed_author_and_genre(&ctx).await;
    let admin_token = register_and_login(&app, ADMIN_EMAIL, "Librarian").await;

    let boundary = "X-LIBRARY-BOUNDARY";
    let mut body = String::new();
    for (name, value) in [
        ("title", "Dune".to_string()),
        ("description", "Desert planet".to_string()),
        ("publishedYear", "1965".to_string()),
        ("authorId", author_id.to_string()),
        ("genreId", genre_id.to_string()),
    ] {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"cover\"; filename=\"dune.png\"\r\nContent-Type: image/png\r\n\r\npng-bytes\r\n--{boundary}--\r\n"
    ));

    let request = Request::builder()
        .method("POST")
        .uri("/books")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .header(header::AUTHORIZATION, format!("Bearer {}", admin_token))
        .body(Body::from(body))
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let book: Value = json_body(response).await;
    assert_eq!(book["title"], "Dune");
    assert_eq!(book["published_year"], 1965);
    let cover = book["cover_image"].as_str().unwrap();
    assert!(ctx.covers.contains(cover));

    // 書籍詳細（GET /books/:id）
    let response = send(
        &app,
        empty_request(
            "GET",
            &format!("/books/{}", book["book_id"].as_str().unwrap()),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail: Value = json_body(response).await;
    assert_eq!(detail["authors"][0]["name"], "Frank Herbert");
    assert_eq!(detail["genres"][0]["name"], "Science Fiction");
}

// ============================================================================
// E2Eテスト: 認証・認可
// ============================================================================

#[tokio::test]
async fn test_e2e_borrow_requires_token() {
    let (ctx, app) = setup_e2e_app();
    let book_id = seed_book(&ctx, "Dune").await;

    let response = send(
        &app,
        empty_request("POST", &format!("/books/{}/borrow", book_id), None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.error, "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_e2e_invalid_token_is_rejected() {
    let (ctx, app) = setup_e2e_app();
    let book_id = seed_book(&ctx, "Dune").await;

    let response = send(
        &app,
        empty_request(
            "POST",
            &format!("/books/{}/wishlist", book_id),
            Some("not-a-jwt"),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_e2e_student_cannot_approve() {
    let (ctx, app) = setup_e2e_app();
    let book_id = seed_book(&ctx, "Dune").await;
    let student_token =
        register_and_login(&app, "ada@student.arteveldehs.be", "Ada").await;

    let response = send(
        &app,
        empty_request(
            "POST",
            &format!("/books/{}/borrow", book_id),
            Some(&student_token),
        ),
    )
    .await;
    let requested: LoanResponse = json_body(response).await;

    let response = send(
        &app,
        empty_request(
            "POST",
            &format!("/admin/loans/{}/approve", requested.loan_id),
            Some(&student_token),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.error, "UNAUTHORIZED");
}

#[tokio::test]
async fn test_e2e_login_with_wrong_password() {
    let (_ctx, app) = setup_e2e_app();
    register_and_login(&app, "ada@student.arteveldehs.be", "Ada").await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "ada@student.arteveldehs.be", "password": "wrong" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.error, "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_e2e_register_with_foreign_domain() {
    let (_ctx, app) = setup_e2e_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "email": "ada@example.com", "name": "Ada", "password": "hunter2" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.error, "VALIDATION_ERROR");
}

// ============================================================================
// E2Eテスト: ウィッシュリストとビュー
// ============================================================================

#[tokio::test]
async fn test_e2e_wishlist_toggle_and_view_generation() {
    let (ctx, app) = setup_e2e_app();
    let book_id = seed_book(&ctx, "Dune").await;
    let student_token =
        register_and_login(&app, "ada@student.arteveldehs.be", "Ada").await;

    // 未ログインでは何も起きない
    let response = send(
        &app,
        empty_request("POST", &format!("/books/{}/wishlist", book_id), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let toggled: Value = json_body(response).await;
    assert_eq!(toggled["change"], Value::Null);

    let response = send(
        &app,
        empty_request(
            "POST",
            &format!("/books/{}/wishlist", book_id),
            Some(&student_token),
        ),
    )
    .await;
    let toggled: Value = json_body(response).await;
    assert_eq!(toggled["change"], "added");

    let response = send(&app, empty_request("GET", "/wishlist", Some(&student_token))).await;
    let books: Vec<Value> = json_body(response).await;
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "Dune");

    // 書籍詳細ビューが一度無効化されている
    let response = send(
        &app,
        empty_request("GET", &format!("/views/books/{}", book_id), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let view: ViewGenerationResponse = json_body(response).await;
    assert_eq!(view.path, format!("/books/{}", book_id));
    assert_eq!(view.generation, 1);

    let response = send(
        &app,
        empty_request(
            "DELETE",
            &format!("/wishlist/{}", book_id),
            Some(&student_token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, empty_request("GET", "/wishlist", Some(&student_token))).await;
    let books: Vec<Value> = json_body(response).await;
    assert!(books.is_empty());
}
