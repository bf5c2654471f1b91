//! PostgreSQLアダプターのテスト
//!
//! DATABASE_URLのデータベースが必要なため、`cargo test -- --ignored`で実行する。

mod common;

use chrono::{DateTime, Utc};
use rusty_library_lending::adapters::postgres::{
    PostgresCatalogRepository, PostgresLoanRepository, PostgresUserRepository,
    PostgresWishlistRepository,
};
use rusty_library_lending::domain::catalog::{Author, Book, Genre};
use rusty_library_lending::domain::loan::{self, Loan, LoanPolicy};
use rusty_library_lending::domain::user::User;
use rusty_library_lending::domain::value_objects::*;
use rusty_library_lending::domain::wishlist::WishlistEntry;
use rusty_library_lending::ports::*;
use serial_test::serial;
use sqlx::PgPool;

/// PostgreSQLの時刻精度（マイクロ秒）に合わせて丸める
fn truncate_to_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(dt.timestamp_micros()).expect("Invalid timestamp")
}

/// テストごとに全テーブルを空にする
async fn cleanup_database(pool: &PgPool) {
    sqlx::query(
        "TRUNCATE TABLE wishlist_entries, loans, book_authors, book_genres, books, authors, genres, users CASCADE",
    )
    .execute(pool)
    .await
    .expect("Failed to truncate tables");
}

async fn insert_user(pool: &PgPool, email: &str) -> UserId {
    let users = PostgresUserRepository::new(pool.clone());
    let user = User {
        user_id: UserId::new(),
        name: "Ada".to_string(),
        email: email.to_string(),
        password_hash: "hash".to_string(),
        role: Role::Student,
        created_at: truncate_to_micros(Utc::now()),
    };
    assert!(users.insert(&user).await.expect("Failed to insert user"));
    user.user_id
}

async fn insert_book(pool: &PgPool, title: &str) -> BookId {
    let catalog = PostgresCatalogRepository::new(pool.clone());
    let author = Author {
        author_id: AuthorId::new(),
        name: "Frank Herbert".to_string(),
    };
    let genre = Genre {
        genre_id: GenreId::new(),
        name: "Science Fiction".to_string(),
    };
    catalog.insert_author(&author).await.unwrap();
    catalog.insert_genre(&genre).await.unwrap();

    let book = Book {
        book_id: BookId::new(),
        title: title.to_string(),
        description: "A novel".to_string(),
        published_year: 1965,
        cover_image: None,
        created_at: truncate_to_micros(Utc::now()),
    };
    catalog
        .insert_book(&book, author.author_id, genre.genre_id)
        .await
        .unwrap();
    book.book_id
}

fn pending(user_id: UserId, book_id: BookId) -> Loan {
    loan::request_borrow(book_id, user_id, truncate_to_micros(Utc::now()))
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_loan_insert_and_get_by_id() {
    let pool = common::create_test_pool().await;
    cleanup_database(&pool).await;
    let repo = PostgresLoanRepository::new(pool.clone());
    let user_id = insert_user(&pool, "ada@arteveldehs.be").await;
    let book_id = insert_book(&pool, "Dune").await;

    let loan = pending(user_id, book_id);
    assert_eq!(repo.insert(&loan).await.unwrap(), SaveOutcome::Saved);

    let stored = repo.get_by_id(loan.loan_id).await.unwrap().unwrap();
    assert_eq!(stored, loan);
    assert_eq!(repo.count_for_book(book_id).await.unwrap(), 1);
    assert!(repo.get_by_id(LoanId::new()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_second_pending_request_is_a_conflict() {
    let pool = common::create_test_pool().await;
    cleanup_database(&pool).await;
    let repo = PostgresLoanRepository::new(pool.clone());
    let user_id = insert_user(&pool, "ada@arteveldehs.be").await;
    let book_id = insert_book(&pool, "Dune").await;

    repo.insert(&pending(user_id, book_id)).await.unwrap();
    let outcome = repo.insert(&pending(user_id, book_id)).await.unwrap();

    assert_eq!(
        outcome,
        SaveOutcome::Conflict(LoanConflict::AlreadyRequested)
    );
    assert!(repo.find_pending(user_id, book_id).await.unwrap().is_some());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_second_approval_is_a_conflict() {
    let pool = common::create_test_pool().await;
    cleanup_database(&pool).await;
    let repo = PostgresLoanRepository::new(pool.clone());
    let ada = insert_user(&pool, "ada@arteveldehs.be").await;
    let bob = insert_user(&pool, "bob@arteveldehs.be").await;
    let book_id = insert_book(&pool, "Dune").await;
    let policy = LoanPolicy::default();
    let now = truncate_to_micros(Utc::now());

    let first = pending(ada, book_id);
    let second = pending(bob, book_id);
    repo.insert(&first).await.unwrap();
    repo.insert(&second).await.unwrap();

    let approved = loan::approve_borrow(&first, now, &policy).unwrap();
    assert_eq!(
        repo.update(&approved, LoanGuard::of(&first)).await.unwrap(),
        SaveOutcome::Saved
    );

    let also_approved = loan::approve_borrow(&second, now, &policy).unwrap();
    assert_eq!(
        repo.update(&also_approved, LoanGuard::of(&second))
            .await
            .unwrap(),
        SaveOutcome::Conflict(LoanConflict::BookAlreadyBorrowed)
    );

    let active = repo.find_approved_for_book(book_id).await.unwrap().unwrap();
    assert_eq!(active.loan_id, first.loan_id);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_update_with_outdated_guard_is_stale() {
    let pool = common::create_test_pool().await;
    cleanup_database(&pool).await;
    let repo = PostgresLoanRepository::new(pool.clone());
    let user_id = insert_user(&pool, "ada@arteveldehs.be").await;
    let book_id = insert_book(&pool, "Dune").await;
    let now = truncate_to_micros(Utc::now());

    let requested = pending(user_id, book_id);
    repo.insert(&requested).await.unwrap();
    let approved = loan::approve_borrow(&requested, now, &LoanPolicy::default()).unwrap();
    repo.update(&approved, LoanGuard::of(&requested))
        .await
        .unwrap();

    let extended = loan::extend_loan(&approved, user_id).unwrap();
    assert_eq!(
        repo.update(&extended, LoanGuard::of(&approved)).await.unwrap(),
        SaveOutcome::Saved
    );

    // 同じ読み取り結果からの二度目の延長
    assert_eq!(
        repo.update(&extended, LoanGuard::of(&approved)).await.unwrap(),
        SaveOutcome::Stale
    );

    let stored = repo.get_by_id(requested.loan_id).await.unwrap().unwrap();
    assert!(stored.extended);
    assert_eq!(stored.due_date, extended.due_date);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_list_all_is_newest_first() {
    let pool = common::create_test_pool().await;
    cleanup_database(&pool).await;
    let repo = PostgresLoanRepository::new(pool.clone());
    let user_id = insert_user(&pool, "ada@arteveldehs.be").await;
    let dune = insert_book(&pool, "Dune").await;
    let emma = insert_book(&pool, "Emma").await;
    let now = truncate_to_micros(Utc::now());

    let older = loan::request_borrow(dune, user_id, now - chrono::Duration::hours(1));
    let newer = loan::request_borrow(emma, user_id, now);
    repo.insert(&older).await.unwrap();
    repo.insert(&newer).await.unwrap();

    let all = repo.list_all().await.unwrap();
    assert_eq!(
        all.iter().map(|l| l.loan_id).collect::<Vec<_>>(),
        vec![newer.loan_id, older.loan_id]
    );
    assert_eq!(repo.find_by_user(user_id).await.unwrap().len(), 2);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_duplicate_email_is_not_inserted() {
    let pool = common::create_test_pool().await;
    cleanup_database(&pool).await;
    let users = PostgresUserRepository::new(pool.clone());
    insert_user(&pool, "ada@arteveldehs.be").await;

    let duplicate = User {
        user_id: UserId::new(),
        name: "Other Ada".to_string(),
        email: "ada@arteveldehs.be".to_string(),
        password_hash: "hash".to_string(),
        role: Role::Admin,
        created_at: Utc::now(),
    };

    assert!(!users.insert(&duplicate).await.unwrap());
    let found = users
        .find_by_email("ada@arteveldehs.be")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.name, "Ada");
    assert_eq!(found.role, Role::Student);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_wishlist_entry_is_unique_per_user_and_book() {
    let pool = common::create_test_pool().await;
    cleanup_database(&pool).await;
    let wishlists = PostgresWishlistRepository::new(pool.clone());
    let user_id = insert_user(&pool, "ada@arteveldehs.be").await;
    let book_id = insert_book(&pool, "Dune").await;

    let entry = WishlistEntry {
        entry_id: WishlistEntryId::new(),
        user_id,
        book_id,
        created_at: truncate_to_micros(Utc::now()),
    };
    let again = WishlistEntry {
        entry_id: WishlistEntryId::new(),
        ..entry.clone()
    };

    assert!(wishlists.insert(&entry).await.unwrap());
    assert!(!wishlists.insert(&again).await.unwrap());
    assert_eq!(wishlists.find(user_id, book_id).await.unwrap(), Some(entry));

    assert_eq!(wishlists.delete_for(user_id, book_id).await.unwrap(), 1);
    assert!(wishlists.find_by_user(user_id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_book_detail_joins_authors_and_genres() {
    let pool = common::create_test_pool().await;
    cleanup_database(&pool).await;
    let catalog = PostgresCatalogRepository::new(pool.clone());
    let book_id = insert_book(&pool, "Dune").await;

    let detail = catalog.get_book_detail(book_id).await.unwrap().unwrap();
    assert_eq!(detail.book.title, "Dune");
    assert_eq!(detail.authors.len(), 1);
    assert_eq!(detail.genres[0].name, "Science Fiction");

    assert_eq!(
        catalog.delete_book(book_id).await.unwrap(),
        BookDeletion::Deleted
    );
    assert!(catalog.get_book(book_id).await.unwrap().is_none());
    assert_eq!(
        catalog.delete_book(book_id).await.unwrap(),
        BookDeletion::NotFound
    );
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_delete_book_referenced_by_loan_reports_has_loans() {
    let pool = common::create_test_pool().await;
    cleanup_database(&pool).await;
    let catalog = PostgresCatalogRepository::new(pool.clone());
    let loans = PostgresLoanRepository::new(pool.clone());
    let user_id = insert_user(&pool, "ada@arteveldehs.be").await;
    let book_id = insert_book(&pool, "Dune").await;
    loans.insert(&pending(user_id, book_id)).await.unwrap();

    // 貸出件数の確認を経ずに削除しても、外部キーで止まる
    assert_eq!(
        catalog.delete_book(book_id).await.unwrap(),
        BookDeletion::HasLoans
    );
    assert!(catalog.get_book(book_id).await.unwrap().is_some());
}
