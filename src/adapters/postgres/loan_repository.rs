use crate::domain::loan::Loan;
use crate::domain::value_objects::{BookId, LoanId, LoanStatus, UserId};
use crate::ports::loan_repository::{
    LoanConflict, LoanGuard, LoanRepository as LoanRepositoryTrait, SaveOutcome,
};
use crate::ports::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::{invalid_data, violated_unique_constraint};

const SELECT_LOAN: &str = r#"
    SELECT
        loan_id,
        user_id,
        book_id,
        status,
        requested_at,
        approved_at,
        due_date,
        returned_at,
        extended
    FROM loans
"#;

/// PostgreSQLの行データをLoanに変換する
fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let status_str: &str = row.get("status");
    let status = LoanStatus::from_str(status_str).map_err(invalid_data)?;

    Ok(Loan {
        loan_id: LoanId::from_uuid(row.get("loan_id")),
        user_id: UserId::from_uuid(row.get("user_id")),
        book_id: BookId::from_uuid(row.get("book_id")),
        status,
        requested_at: row.get("requested_at"),
        approved_at: row.get("approved_at"),
        due_date: row.get("due_date"),
        returned_at: row.get("returned_at"),
        extended: row.get("extended"),
    })
}

/// 一意性制約違反を`LoanConflict`に変換する
///
/// 貸出の部分一意インデックス以外の違反は`None`（通常のエラーとして扱う）。
fn conflict_from(err: &sqlx::Error) -> Option<LoanConflict> {
    match violated_unique_constraint(err)?.as_str() {
        "loans_one_approved_per_book" => Some(LoanConflict::BookAlreadyBorrowed),
        "loans_one_pending_per_user_book" => Some(LoanConflict::AlreadyRequested),
        _ => None,
    }
}

/// LoanRepositoryのPostgreSQL実装
///
/// 不変条件は部分一意インデックス（`loans_one_approved_per_book`、
/// `loans_one_pending_per_user_book`）で保証し、更新は
/// 読み取り時の状態を条件にした`UPDATE ... WHERE`で行う。
pub struct LoanRepository {
    pool: PgPool,
}

impl LoanRepository {
    /// PostgreSQLコネクションプールから新しいLoanRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    async fn insert(&self, loan: &Loan) -> Result<SaveOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO loans (
                loan_id,
                user_id,
                book_id,
                status,
                requested_at,
                approved_at,
                due_date,
                returned_at,
                extended
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.user_id.value())
        .bind(loan.book_id.value())
        .bind(loan.status.as_str())
        .bind(loan.requested_at)
        .bind(loan.approved_at)
        .bind(loan.due_date)
        .bind(loan.returned_at)
        .bind(loan.extended)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(SaveOutcome::Saved),
            Err(e) => match conflict_from(&e) {
                Some(conflict) => Ok(SaveOutcome::Conflict(conflict)),
                None => Err(e.into()),
            },
        }
    }

    /// 条件付き更新
    ///
    /// 行が`guard`の状態のままでなければ0行更新となり、`Stale`を返す。
    async fn update(&self, loan: &Loan, guard: LoanGuard) -> Result<SaveOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET status = $2,
                approved_at = $3,
                due_date = $4,
                returned_at = $5,
                extended = $6
            WHERE loan_id = $1 AND status = $7 AND extended = $8
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.status.as_str())
        .bind(loan.approved_at)
        .bind(loan.due_date)
        .bind(loan.returned_at)
        .bind(loan.extended)
        .bind(guard.status.as_str())
        .bind(guard.extended)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(SaveOutcome::Stale),
            Ok(_) => Ok(SaveOutcome::Saved),
            Err(e) => match conflict_from(&e) {
                Some(conflict) => Ok(SaveOutcome::Conflict(conflict)),
                None => Err(e.into()),
            },
        }
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(&format!("{} WHERE loan_id = $1", SELECT_LOAN))
            .bind(loan_id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    /// 部分一意インデックス`loans_one_approved_per_book`を使用する
    async fn find_approved_for_book(&self, book_id: BookId) -> Result<Option<Loan>> {
        let row = sqlx::query(&format!(
            "{} WHERE book_id = $1 AND status = 'APPROVED'",
            SELECT_LOAN
        ))
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    async fn find_pending(&self, user_id: UserId, book_id: BookId) -> Result<Option<Loan>> {
        let row = sqlx::query(&format!(
            "{} WHERE user_id = $1 AND book_id = $2 AND status = 'PENDING'",
            SELECT_LOAN
        ))
        .bind(user_id.value())
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(&format!(
            "{} WHERE user_id = $1 ORDER BY requested_at DESC",
            SELECT_LOAN
        ))
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn list_all(&self) -> Result<Vec<Loan>> {
        let rows = sqlx::query(&format!("{} ORDER BY requested_at DESC", SELECT_LOAN))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn count_for_book(&self, book_id: BookId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE book_id = $1")
            .bind(book_id.value())
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}
