use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::{self, loan::Loan, user::Principal, value_objects::*};

use crate::application::{ApplicationError, Result, ServiceDependencies, require_admin};

/// 貸出一覧の1行
///
/// 画面表示用に書籍タイトル・利用者名・残り時間を添えたもの。
#[derive(Debug, Clone, Serialize)]
pub struct LoanSummary {
    #[serde(flatten)]
    pub loan: Loan,
    pub book_title: String,
    pub borrower_name: String,
    /// 返却期限までの残り秒数（貸出中かつ期限内のみ）
    pub remaining_secs: Option<i64>,
    pub overdue: bool,
}

impl LoanSummary {
    fn build(loan: Loan, book_title: String, borrower_name: String, now: DateTime<Utc>) -> Self {
        let remaining = domain::loan::remaining(&loan, now).map(|d: Duration| d.num_seconds());
        let overdue = domain::loan::is_overdue(&loan, now);
        Self {
            loan,
            book_title,
            borrower_name,
            remaining_secs: remaining,
            overdue,
        }
    }
}

/// 書籍タイトルを引くための表
async fn book_titles(deps: &ServiceDependencies) -> Result<HashMap<BookId, String>> {
    let books = deps
        .catalog
        .list_books()
        .await
        .map_err(ApplicationError::RepositoryError)?;

    Ok(books.into_iter().map(|b| (b.book_id, b.title)).collect())
}

/// 管理者ダッシュボード：全貸出（申請日時の新しい順）
///
/// 削除済みの書籍・利用者は空文字で表示する。
pub async fn admin_dashboard(
    deps: &ServiceDependencies,
    principal: &Principal,
    now: DateTime<Utc>,
) -> Result<Vec<LoanSummary>> {
    require_admin(principal)?;

    let loans = deps
        .loans
        .list_all()
        .await
        .map_err(ApplicationError::RepositoryError)?;

    let titles = book_titles(deps).await?;

    let names: HashMap<UserId, String> = deps
        .users
        .list()
        .await
        .map_err(ApplicationError::RepositoryError)?
        .into_iter()
        .map(|u| (u.user_id, u.name))
        .collect();

    Ok(loans
        .into_iter()
        .map(|loan| {
            let title = titles.get(&loan.book_id).cloned().unwrap_or_default();
            let name = names.get(&loan.user_id).cloned().unwrap_or_default();
            LoanSummary::build(loan, title, name, now)
        })
        .collect())
}

/// 自分の貸出一覧（申請日時の新しい順）
pub async fn my_loans(
    deps: &ServiceDependencies,
    principal: &Principal,
    now: DateTime<Utc>,
) -> Result<Vec<LoanSummary>> {
    let loans = deps
        .loans
        .find_by_user(principal.user_id)
        .await
        .map_err(ApplicationError::RepositoryError)?;

    let titles = book_titles(deps).await?;

    Ok(loans
        .into_iter()
        .map(|loan| {
            let title = titles.get(&loan.book_id).cloned().unwrap_or_default();
            LoanSummary::build(loan, title, principal.name.clone(), now)
        })
        .collect())
}
