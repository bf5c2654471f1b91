use crate::domain::loan::Loan;
use crate::domain::value_objects::{BookId, LoanId, LoanStatus, UserId};
use async_trait::async_trait;

use super::Result;

/// 更新前提条件
///
/// 読み取った時点の状態。書き込み時に行がまだこの状態であることを条件にする
/// （楽観的排他制御）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanGuard {
    pub status: LoanStatus,
    pub extended: bool,
}

impl LoanGuard {
    pub fn of(loan: &Loan) -> Self {
        Self {
            status: loan.status,
            extended: loan.extended,
        }
    }

    pub fn matches(&self, loan: &Loan) -> bool {
        self.status == loan.status && self.extended == loan.extended
    }
}

/// 一意性制約の違反内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanConflict {
    /// 同じ書籍のAPPROVEDの貸出が既にある
    BookAlreadyBorrowed,
    /// 同じ利用者・書籍のPENDINGの申請が既にある
    AlreadyRequested,
}

/// 書き込み結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// ストア側の一意性制約により拒否された
    Conflict(LoanConflict),
    /// 前提条件（`LoanGuard`）を満たす行がなかった
    Stale,
}

/// 貸出リポジトリポート
///
/// 「書籍ごとにAPPROVEDは最大1件」「利用者・書籍ごとにPENDINGは最大1件」の
/// 不変条件は、実装側でも（一意性制約またはロックで）保証しなければならない。
/// アプリケーション層の事前チェックだけに頼らない。
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// 新しい貸出を保存する
    async fn insert(&self, loan: &Loan) -> Result<SaveOutcome>;

    /// 貸出を更新する
    ///
    /// 対象行が`guard`の状態でなければ`SaveOutcome::Stale`を返し、何も変更しない。
    async fn update(&self, loan: &Loan, guard: LoanGuard) -> Result<SaveOutcome>;

    /// IDで貸出を取得する
    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// 書籍のAPPROVEDの貸出を取得する
    async fn find_approved_for_book(&self, book_id: BookId) -> Result<Option<Loan>>;

    /// 利用者・書籍のPENDINGの申請を取得する
    async fn find_pending(&self, user_id: UserId, book_id: BookId) -> Result<Option<Loan>>;

    /// 利用者の全貸出（申請日時の新しい順）
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Loan>>;

    /// 全貸出（申請日時の新しい順）
    ///
    /// 管理者ダッシュボードで使用される。
    async fn list_all(&self) -> Result<Vec<Loan>>;

    /// 書籍の貸出件数（状態を問わない）
    ///
    /// 貸出履歴のある書籍の削除を防ぐために使用される。
    async fn count_for_book(&self, book_id: BookId) -> Result<u64>;
}
