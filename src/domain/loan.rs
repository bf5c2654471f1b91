use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{
    ApproveBorrowError, BookId, ExtendLoanError, LoanId, LoanStatus, RejectBorrowError,
    ReturnBookError, UserId,
};

/// 延長期間（日数）
///
/// 延長は現在の返却期限からこの日数だけ後ろにずらす。設定では変更できない。
pub const EXTENSION_DAYS: i64 = 7;

/// 貸出期間のデフォルト（日数）
pub const DEFAULT_LOAN_PERIOD_DAYS: i64 = 7;

/// 貸出ポリシー
///
/// 貸出期間はデプロイ時の設定値（本番は7日、動作確認では1分など）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanPolicy {
    loan_period: Duration,
}

impl LoanPolicy {
    pub fn new(loan_period: Duration) -> Self {
        Self { loan_period }
    }

    pub fn loan_period(&self) -> Duration {
        self.loan_period
    }

    /// 承認日時から返却期限を計算する
    pub fn due_date_from(&self, approved_at: DateTime<Utc>) -> DateTime<Utc> {
        approved_at + self.loan_period
    }
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self::new(Duration::days(DEFAULT_LOAN_PERIOD_DAYS))
    }
}

/// Loan集約 - 1人の利用者による1冊の書籍の1回の貸出サイクル
///
/// 不変条件：
/// - `approved_at` と `due_date` は PENDING → APPROVED の遷移でのみ、同時に設定される
/// - `returned_at` は APPROVED → RETURNED の遷移でのみ設定される
/// - `extended` は APPROVED の間に一度だけ false → true になる
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,

    // 他の集約への参照（IDのみ、作成後は不変）
    pub user_id: UserId,
    pub book_id: BookId,

    pub status: LoanStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub extended: bool,
}

/// 純粋関数：貸出を申請する
///
/// 重複申請・貸出中チェックは永続化層の状態に依存するため、
/// アプリケーション層で行う。ここでは新しいPENDINGの貸出を作るだけ。
pub fn request_borrow(book_id: BookId, user_id: UserId, requested_at: DateTime<Utc>) -> Loan {
    Loan {
        loan_id: LoanId::new(),
        user_id,
        book_id,
        status: LoanStatus::Pending,
        requested_at,
        approved_at: None,
        due_date: None,
        returned_at: None,
        extended: false,
    }
}

/// 純粋関数：貸出申請を承認する
///
/// ビジネスルール：
/// - PENDINGのみ承認できる
/// - 返却期限 = 承認日時 + 貸出期間
pub fn approve_borrow(
    loan: &Loan,
    approved_at: DateTime<Utc>,
    policy: &LoanPolicy,
) -> Result<Loan, ApproveBorrowError> {
    if loan.status != LoanStatus::Pending {
        return Err(ApproveBorrowError::NotPending);
    }

    Ok(Loan {
        status: LoanStatus::Approved,
        approved_at: Some(approved_at),
        due_date: Some(policy.due_date_from(approved_at)),
        ..loan.clone()
    })
}

/// 純粋関数：貸出申請を却下する
///
/// 承認日時・返却期限は設定しない。
pub fn reject_borrow(loan: &Loan) -> Result<Loan, RejectBorrowError> {
    if loan.status != LoanStatus::Pending {
        return Err(RejectBorrowError::NotPending);
    }

    Ok(Loan {
        status: LoanStatus::Rejected,
        ..loan.clone()
    })
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - 借りた本人のみ返却できる
/// - APPROVEDのみ返却できる（延滞していても受け付ける）
pub fn return_book(
    loan: &Loan,
    acting_user: UserId,
    returned_at: DateTime<Utc>,
) -> Result<Loan, ReturnBookError> {
    if loan.user_id != acting_user {
        return Err(ReturnBookError::NotOwner);
    }

    if loan.status != LoanStatus::Approved {
        return Err(ReturnBookError::NotActive);
    }

    Ok(Loan {
        status: LoanStatus::Returned,
        returned_at: Some(returned_at),
        ..loan.clone()
    })
}

/// 純粋関数：貸出を延長する
///
/// チェック順序（最初に該当したエラーを返す）：
/// 1. 借りた本人であること
/// 2. まだ延長していないこと
/// 3. APPROVEDであること
/// 4. 返却期限が設定されていること
///
/// 新しい返却期限は現在の返却期限 + 7日（現在時刻基準ではない）。
pub fn extend_loan(loan: &Loan, acting_user: UserId) -> Result<Loan, ExtendLoanError> {
    if loan.user_id != acting_user {
        return Err(ExtendLoanError::NotOwner);
    }

    if loan.extended {
        return Err(ExtendLoanError::AlreadyExtended);
    }

    if loan.status != LoanStatus::Approved {
        return Err(ExtendLoanError::NotActive);
    }

    let due_date = loan.due_date.ok_or(ExtendLoanError::MissingDueDate)?;

    Ok(Loan {
        due_date: Some(due_date + Duration::days(EXTENSION_DAYS)),
        extended: true,
        ..loan.clone()
    })
}

/// 純粋関数：延滞判定
pub fn is_overdue(loan: &Loan, now: DateTime<Utc>) -> bool {
    match (loan.status, loan.due_date) {
        (LoanStatus::Approved, Some(due_date)) => now > due_date,
        _ => false,
    }
}

/// 純粋関数：返却期限までの残り時間
///
/// 貸出中でない、または既に期限切れの場合は`None`。
pub fn remaining(loan: &Loan, now: DateTime<Utc>) -> Option<Duration> {
    match (loan.status, loan.due_date) {
        (LoanStatus::Approved, Some(due_date)) if due_date > now => Some(due_date - now),
        _ => None,
    }
}
