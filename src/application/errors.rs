use thiserror::Error;

use crate::domain::{
    ApproveBorrowError, ExtendLoanError, RejectBorrowError, ReturnBookError, ValidationError,
};
use crate::ports::LoanConflict;

/// アプリケーション層のエラー
///
/// すべてのユースケースはこの型の`Result`を返し、呼び出し側（API層）が
/// 利用者向けのメッセージに変換する。
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 認証されていない、または権限が足りない
    #[error("Unauthorized")]
    Unauthorized,

    /// 参照先が存在しない
    #[error("{0} not found")]
    NotFound(&'static str),

    /// 書籍が既に貸出中
    #[error("Book is already borrowed.")]
    AlreadyBorrowed,

    /// 同じ書籍を既に申請済み
    #[error("You already requested this book.")]
    AlreadyRequested,

    /// 既に一度延長済み
    #[error("Loan already extended once.")]
    AlreadyExtended,

    /// 自分の貸出ではない
    #[error("Not your loan.")]
    NotOwner,

    /// 貸出中（APPROVED）ではない
    #[error("Loan is not active.")]
    NotActive,

    /// 申請中（PENDING）ではない
    #[error("Borrow request is no longer pending.")]
    NotPending,

    /// 返却期限が未設定
    #[error("Missing due date.")]
    MissingDueDate,

    /// 貸出履歴のある書籍は削除できない
    #[error("Book has loan history and cannot be deleted.")]
    BookHasLoans,

    /// 入力値が不正
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// メールアドレスが登録済み
    #[error("User already exists.")]
    EmailTaken,

    /// メールアドレスまたはパスワードが違う
    #[error("Invalid email or password.")]
    InvalidCredentials,

    /// リポジトリのエラー
    #[error("Repository error")]
    RepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// 表紙画像ストレージのエラー
    #[error("Cover storage error")]
    CoverStorageError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// パスワードハッシュのエラー
    #[error("Password hashing error: {0}")]
    PasswordHashError(String),
}

impl From<LoanConflict> for ApplicationError {
    fn from(conflict: LoanConflict) -> Self {
        match conflict {
            LoanConflict::BookAlreadyBorrowed => ApplicationError::AlreadyBorrowed,
            LoanConflict::AlreadyRequested => ApplicationError::AlreadyRequested,
        }
    }
}

impl From<ApproveBorrowError> for ApplicationError {
    fn from(err: ApproveBorrowError) -> Self {
        match err {
            ApproveBorrowError::NotPending => ApplicationError::NotPending,
        }
    }
}

impl From<RejectBorrowError> for ApplicationError {
    fn from(err: RejectBorrowError) -> Self {
        match err {
            RejectBorrowError::NotPending => ApplicationError::NotPending,
        }
    }
}

impl From<ReturnBookError> for ApplicationError {
    fn from(err: ReturnBookError) -> Self {
        match err {
            // 他人の貸出かどうかを区別しない（存在の有無を漏らさない）
            ReturnBookError::NotOwner => ApplicationError::Unauthorized,
            ReturnBookError::NotActive => ApplicationError::NotActive,
        }
    }
}

impl From<ExtendLoanError> for ApplicationError {
    fn from(err: ExtendLoanError) -> Self {
        match err {
            ExtendLoanError::NotOwner => ApplicationError::NotOwner,
            ExtendLoanError::AlreadyExtended => ApplicationError::AlreadyExtended,
            ExtendLoanError::NotActive => ApplicationError::NotActive,
            ExtendLoanError::MissingDueDate => ApplicationError::MissingDueDate,
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, ApplicationError>;
