use thiserror::Error;

/// 承認のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApproveBorrowError {
    /// 申請中（PENDING）ではない
    NotPending,
}

/// 却下のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectBorrowError {
    /// 申請中（PENDING）ではない
    NotPending,
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnBookError {
    /// 借りた本人ではない
    NotOwner,
    /// 貸出中（APPROVED）ではない
    NotActive,
}

/// 延長のエラー
///
/// チェックは宣言順に行われ、最初に該当したものが返る。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendLoanError {
    /// 借りた本人ではない
    NotOwner,
    /// 既に延長済み
    AlreadyExtended,
    /// 貸出中（APPROVED）ではない
    NotActive,
    /// 返却期限が未設定
    MissingDueDate,
}

/// 入力フォームの検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 必須項目が未入力
    #[error("All fields are required (missing: {})", .0.join(", "))]
    MissingFields(Vec<String>),

    /// 出版年が数値ではない
    #[error("Invalid year.")]
    InvalidYear,

    /// IDの形式が不正
    #[error("Invalid {0} id.")]
    InvalidId(&'static str),

    /// メールアドレスの形式が不正
    #[error("Invalid email address.")]
    InvalidEmail,

    /// 許可されていないドメインのメールアドレス
    #[error("Email must belong to one of: {}", .0.join(", "))]
    EmailDomainNotAllowed(Vec<String>),

    /// 名前が空
    #[error("{0} name is required.")]
    NameRequired(&'static str),
}
