use std::sync::Arc;

use crate::domain::loan::LoanPolicy;
use crate::domain::user::Principal;
use crate::ports::*;

use super::errors::{ApplicationError, Result};

/// ユースケースの設定値
#[derive(Debug, Clone, Default)]
pub struct ServiceSettings {
    pub loan_policy: LoanPolicy,
    /// 登録を許可するメールドメイン（空なら制限なし）
    pub allowed_email_domains: Vec<String>,
    /// 登録時に管理者権限を与えるメールアドレス
    pub admin_emails: Vec<String>,
}

/// サービスの依存関係
///
/// 振る舞い（メソッド）は持たず、各ユースケース関数に引数として渡す。
/// すべての依存が明示的になり、テストではメモリ実装に差し替えられる。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub loans: Arc<dyn LoanRepository>,
    pub wishlists: Arc<dyn WishlistRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub users: Arc<dyn UserRepository>,
    pub covers: Arc<dyn CoverStorage>,
    pub views: Arc<dyn ViewInvalidator>,
    pub settings: ServiceSettings,
}

/// 管理者であることを要求する
///
/// 対象の存在確認より先に呼ぶこと（存在の有無を漏らさない）。
pub(crate) fn require_admin(principal: &Principal) -> Result<()> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(ApplicationError::Unauthorized)
    }
}
