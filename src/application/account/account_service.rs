use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::catalog::Book;
use crate::domain::commands::RegisterForm;
use crate::domain::loan::Loan;
use crate::domain::user::{Principal, User};
use crate::domain::value_objects::*;

use super::password::{hash_password, verify_password};
use crate::application::wishlist::wishlist_books;
use crate::application::{ApplicationError, Result, ServiceDependencies, require_admin};

/// 利用者詳細（管理者向け）
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    pub user: Principal,
    pub created_at: DateTime<Utc>,
    pub wishlist: Vec<Book>,
    pub loans: Vec<Loan>,
}

/// 利用者を登録する
///
/// ビジネスルール：
/// - メールアドレス・名前・パスワードはすべて必須
/// - メールアドレスは許可されたドメインのもの
/// - 同じメールアドレスの利用者がいないこと
/// - 役割はSTUDENT（管理者として設定されたメールアドレスのみADMIN）
pub async fn register(
    deps: &ServiceDependencies,
    form: &RegisterForm,
    now: DateTime<Utc>,
) -> Result<Principal> {
    let registration = form.parse(&deps.settings.allowed_email_domains)?;

    let existing = deps
        .users
        .find_by_email(&registration.email)
        .await
        .map_err(ApplicationError::RepositoryError)?;
    if existing.is_some() {
        return Err(ApplicationError::EmailTaken);
    }

    let is_admin = deps
        .settings
        .admin_emails
        .iter()
        .any(|email| email.eq_ignore_ascii_case(&registration.email));

    let user = User {
        user_id: UserId::new(),
        name: registration.name,
        email: registration.email,
        password_hash: hash_password(&registration.password)?,
        role: if is_admin { Role::Admin } else { Role::Student },
        created_at: now,
    };

    // 同時登録はストアの一意性制約で弾かれる
    let inserted = deps
        .users
        .insert(&user)
        .await
        .map_err(ApplicationError::RepositoryError)?;
    if !inserted {
        return Err(ApplicationError::EmailTaken);
    }

    tracing::info!(user_id = %user.user_id, role = %user.role, "User registered");

    Ok(user.principal())
}

/// メールアドレスとパスワードで認証する
///
/// 利用者が存在しない場合もパスワードが違う場合も`InvalidCredentials`。
pub async fn authenticate(
    deps: &ServiceDependencies,
    email: &str,
    password: &str,
) -> Result<Principal> {
    let email = email.trim().to_lowercase();

    let user = deps
        .users
        .find_by_email(&email)
        .await
        .map_err(ApplicationError::RepositoryError)?
        .ok_or(ApplicationError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash)? {
        tracing::debug!(user_id = %user.user_id, "Password mismatch");
        return Err(ApplicationError::InvalidCredentials);
    }

    Ok(user.principal())
}

/// 全利用者（登録の新しい順、管理者のみ）
pub async fn list_users(deps: &ServiceDependencies, principal: &Principal) -> Result<Vec<Principal>> {
    require_admin(principal)?;

    let users = deps
        .users
        .list()
        .await
        .map_err(ApplicationError::RepositoryError)?;

    Ok(users.iter().map(User::principal).collect())
}

/// 利用者詳細：ウィッシュリストと貸出履歴（管理者のみ）
pub async fn user_detail(
    deps: &ServiceDependencies,
    principal: &Principal,
    user_id: UserId,
) -> Result<UserDetail> {
    require_admin(principal)?;

    let user = deps
        .users
        .get_by_id(user_id)
        .await
        .map_err(ApplicationError::RepositoryError)?
        .ok_or(ApplicationError::NotFound("User"))?;

    let wishlist = wishlist_books(deps, user_id).await?;

    let loans = deps
        .loans
        .find_by_user(user_id)
        .await
        .map_err(ApplicationError::RepositoryError)?;

    Ok(UserDetail {
        user: user.principal(),
        created_at: user.created_at,
        wishlist,
        loans,
    })
}
