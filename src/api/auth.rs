use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::user::Principal;
use crate::domain::value_objects::{Role, UserId};

use super::error::ApiError;
use super::handlers::AppState;

/// トークン発行の設定
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

/// セッショントークンのクレーム（HS256）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_principal(principal: &Principal, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            sub: principal.user_id.value(),
            name: principal.name.clone(),
            email: principal.email.clone(),
            role: principal.role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// 署名と有効期限を検証してクレームを取り出す
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn principal(&self) -> Principal {
        Principal {
            user_id: UserId::from_uuid(self.sub),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// 利用者のトークンを発行する
pub fn issue_token(settings: &AuthSettings, principal: &Principal) -> Result<String, ApiError> {
    let claims = Claims::for_principal(
        principal,
        Duration::hours(settings.token_ttl_hours),
        Utc::now(),
    );
    claims.create_token(&settings.jwt_secret).map_err(|e| {
        tracing::error!("Failed to sign token: {}", e);
        ApiError::Internal
    })
}

/// `Authorization: Bearer <token>` を読み取る
///
/// ヘッダーがなければ`None`、形式や署名が不正ならエラー。
fn bearer_principal(parts: &Parts, settings: &AuthSettings) -> Result<Option<Principal>, ApiError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            ApiError::Authentication("Invalid authorization header format".to_string())
        })?;

    let claims = Claims::from_token(token.trim(), &settings.jwt_secret)
        .map_err(|e| ApiError::Authentication(e.to_string()))?;

    Ok(Some(claims.principal()))
}

/// ログイン必須のエンドポイント用
pub struct Authenticated(pub Principal);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        bearer_principal(parts, &state.auth)?
            .map(Authenticated)
            .ok_or_else(|| ApiError::Authentication("Missing authorization header".to_string()))
    }
}

/// ログインしていなくてもよいエンドポイント用
pub struct MaybeAuthenticated(pub Option<Principal>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeAuthenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthenticated(bearer_principal(parts, &state.auth)?))
    }
}
