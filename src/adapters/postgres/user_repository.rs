use crate::domain::user::User;
use crate::domain::value_objects::{Role, UserId};
use crate::ports::user_repository::UserRepository as UserRepositoryTrait;
use crate::ports::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::{invalid_data, violated_unique_constraint};

fn map_row_to_user(row: &PgRow) -> Result<User> {
    let role_str: &str = row.get("role");
    let role = Role::from_str(role_str).map_err(invalid_data)?;

    Ok(User {
        user_id: UserId::from_uuid(row.get("user_id")),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        created_at: row.get("created_at"),
    })
}

/// UserRepositoryのPostgreSQL実装
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn insert(&self, user: &User) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (user_id, name, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.user_id.value())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if violated_unique_constraint(&e).as_deref() == Some("users_email_key") => {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, name, email, password_hash, role, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, name, email, password_hash, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_user).transpose()
    }

    async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, name, email, password_hash, role, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_user).collect()
    }
}
