use crate::domain::user::User;
use crate::domain::value_objects::UserId;
use crate::ports::user_repository::UserRepository as UserRepositoryTrait;
use crate::ports::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::poisoned;

/// UserRepositoryのメモリ実装
pub struct UserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl UserRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for UserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn insert(&self, user: &User) -> Result<bool> {
        let mut users = self.users.lock().map_err(poisoned)?;

        if users.values().any(|u| u.email == user.email) {
            return Ok(false);
        }

        users.insert(user.user_id, user.clone());
        Ok(true)
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<User>> {
        let users = self.users.lock().map_err(poisoned)?;
        Ok(users.get(&user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.lock().map_err(poisoned)?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>> {
        let users = self.users.lock().map_err(poisoned)?;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}
