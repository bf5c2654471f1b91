mod account_service;
mod password;

pub use account_service::{UserDetail, authenticate, list_users, register, user_detail};
pub use password::hash_password;
