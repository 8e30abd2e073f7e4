use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::accounts::repo_types::User;

/// Request body for registration. Missing fields decode as empty strings and
/// are rejected by validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "userName", alias = "user_name", alias = "username")]
    pub user_name: String,
    pub phone: String,
    pub name: String,
    pub address: String,
    pub city: String,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Partial update; an empty string leaves the stored value untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateAccountRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "userName", alias = "user_name", alias = "username")]
    pub user_name: String,
    pub phone: String,
    pub name: String,
    pub address: String,
    pub city: String,
}

/// Account as returned to clients. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct PublicAccount {
    pub id: Uuid,
    pub email: String,
    pub user_name: String,
    pub phone: String,
    pub name: String,
    pub address: String,
    pub city: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicAccount {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            user_name: u.user_name,
            phone: u.phone,
            name: u.name,
            address: u.address,
            city: u.city,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Lowercase and trim an email the same way on every path that stores or looks one up.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
