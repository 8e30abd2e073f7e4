use std::fmt;

use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub user_name: String,
    pub phone: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub password_hash: String, // Argon2 PHC string, never the raw password
    pub created_at: OffsetDateTime,
}

/// Fields of an account about to be inserted. The id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub user_name: String,
    pub phone: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub password_hash: String,
}

/// Columns carrying a unique constraint, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    UserName,
    Phone,
}

impl UniqueField {
    pub const ALL: [UniqueField; 3] = [UniqueField::Email, UniqueField::UserName, UniqueField::Phone];

    pub fn column(self) -> &'static str {
        match self {
            UniqueField::Email => "email",
            UniqueField::UserName => "user_name",
            UniqueField::Phone => "phone",
        }
    }

    /// Maps a Postgres constraint name from the users migration back to its field.
    pub fn from_constraint(name: &str) -> Option<Self> {
        match name {
            "users_email_key" => Some(UniqueField::Email),
            "users_user_name_key" => Some(UniqueField::UserName),
            "users_phone_key" => Some(UniqueField::Phone),
            _ => None,
        }
    }

    pub fn value_of(self, user: &User) -> &str {
        match self {
            UniqueField::Email => &user.email,
            UniqueField::UserName => &user.user_name,
            UniqueField::Phone => &user.phone,
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UniqueField::Email => "email",
            UniqueField::UserName => "username",
            UniqueField::Phone => "phone",
        })
    }
}
