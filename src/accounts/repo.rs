use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::accounts::repo_types::{NewUser, UniqueField, User};

const USER_COLUMNS: &str = "id, email, user_name, phone, name, address, city, password_hash, created_at";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} already taken")]
    UniqueViolation(UniqueField),
    #[error("user not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                if let Some(field) = db.constraint().and_then(UniqueField::from_constraint) {
                    return StoreError::UniqueViolation(field);
                }
            }
        }
        StoreError::Database(e)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence port for user accounts.
///
/// Lookups return `Ok(None)` for a missing row; `Err` always means the store
/// could not answer.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> StoreResult<User>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_by_field(&self, field: UniqueField, value: &str) -> StoreResult<Option<User>>;
    async fn update(&self, user: &User) -> StoreResult<User>;
    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    /// Insert a new user, generating its id.
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, user_name, phone, name, address, city, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.user_name)
        .bind(&user.phone)
        .bind(&user.name)
        .bind(&user.address)
        .bind(&user.city)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_field(&self, field: UniqueField, value: &str) -> StoreResult<Option<User>> {
        // column names come from a closed enum, never from input
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {} = $1", field.column());
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn update(&self, user: &User) -> StoreResult<User> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET email = $2, user_name = $3, phone = $4, name = $5,
                   address = $6, city = $7, password_hash = $8
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.user_name)
        .bind(&user.phone)
        .bind(&user.name)
        .bind(&user.address)
        .bind(&user.city)
        .bind(&user.password_hash)
        .fetch_optional(&self.db)
        .await?;
        updated.ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_names_map_to_fields() {
        assert_eq!(UniqueField::from_constraint("users_email_key"), Some(UniqueField::Email));
        assert_eq!(
            UniqueField::from_constraint("users_user_name_key"),
            Some(UniqueField::UserName)
        );
        assert_eq!(UniqueField::from_constraint("users_phone_key"), Some(UniqueField::Phone));
        assert_eq!(UniqueField::from_constraint("users_pkey"), None);
    }

    #[test]
    fn non_constraint_errors_stay_database_errors() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Database(_)));
    }
}
