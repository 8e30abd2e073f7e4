//! In-memory `UserStore` for tests. Enforces the same unique constraints as
//! the users table and can simulate an unreachable database.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{StoreError, StoreResult, UserStore};
use super::repo_types::{NewUser, UniqueField, User};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
    offline: AtomicBool,
    lookups_failing: AtomicBool,
}

impl MemoryUserStore {
    /// Make every subsequent call fail as if the database were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fail only `find_by_field`, leaving id lookups and writes working.
    pub fn set_lookups_failing(&self, failing: bool) {
        self.lookups_failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn check_unique(users: &HashMap<Uuid, User>, candidate: &User) -> StoreResult<()> {
        for field in UniqueField::ALL {
            let taken = users
                .values()
                .any(|u| u.id != candidate.id && field.value_of(u) == field.value_of(candidate));
            if taken {
                return Err(StoreError::UniqueViolation(field));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        self.check_online()?;
        let record = User {
            id: Uuid::new_v4(),
            email: user.email,
            user_name: user.user_name,
            phone: user.phone,
            name: user.name,
            address: user.address,
            city: user.city,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        let mut users = self.users.lock().unwrap();
        Self::check_unique(&users, &record)?;
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.check_online()?;
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_field(&self, field: UniqueField, value: &str) -> StoreResult<Option<User>> {
        self.check_online()?;
        if self.lookups_failing.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| field.value_of(u) == value)
            .cloned())
    }

    async fn update(&self, user: &User) -> StoreResult<User> {
        self.check_online()?;
        let mut users = self.users.lock().unwrap();
        if !users.contains_key(&user.id) {
            return Err(StoreError::NotFound);
        }
        Self::check_unique(&users, user)?;
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.check_online()?;
        self.users
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
