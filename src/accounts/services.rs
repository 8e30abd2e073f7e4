use std::sync::Arc;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::accounts::{
    dto::{normalize_email, LoginRequest, PublicAccount, RegisterRequest, UpdateAccountRequest},
    errors::AccountError,
    password::{hash_password, verify_password},
    repo::UserStore,
    repo_types::{NewUser, UniqueField, User},
    tokens::{TokenIssuer, TokenPair},
    validation::{validate_login, validate_registration, validate_update},
};

/// Register, login, read, update and delete accounts.
///
/// Each call is an independent unit of work against the store. Uniqueness is
/// checked up front for a friendly error, and the store's unique constraints
/// settle any race between concurrent requests.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    tokens: TokenIssuer,
}

impl AccountService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenIssuer) -> Self {
        Self { store, tokens }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    #[instrument(skip_all)]
    pub async fn register(&self, mut req: RegisterRequest) -> Result<TokenPair, AccountError> {
        req.email = normalize_email(&req.email);

        if let Err(e) = validate_registration(&req) {
            warn!(error = %e, "registration rejected");
            return Err(e.into());
        }

        self.ensure_unique(
            &[
                (UniqueField::Email, req.email.as_str()),
                (UniqueField::UserName, req.user_name.as_str()),
                (UniqueField::Phone, req.phone.as_str()),
            ],
            None,
        )
        .await?;

        let password_hash = hash_off_thread(req.password).await?;

        let user = self
            .store
            .create(NewUser {
                email: req.email,
                user_name: req.user_name,
                phone: req.phone,
                name: req.name,
                address: req.address,
                city: req.city,
                password_hash,
            })
            .await
            .map_err(|e| {
                warn!(error = %e, "create user failed");
                AccountError::from(e)
            })?;

        let pair = self.tokens.issue(user.id)?;
        info!(user_id = %user.id, "user registered");
        Ok(pair)
    }

    #[instrument(skip_all)]
    pub async fn login(&self, mut req: LoginRequest) -> Result<TokenPair, AccountError> {
        req.email = normalize_email(&req.email);
        validate_login(&req)?;

        let user = match self.store.find_by_field(UniqueField::Email, &req.email).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!("login unknown email");
                return Err(AccountError::Unauthorized);
            }
            Err(e) => {
                error!(error = %e, "find_by_email failed");
                return Err(e.into());
            }
        };

        if !verify_off_thread(req.password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AccountError::Unauthorized);
        }

        let pair = self.tokens.issue(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(pair)
    }

    #[instrument(skip(self))]
    pub async fn get_account(&self, id: Uuid) -> Result<PublicAccount, AccountError> {
        self.load(id).await.map(PublicAccount::from)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_account(
        &self,
        id: Uuid,
        mut changes: UpdateAccountRequest,
    ) -> Result<PublicAccount, AccountError> {
        let mut user = self.load(id).await?;

        if !changes.email.is_empty() {
            changes.email = normalize_email(&changes.email);
        }
        if let Err(e) = validate_update(&changes) {
            warn!(error = %e, user_id = %id, "update rejected");
            return Err(e.into());
        }

        {
            // only values that actually change need a uniqueness lookup
            let candidates: Vec<(UniqueField, &str)> = [
                (UniqueField::Email, changes.email.as_str()),
                (UniqueField::UserName, changes.user_name.as_str()),
                (UniqueField::Phone, changes.phone.as_str()),
            ]
            .into_iter()
            .filter(|(field, value)| !value.is_empty() && *value != field.value_of(&user))
            .collect();
            self.ensure_unique(&candidates, Some(id)).await?;
        }

        overwrite_if_set(&mut user.email, changes.email);
        overwrite_if_set(&mut user.phone, changes.phone);
        overwrite_if_set(&mut user.name, changes.name);
        overwrite_if_set(&mut user.city, changes.city);
        overwrite_if_set(&mut user.address, changes.address);
        overwrite_if_set(&mut user.user_name, changes.user_name);
        if !changes.password.is_empty() {
            user.password_hash = hash_off_thread(changes.password).await?;
        }

        let updated = self.store.update(&user).await.map_err(|e| {
            warn!(error = %e, user_id = %id, "update user failed");
            AccountError::from(e)
        })?;
        info!(user_id = %id, "user updated");
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_account(&self, id: Uuid) -> Result<(), AccountError> {
        let user = self.load(id).await?;
        self.store.delete(user.id).await.map_err(|e| {
            error!(error = %e, user_id = %id, "delete user failed");
            AccountError::from(e)
        })?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<User, AccountError> {
        match self.store.find_by_id(id).await {
            Ok(Some(u)) => Ok(u),
            Ok(None) => Err(AccountError::NotFound),
            Err(e) => {
                error!(error = %e, user_id = %id, "find_by_id failed");
                Err(e.into())
            }
        }
    }

    /// First field already held by another account wins. A failed lookup is an
    /// error, never "available".
    async fn ensure_unique(
        &self,
        fields: &[(UniqueField, &str)],
        owner: Option<Uuid>,
    ) -> Result<(), AccountError> {
        for &(field, value) in fields {
            match self.store.find_by_field(field, value).await {
                Ok(Some(existing)) if Some(existing.id) != owner => {
                    warn!(field = %field, "value already registered");
                    return Err(AccountError::Conflict(field));
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, field = %field, "uniqueness lookup failed");
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }
}

// Argon2 is CPU-bound, so both directions run on the blocking pool.
async fn hash_off_thread(plain: String) -> Result<String, AccountError> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| {
            error!(error = %e, "hash task failed");
            AccountError::Internal(e.to_string())
        })?
        .map_err(|e| {
            error!(error = %e, "hash_password failed");
            AccountError::Internal(e.to_string())
        })
}

async fn verify_off_thread(plain: String, hash: String) -> Result<bool, AccountError> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .map_err(|e| {
            error!(error = %e, "verify task failed");
            AccountError::Internal(e.to_string())
        })
}

fn overwrite_if_set(slot: &mut String, value: String) {
    if !value.is_empty() {
        *slot = value;
    }
}
