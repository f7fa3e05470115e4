use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::OnceLock;
use thiserror::Error;
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::users;

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("Username or email already exists")]
    Duplicate,

    #[error("User not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// User data returned from repository (without the password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            created_at: model.created_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Register a new user, storing only the Argon2id hash of the password.
    ///
    /// Uniqueness is checked up front for a precise message, and the unique
    /// indexes on username/email still back it up under concurrent inserts.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<User, UserStoreError> {
        let existing = users::Entity::find()
            .filter(
                users::Column::Username
                    .eq(username)
                    .or(users::Column::Email.eq(email)),
            )
            .one(&self.conn)
            .await
            .context("Failed to check for existing user")?;

        if existing.is_some() {
            return Err(UserStoreError::Duplicate);
        }

        let password = password.to_string();
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .context("Password hashing task panicked")?
            .map_err(UserStoreError::Database)?;

        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            created_at: Set(now),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(User::from(model)),
            Err(e) if is_unique_violation(&e) => Err(UserStoreError::Duplicate),
            Err(e) => Err(UserStoreError::Database(
                anyhow::Error::new(e).context("Failed to insert user"),
            )),
        }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Verify login credentials, returning the user on a match.
    ///
    /// Argon2 verification runs in `spawn_blocking` because it is CPU-bound
    /// and would stall the async runtime. When no account matches the email,
    /// a throwaway hash is verified instead so the timing profile does not
    /// reveal whether the account exists.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for login")?;

        let Some(user) = user else {
            let password = password.to_string();
            let _ = task::spawn_blocking(move || verify_hash(&password, dummy_hash())).await;
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || verify_hash(&password, &password_hash))
            .await
            .context("Password verification task panicked")?;

        Ok(is_valid.then(|| User::from(user)))
    }

    /// Verify the password of a known user (current-password check).
    pub async fn verify_password(&self, id: i32, password: &str) -> Result<bool> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || verify_hash(&password, &password_hash))
            .await
            .context("Password verification task panicked")?;

        Ok(is_valid)
    }

    /// Update username and/or email; both stay globally unique.
    pub async fn update_profile(
        &self,
        id: i32,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, UserStoreError> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for profile update")?
            .ok_or(UserStoreError::NotFound)?;

        if let Some(username) = username
            && username != user.username
        {
            let taken = users::Entity::find()
                .filter(users::Column::Username.eq(username))
                .one(&self.conn)
                .await
                .context("Failed to check username uniqueness")?;
            if taken.is_some() {
                return Err(UserStoreError::Duplicate);
            }
        }

        if let Some(email) = email
            && email != user.email
        {
            let taken = users::Entity::find()
                .filter(users::Column::Email.eq(email))
                .one(&self.conn)
                .await
                .context("Failed to check email uniqueness")?;
            if taken.is_some() {
                return Err(UserStoreError::Duplicate);
            }
        }

        let mut active: users::ActiveModel = user.into();
        if let Some(username) = username {
            active.username = Set(username.to_string());
        }
        if let Some(email) = email {
            active.email = Set(email.to_string());
        }

        match active.update(&self.conn).await {
            Ok(model) => Ok(User::from(model)),
            Err(e) if is_unique_violation(&e) => Err(UserStoreError::Duplicate),
            Err(e) => Err(UserStoreError::Database(
                anyhow::Error::new(e).context("Failed to update user profile"),
            )),
        }
    }

    /// Update password for a user (hashes the new password)
    pub async fn update_password(
        &self,
        id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let password = new_password.to_string();
        let security = security.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .context("Password hashing task panicked")??;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.update(&self.conn).await?;

        Ok(())
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the crate defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

fn verify_hash(password: &str, password_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    err.to_string().contains("UNIQUE constraint")
}

fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_password("tally-dummy", None).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        };

        let hash = hash_password("correct horse battery", Some(&security)).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_hash("correct horse battery", &hash));
        assert!(!verify_hash("correct horse battery!", &hash));
        assert!(!verify_hash("", &hash));
    }

    #[test]
    fn test_verify_against_malformed_hash() {
        assert!(!verify_hash("anything", "not-a-phc-string"));
    }
}
