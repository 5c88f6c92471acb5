use sqlx::SqlitePool;
use tracing::{debug, info, instrument, warn};

use crate::auth::{
    error::AuthError,
    password::{hash_in_background, verify_in_background},
    repo::ensure_schema,
    repo_types::{PublicUser, User},
};

/// Durable, email-keyed storage of user credentials.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    db: SqlitePool,
}

impl CredentialStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    pub async fn ensure_schema(&self) -> Result<(), AuthError> {
        ensure_schema(&self.db).await?;
        debug!("users table ready");
        Ok(())
    }

    #[instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<PublicUser, AuthError> {
        let hash = hash_in_background(password).await?;
        match User::create(&self.db, email, &hash, full_name).await {
            Ok(user) => {
                info!(user_id = user.id, "user registered");
                Ok(user.into())
            }
            Err(AuthError::DuplicateUser) => {
                warn!("email already registered");
                Err(AuthError::DuplicateUser)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        User::find_by_email(&self.db, email).await
    }

    /// Unknown email and wrong password produce the same error.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<PublicUser, AuthError> {
        let user = self.find_by_email(email).await?;
        let stored = user.as_ref().map(|u| u.hashed_password.clone());

        match (verify_in_background(password, stored).await, user) {
            (true, Some(user)) => {
                info!(user_id = user.id, "user authenticated");
                Ok(user.into())
            }
            _ => {
                warn!("login failed");
                Err(AuthError::AuthenticationFailed)
            }
        }
    }
}
