use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, warn};

use crate::auth::{
    password::{hash_password, verify_password},
    repo_types::User,
};

/// Password storage seen by the profile view.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn verify_current_password(&self, user_id: i64, plain: &str) -> anyhow::Result<bool>;

    /// Hashes and stores `new_password`. Failures are logged and reported as `false`.
    async fn update_user_password(&self, user_id: i64, new_password: &str) -> bool;
}

#[derive(Clone)]
pub struct PgCredentials {
    db: Option<PgPool>,
}

impl PgCredentials {
    pub fn new(db: Option<PgPool>) -> Self {
        Self { db }
    }

    fn pool(&self) -> anyhow::Result<&PgPool> {
        self.db.as_ref().context("database unavailable")
    }
}

#[async_trait]
impl CredentialStore for PgCredentials {
    async fn verify_current_password(&self, user_id: i64, plain: &str) -> anyhow::Result<bool> {
        let user = User::find_by_id(self.pool()?, user_id)
            .await?
            .with_context(|| format!("user {user_id} not found"))?;
        verify_password(plain, &user.password_hash)
    }

    async fn update_user_password(&self, user_id: i64, new_password: &str) -> bool {
        let db = match self.pool() {
            Ok(db) => db,
            Err(e) => {
                warn!(error = %e, user_id, "password update skipped");
                return false;
            }
        };
        let hash = match hash_password(new_password) {
            Ok(h) => h,
            Err(e) => {
                error!(error = %e, user_id, "hash_password failed");
                return false;
            }
        };
        match User::update_password_hash(db, user_id, &hash).await {
            Ok(true) => true,
            Ok(false) => {
                warn!(user_id, "password update matched no user");
                false
            }
            Err(e) => {
                error!(error = %e, user_id, "update_password_hash failed");
                false
            }
        }
    }
}
