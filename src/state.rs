use crate::auth::credentials::{CredentialStore, PgCredentials};
use crate::config::AppConfig;
use crate::dashboard::repo::{DashboardRepo, PgDashboardRepo};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    /// `None` when the database could not be reached at startup.
    pub db: Option<PgPool>,
    pub config: Arc<AppConfig>,
    pub repo: Arc<dyn DashboardRepo>,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = match config.database_url.as_deref() {
            Some(url) => match sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!(error = %e, "database unreachable; starting in degraded mode");
                    None
                }
            },
            None => {
                warn!("DATABASE_URL not set; starting in degraded mode");
                None
            }
        };

        Ok(Self::from_parts(db, config))
    }

    pub fn from_parts(db: Option<PgPool>, config: Arc<AppConfig>) -> Self {
        let repo = Arc::new(PgDashboardRepo::new(db.clone())) as Arc<dyn DashboardRepo>;
        let credentials = Arc::new(PgCredentials::new(db.clone())) as Arc<dyn CredentialStore>;
        Self {
            db,
            config,
            repo,
            credentials,
        }
    }

    /// State with no database, as when the service starts degraded.
    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            password: crate::config::PasswordConfig::default(),
        });
        Self::from_parts(None, config)
    }
}
