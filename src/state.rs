use crate::auth::{
    jwt::JwtKeys,
    repo::{PgUserRepo, UserRepo},
};
use crate::config::AppConfig;
use crate::memory::{MemoryTaskRepo, MemoryUserRepo};
use crate::tasks::repo::{PgTaskRepo, TaskRepo};
use anyhow::Context;
use axum::extract::FromRef;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub jwt: JwtKeys,
    pub users: Arc<dyn UserRepo>,
    pub tasks: Arc<dyn TaskRepo>,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl AppState {
    /// Connects to Postgres when configured, otherwise falls back to the
    /// in-process store. The pool is handed back so the caller can migrate it.
    pub async fn init(config: &AppConfig) -> anyhow::Result<(Self, Option<PgPool>)> {
        let Some(url) = config.database_url.as_deref() else {
            tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on exit");
            return Ok((Self::in_memory(config), None));
        };

        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await
            .context("connect to database")?;

        Ok((Self::from_pool(db.clone(), config), Some(db)))
    }

    pub fn from_pool(db: PgPool, config: &AppConfig) -> Self {
        Self {
            jwt: JwtKeys::from_config(&config.jwt),
            users: Arc::new(PgUserRepo::new(db.clone())),
            tasks: Arc::new(PgTaskRepo::new(db)),
        }
    }

    pub fn in_memory(config: &AppConfig) -> Self {
        Self {
            jwt: JwtKeys::from_config(&config.jwt),
            users: Arc::new(MemoryUserRepo::default()),
            tasks: Arc::new(MemoryTaskRepo::default()),
        }
    }

    pub fn fake() -> Self {
        Self::in_memory(&AppConfig::for_tests())
    }
}
