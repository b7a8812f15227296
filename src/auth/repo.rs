use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::User;
use crate::error::{AppError, AppResult};

pub const EMAIL_TAKEN: &str = "User already exists";

/// Persistence for user records.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    /// Inserts a new user; a taken email is `AppError::Conflict`.
    async fn insert(&self, user: &User) -> AppResult<User>;
}

pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: &User) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_error)
    }
}

fn map_insert_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        // unique_violation
        if db.code().as_deref() == Some("23505") {
            return AppError::Conflict(EMAIL_TAKEN.into());
        }
    }
    AppError::Database(e)
}
