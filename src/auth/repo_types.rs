use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record as stored.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,              // normalised: trimmed, lowercase
    pub password_hash: String,      // Argon2 PHC string, never leaves the server
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
