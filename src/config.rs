use anyhow::Context;
use serde::Deserialize;

/// Upper bound on token lifetime: one year.
pub const MAX_JWT_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

impl JwtConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.ttl_minutes > 0, "JWT_TTL_MINUTES must be positive");
        anyhow::ensure!(
            self.ttl_minutes <= MAX_JWT_TTL_MINUTES,
            "JWT_TTL_MINUTES must be at most {MAX_JWT_TTL_MINUTES}"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres connection string; `None` runs on the in-process store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        anyhow::ensure!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "taskboard".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "taskboard-users".into()),
            ttl_minutes: parse_var("JWT_TTL_MINUTES", 60 * 24)?,
        };
        jwt.validate()?;

        Ok(Self {
            database_url,
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("APP_PORT", 5000)?,
            jwt,
        })
    }

    /// Config for tests and local tooling: in-memory store, fixed secret.
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_when_unset() {
        let v: u16 = parse_var("TASKBOARD_TEST_SURELY_UNSET_VAR", 4242).unwrap();
        assert_eq!(v, 4242);
    }

    #[test]
    fn jwt_ttl_must_be_within_bounds() {
        let mut jwt = AppConfig::for_tests().jwt;
        assert!(jwt.validate().is_ok());

        jwt.ttl_minutes = MAX_JWT_TTL_MINUTES;
        assert!(jwt.validate().is_ok());

        for bad in [0, -1, MAX_JWT_TTL_MINUTES + 1, i64::MAX] {
            jwt.ttl_minutes = bad;
            assert!(jwt.validate().is_err(), "ttl {bad} accepted");
        }
    }

    #[test]
    fn parse_var_rejects_garbage() {
        std::env::set_var("TASKBOARD_TEST_BAD_PORT", "not-a-port");
        let err = parse_var::<u16>("TASKBOARD_TEST_BAD_PORT", 1).unwrap_err();
        assert!(err.to_string().contains("TASKBOARD_TEST_BAD_PORT"));
    }
}
