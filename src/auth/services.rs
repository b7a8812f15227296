use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    dto::{AuthResponse, LoginRequest, PublicUser, SignupRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_dummy, verify_password},
    repo::{UserRepo, EMAIL_TAKEN},
    repo_types::User,
};
use crate::error::{AppError, AppResult};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates the user (hashing the password first) and issues a token.
pub async fn signup(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    req: SignupRequest,
) -> AppResult<AuthResponse> {
    let name = req.name.trim();
    let email = normalize_email(&req.email);

    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("Please add all fields".into()));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict(EMAIL_TAKEN.into()));
    }

    let password_hash = hash_password(&req.password)?;
    let now = OffsetDateTime::now_utc();
    let user = users
        .insert(&User {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        })
        .await?;

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok(AuthResponse {
        user: PublicUser::from(&user),
        token,
    })
}

/// Unknown email and wrong password fail identically.
pub async fn login(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    req: LoginRequest,
) -> AppResult<AuthResponse> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Please provide email and password".into(),
        ));
    }

    let Some(user) = users.find_by_email(&email).await? else {
        verify_dummy(&req.password);
        warn!(email = %email, "login unknown email");
        return Err(AppError::Auth(INVALID_CREDENTIALS.into()));
    };

    match verify_password(&req.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::Auth(INVALID_CREDENTIALS.into()));
        }
        Err(e) => {
            error!(user_id = %user.id, error = %e, "stored password hash unreadable");
            return Err(AppError::Auth(INVALID_CREDENTIALS.into()));
        }
    }

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse {
        user: PublicUser::from(&user),
        token,
    })
}

/// Profile of the token's subject. A token outliving its user is an auth failure.
pub async fn current_user(users: &dyn UserRepo, user_id: Uuid) -> AppResult<PublicUser> {
    users
        .find_by_id(user_id)
        .await?
        .map(|u| PublicUser::from(&u))
        .ok_or_else(|| {
            warn!(%user_id, "token subject not found");
            AppError::Auth("Not authorized, user not found".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, memory::MemoryUserRepo};

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&AppConfig::for_tests().jwt)
    }

    fn signup_req(name: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a x@y.com"));
        assert!(!is_valid_email("no-at-sign.com"));
    }

    #[tokio::test]
    async fn signup_then_duplicate_is_conflict_and_login_still_works() {
        let users = MemoryUserRepo::default();
        let keys = keys();

        let res = signup(&users, &keys, signup_req("A", "a@x.com", "secret1"))
            .await
            .expect("signup");
        assert_eq!(res.user.email, "a@x.com");
        assert_eq!(keys.verify(&res.token).unwrap().sub, res.user.id);

        let dup = signup(&users, &keys, signup_req("B", " A@X.com ", "other"))
            .await
            .unwrap_err();
        assert!(matches!(dup, AppError::Conflict(ref m) if m == EMAIL_TAKEN));

        let logged_in = login(&users, &keys, login_req("a@x.com", "secret1"))
            .await
            .expect("login");
        assert_eq!(logged_in.user.id, res.user.id);
        assert_eq!(logged_in.user.name, "A");
    }

    #[tokio::test]
    async fn signup_requires_every_field() {
        let users = MemoryUserRepo::default();
        for req in [
            signup_req("", "a@x.com", "pw"),
            signup_req("   ", "a@x.com", "pw"),
            signup_req("A", "", "pw"),
            signup_req("A", "a@x.com", ""),
            signup_req("A", "not-an-email", "pw"),
        ] {
            let err = signup(&users, &keys(), req).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
        }
        assert!(users.find_by_email("a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let users = MemoryUserRepo::default();
        let keys = keys();
        signup(&users, &keys, signup_req("A", "a@x.com", "secret1"))
            .await
            .unwrap();

        let wrong_pw = login(&users, &keys, login_req("a@x.com", "wrong"))
            .await
            .unwrap_err();
        let unknown = login(&users, &keys, login_req("nobody@x.com", "secret1"))
            .await
            .unwrap_err();
        for err in [wrong_pw, unknown] {
            assert!(matches!(err, AppError::Auth(ref m) if m == INVALID_CREDENTIALS));
        }

        let missing = login(&users, &keys, login_req("a@x.com", "")).await.unwrap_err();
        assert!(matches!(missing, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn corrupt_stored_hash_fails_like_a_wrong_password() {
        let users = MemoryUserRepo::default();
        let now = OffsetDateTime::now_utc();
        users
            .insert(&User {
                id: Uuid::new_v4(),
                name: "A".into(),
                email: "a@x.com".into(),
                password_hash: "not-a-valid-hash".into(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let err = login(&users, &keys(), login_req("a@x.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(ref m) if m == INVALID_CREDENTIALS));
    }

    #[tokio::test]
    async fn current_user_of_unknown_subject_is_auth_error() {
        let users = MemoryUserRepo::default();
        let err = current_user(&users, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }
}
