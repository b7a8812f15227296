use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{AuthResponse, LoginRequest, PublicUser, SignupRequest},
    extractors::AuthUser,
    services,
};
use crate::{error::AppResult, extract::ApiJson, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let res = services::signup(state.users.as_ref(), &state.jwt, payload).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let res = services::login(state.users.as_ref(), &state.jwt, payload).await?;
    Ok(Json(res))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = services::current_user(state.users.as_ref(), user_id).await?;
    Ok(Json(user))
}
