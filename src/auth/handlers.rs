use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        extractors::CurrentSession,
        repo_types::PublicUser,
        services::{self, AuthResponse},
    },
    error::ServiceResult,
    extract::ApiJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ServiceResult<(StatusCode, Json<AuthResponse>)> {
    let res = services::register(&state, &payload.name, &payload.email, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ServiceResult<Json<AuthResponse>> {
    let res = services::login(&state, &payload.email, &payload.password).await?;
    Ok(Json(res))
}

#[instrument(skip(state, session), fields(user_id = %session.user.id))]
pub async fn logout(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ServiceResult<StatusCode> {
    services::logout(&state, session.user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reads the profile from the user store, not the session cache.
#[instrument(skip(state, session), fields(user_id = %session.user.id))]
pub async fn get_me(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ServiceResult<Json<PublicUser>> {
    let user = services::get_user(&state, session.user.id).await?;
    Ok(Json(user))
}
