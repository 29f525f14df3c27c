use axum::extract::FromRef;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        claims::Claims,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::PublicUser,
    },
    error::{ServiceError, ServiceResult},
    state::AppState,
    validation::{normalize_email, validate_user, RegistrationInput},
};

/// Returned by login and register.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Mints a token for `user` and caches the profile under `user:<id>`.
async fn start_session(
    state: &AppState,
    user: PublicUser,
    context: &'static str,
) -> ServiceResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let token = keys
        .sign(user.id)
        .map_err(|e| ServiceError::storage(context, e))?;

    if let Err(e) = state.sessions.put(&user).await {
        warn!(error = %e, user_id = %user.id, "session cache write failed");
    }

    Ok(AuthResponse { token, user })
}

#[instrument(skip(state, password))]
pub async fn login(state: &AppState, email: &str, password: &str) -> ServiceResult<AuthResponse> {
    let email = normalize_email(email);

    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| ServiceError::storage("Error logging in", e))?
        .ok_or_else(|| {
            warn!(email = %email, "login unknown email");
            ServiceError::InvalidCredentials
        })?;

    let ok = verify_password(password.to_string(), user.password_hash.clone())
        .await
        .map_err(|e| ServiceError::storage("Error logging in", e))?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ServiceError::InvalidCredentials);
    }

    let res = start_session(state, user.into(), "Error logging in").await?;
    info!(user_id = %res.user.id, "user logged in");
    Ok(res)
}

#[instrument(skip(state, password))]
pub async fn register(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
) -> ServiceResult<AuthResponse> {
    let new_user = validate_user(RegistrationInput {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    })
    .map_err(ServiceError::Validation)?;

    let existing = state
        .users
        .find_by_email(&new_user.email)
        .await
        .map_err(|e| ServiceError::storage("Error registering user", e))?;
    if existing.is_some() {
        warn!(email = %new_user.email, "email already registered");
        return Err(ServiceError::UserAlreadyExists(new_user.email));
    }

    let hash = hash_password(new_user.password)
        .await
        .map_err(|e| ServiceError::storage("Error registering user", e))?;

    let user = state
        .users
        .insert(&new_user.name, &new_user.email, &hash)
        .await
        .map_err(|e| ServiceError::storage("Error registering user", e))?
        // lost a race with a concurrent registration
        .ok_or_else(|| ServiceError::UserAlreadyExists(new_user.email.clone()))?;

    let res = start_session(state, user.into(), "Error registering user").await?;
    info!(user_id = %res.user.id, "user registered");
    Ok(res)
}

/// Drops the cached profile. The bearer token itself stays valid until it
/// expires.
#[instrument(skip(state))]
pub async fn logout(state: &AppState, user_id: Uuid) -> ServiceResult<()> {
    state
        .sessions
        .evict(user_id)
        .await
        .map_err(|e| ServiceError::storage("Error logging out", e))?;
    info!(%user_id, "user logged out");
    Ok(())
}

/// Validates `token` and resolves its subject, cache first.
///
/// A cache miss falls through to the user store and repopulates the cache.
/// Cached profiles are never invalidated when the stored user changes.
#[instrument(skip(state, token))]
pub async fn verify_token(state: &AppState, token: &str) -> ServiceResult<(Claims, PublicUser)> {
    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "token rejected");
        ServiceError::InvalidToken
    })?;
    let user_id = claims.sub;

    match state.sessions.get(user_id).await {
        Ok(Some(user)) => return Ok((claims, user)),
        Ok(None) => {}
        Err(e) => warn!(error = %e, %user_id, "session cache read failed"),
    }

    let user: PublicUser = state
        .users
        .find_by_id(user_id)
        .await
        .map_err(|e| ServiceError::storage("Error verifying token", e))?
        .ok_or_else(|| {
            warn!(%user_id, "token subject no longer exists");
            ServiceError::InvalidToken
        })?
        .into();

    if let Err(e) = state.sessions.put(&user).await {
        warn!(error = %e, %user_id, "session cache write failed");
    }
    Ok((claims, user))
}

#[instrument(skip(state))]
pub async fn get_user(state: &AppState, user_id: Uuid) -> ServiceResult<PublicUser> {
    state
        .users
        .find_by_id(user_id)
        .await
        .map_err(|e| ServiceError::storage("Error fetching user", e))?
        .map(PublicUser::from)
        .ok_or(ServiceError::NotFound("User"))
}
