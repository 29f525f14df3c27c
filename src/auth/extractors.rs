use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use time::OffsetDateTime;
use tracing::warn;

use super::{
    repo_types::PublicUser,
    services::verify_token,
    session::{Session, SessionState},
};
use crate::{error::ServiceError, state::AppState};

/// An authenticated request: the bearer token verified and its user resolved.
pub struct CurrentSession {
    pub user: PublicUser,
}

pub(crate) fn bearer_token(parts: &Parts) -> Option<&str> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session =
            Session::anonymous().begin(bearer_token(parts).ok_or(ServiceError::MissingToken)?);
        let token = session.token().ok_or(ServiceError::MissingToken)?;

        let (claims, user) = verify_token(state, token).await?;
        let session = session
            .authenticate(user, claims.expires_at())
            .refresh_expiry(OffsetDateTime::now_utc());

        if let SessionState::Expired { user_id } = session.state() {
            warn!(%user_id, "session expired");
        }
        session
            .into_user()
            .map(|user| CurrentSession { user })
            .ok_or(ServiceError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut req = Request::builder().uri("/me");
        if let Some(h) = header {
            req = req.header("authorization", h);
        }
        req.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let state = AppState::fake();
        let mut parts = parts_with(None);
        let err = CurrentSession::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ServiceError::MissingToken));
    }
}
