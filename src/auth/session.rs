use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::PublicUser;

/// Where a request stands with respect to authentication.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous,
    Authenticating { token: String },
    Authenticated {
        user: PublicUser,
        expires_at: OffsetDateTime,
    },
    Expired { user_id: Uuid },
}

/// Per-request authentication context, passed explicitly to handlers.
///
/// Transitions only move forward:
/// `Anonymous -> Authenticating -> Authenticated -> Expired`.
/// A transition requested from the wrong state leaves the session unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    state: SessionState,
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            state: SessionState::Anonymous,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// A bearer token was presented.
    pub fn begin(self, token: impl Into<String>) -> Self {
        match self.state {
            SessionState::Anonymous => Self {
                state: SessionState::Authenticating {
                    token: token.into(),
                },
            },
            _ => self,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticating { token } => Some(token),
            _ => None,
        }
    }

    /// The presented token checked out and resolved to `user`.
    pub fn authenticate(self, user: PublicUser, expires_at: OffsetDateTime) -> Self {
        match self.state {
            SessionState::Authenticating { .. } => Self {
                state: SessionState::Authenticated { user, expires_at },
            },
            _ => self,
        }
    }

    /// Moves an authenticated session past its expiry into `Expired`.
    pub fn refresh_expiry(self, now: OffsetDateTime) -> Self {
        match self.state {
            SessionState::Authenticated { user, expires_at } if expires_at <= now => Self {
                state: SessionState::Expired { user_id: user.id },
            },
            state => Self { state },
        }
    }

    pub fn into_user(self) -> Option<PublicUser> {
        match self.state {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }
}
