//! Browser session minting and re-authentication.
//!
//! A session credential is an opaque random token. Only its SHA-256 hash
//! is stored; the raw value goes back to the browser once, in an
//! `HttpOnly` cookie.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use panel_core::error::{PanelError, PanelResult};
use panel_core::models::session::CreateSession;
use panel_core::models::user::User;
use panel_core::repository::{PermissionRepository, SessionRepository, UserRepository};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub max_age: u64,
    pub path: &'static str,
    pub secure: bool,
    pub http_only: bool,
}

/// Renders the `Set-Cookie` header value.
impl fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}; Max-Age={}; Path={}",
            self.name, self.value, self.max_age, self.path
        )?;
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        Ok(())
    }
}

/// Body returned after a successful (re-)login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub scopes: Vec<String>,
}

/// A freshly created session. `token` is the raw credential and is not
/// recoverable from the store.
#[derive(Debug, Clone)]
pub struct MintedSession {
    pub session_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Reauthentication {
    pub response: LoginResponse,
    pub session: MintedSession,
    /// Credential cookie, then the script-readable expiry marker.
    pub cookies: [SessionCookie; 2],
}

/// Cookie pair binding a session credential to the browser.
pub fn session_cookies(config: &AuthConfig, credential: &str, secure: bool) -> [SessionCookie; 2] {
    let max_age = config.session_lifetime_secs;
    [
        SessionCookie {
            name: config.session_cookie_name.clone(),
            value: credential.to_string(),
            max_age,
            path: "/",
            secure,
            http_only: true,
        },
        SessionCookie {
            name: config.session_expires_cookie_name(),
            value: String::new(),
            max_age,
            path: "/",
            secure,
            http_only: false,
        },
    ]
}

/// Cookie pair that makes the browser drop both session cookies.
pub fn cleared_session_cookies(config: &AuthConfig, secure: bool) -> [SessionCookie; 2] {
    session_cookies(config, "", secure).map(|cookie| SessionCookie { max_age: 0, ..cookie })
}

pub struct SessionService<S, U, P> {
    sessions: S,
    users: U,
    permissions: P,
    config: AuthConfig,
}

impl<S, U, P> SessionService<S, U, P>
where
    S: SessionRepository,
    U: UserRepository,
    P: PermissionRepository,
{
    pub fn new(sessions: S, users: U, permissions: P, config: AuthConfig) -> Self {
        Self {
            sessions,
            users,
            permissions,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub async fn create_for_user(&self, user: &User) -> PanelResult<MintedSession> {
        let raw = token::generate_opaque_token();
        let expires_at = i64::try_from(self.config.session_lifetime_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| PanelError::Internal("session lifetime out of range".into()))?;

        let session = self
            .sessions
            .create(CreateSession {
                user_id: user.id,
                token_hash: token::hash_opaque_token(&raw),
                expires_at,
            })
            .await?;

        info!(user_id = %user.id, session_id = %session.id, "session created");

        Ok(MintedSession {
            session_id: session.id,
            token: raw,
            expires_at: session.expires_at,
        })
    }

    /// Resolve the user's global scopes, mint a session and build the
    /// cookies for it. `secure` is whether the request arrived over TLS.
    pub async fn reauthenticate(&self, user: &User, secure: bool) -> PanelResult<Reauthentication> {
        let permissions = self
            .permissions
            .get_for_user_and_server(user.id, None)
            .await
            .map_err(|e| PanelError::Internal(format!("resolving permissions: {e}")))?;

        let session = self
            .create_for_user(user)
            .await
            .map_err(|e| PanelError::Internal(format!("creating session: {e}")))?;

        let cookies = session_cookies(&self.config, &session.token, secure);

        Ok(Reauthentication {
            response: LoginResponse {
                scopes: permissions.scopes,
            },
            session,
            cookies,
        })
    }

    /// Map a presented session credential to its user.
    pub async fn authenticate(&self, credential: &str, now: DateTime<Utc>) -> PanelResult<User> {
        let hash = token::hash_opaque_token(credential);
        let session = match self.sessions.get_by_token_hash(&hash).await {
            Ok(session) => session,
            Err(PanelError::NotFound { .. }) => {
                return Err(PanelError::AuthenticationFailed {
                    reason: "unknown session".into(),
                });
            }
            Err(e) => return Err(e),
        };

        if session.is_expired(now) {
            warn!(session_id = %session.id, "expired session presented");
            self.sessions.invalidate(session.id).await?;
            return Err(PanelError::AuthenticationFailed {
                reason: "session expired".into(),
            });
        }

        match self.users.get_by_id(session.user_id).await {
            Ok(user) => Ok(user),
            // A session that outlived its user.
            Err(PanelError::NotFound { .. }) => Err(PanelError::Unknown),
            Err(e) => Err(e),
        }
    }

    /// Invalidate the session behind a credential. Unknown credentials
    /// are ignored.
    pub async fn logout(&self, credential: &str) -> PanelResult<()> {
        let hash = token::hash_opaque_token(credential);
        match self.sessions.get_by_token_hash(&hash).await {
            Ok(session) => {
                self.sessions.invalidate(session.id).await?;
                info!(session_id = %session.id, "session invalidated");
                Ok(())
            }
            Err(PanelError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
