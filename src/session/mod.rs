//! Server-held sessions. The browser carries only an opaque id in a signed
//! cookie; everything else lives in process memory, so a restart logs
//! everyone out and nothing secret ever reaches the client.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, Key, SignedCookieJar};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "bulletin_session";

/// The typed session context resolved once per request and passed
/// explicitly into handlers. Replaces the original's loose trio of
/// `isLoggedIn` / `userRole` / `submitterId` flags.
#[derive(Debug, Clone)]
pub enum AuthSession {
    Anonymous,
    Submitter { id: i32, email: String },
    Admin { email: String },
}

impl AuthSession {
    pub fn is_admin(&self) -> bool {
        matches!(self, AuthSession::Admin { .. })
    }

    pub fn is_logged_in(&self) -> bool {
        !matches!(self, AuthSession::Anonymous)
    }

    /// Role string for templates; empty when anonymous.
    pub fn role_label(&self) -> &'static str {
        match self {
            AuthSession::Anonymous => "",
            AuthSession::Submitter { .. } => "submitter",
            AuthSession::Admin { .. } => "admin",
        }
    }
}

/// What the gate decided for a role-scoped request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Allow,
    /// Render the login view in place (HTTP 200) with an explanation.
    LoginRequired,
    /// A submitter asked for an admin page; send them to their own
    /// dashboard, never to the admin page.
    ToSubmitterDashboard,
}

/// Admin-scoped paths admit admins only.
pub fn admin_gate(auth: &AuthSession) -> GateOutcome {
    match auth {
        AuthSession::Admin { .. } => GateOutcome::Allow,
        AuthSession::Submitter { .. } => GateOutcome::ToSubmitterDashboard,
        AuthSession::Anonymous => GateOutcome::LoginRequired,
    }
}

/// Submitter-scoped paths admit submitters only.
pub fn submitter_gate(auth: &AuthSession) -> GateOutcome {
    match auth {
        AuthSession::Submitter { .. } => GateOutcome::Allow,
        _ => GateOutcome::LoginRequired,
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<Uuid, AuthSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, AuthSession>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store a logged-in session and mint its opaque id.
    pub fn insert(&self, session: AuthSession) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().insert(id, session);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<AuthSession> {
        self.lock().get(id).cloned()
    }

    pub fn remove(&self, id: &Uuid) {
        self.lock().remove(id);
    }

    /// Resolve the session referenced by the cookie jar, if any.
    pub fn resolve(&self, jar: &SignedCookieJar) -> AuthSession {
        jar.get(SESSION_COOKIE)
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
            .and_then(|id| self.get(&id))
            .unwrap_or(AuthSession::Anonymous)
    }
}

/// Build the cookie that carries a freshly minted session id.
pub fn session_cookie(id: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .build()
}

/// The cookie to remove on logout.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    Key: FromRef<S>,
    SessionStore: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});
        let store = SessionStore::from_ref(state);
        Ok(store.resolve(&jar))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitter() -> AuthSession {
        AuthSession::Submitter {
            id: 7,
            email: "s@example.edu".to_string(),
        }
    }

    fn admin() -> AuthSession {
        AuthSession::Admin {
            email: "a@example.edu".to_string(),
        }
    }

    #[test]
    fn store_round_trip_and_removal() {
        let store = SessionStore::new();
        let id = store.insert(submitter());
        match store.get(&id) {
            Some(AuthSession::Submitter { id: 7, .. }) => {}
            other => panic!("unexpected session: {:?}", other),
        }
        store.remove(&id);
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn unknown_ids_resolve_to_anonymous() {
        let store = SessionStore::new();
        assert!(store.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn admin_gate_decisions() {
        assert_eq!(admin_gate(&admin()), GateOutcome::Allow);
        assert_eq!(admin_gate(&submitter()), GateOutcome::ToSubmitterDashboard);
        assert_eq!(admin_gate(&AuthSession::Anonymous), GateOutcome::LoginRequired);
    }

    #[test]
    fn submitter_gate_decisions() {
        assert_eq!(submitter_gate(&submitter()), GateOutcome::Allow);
        assert_eq!(submitter_gate(&admin()), GateOutcome::LoginRequired);
        assert_eq!(
            submitter_gate(&AuthSession::Anonymous),
            GateOutcome::LoginRequired
        );
    }

    #[test]
    fn role_labels_match_template_expectations() {
        assert_eq!(AuthSession::Anonymous.role_label(), "");
        assert_eq!(submitter().role_label(), "submitter");
        assert_eq!(admin().role_label(), "admin");
    }
}
