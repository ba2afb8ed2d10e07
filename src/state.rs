use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sqlx::PgPool;

use crate::session::SessionStore;

/// Shared per-process state: the connection pool, the in-memory session
/// store, the cookie signing key, and where files live on disk.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub sessions: SessionStore,
    pub key: Key,
    pub public_dir: Arc<PathBuf>,
    pub uploads_dir: Arc<PathBuf>,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.key.clone()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> SessionStore {
        state.sessions.clone()
    }
}
