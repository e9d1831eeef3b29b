//! Authenticated session shared by the client, the store and the workflow.

use crate::models::UserProfile;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<UserProfile>,
}

/// Bearer token and user profile of the current login.
///
/// Cloning is cheap; all clones see the same session, so clearing it after
/// a 401 logs out every component at once.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<SessionState>>,
}

impl SessionContext {
    /// An empty, logged-out session
    pub fn new() -> Self {
        Self::default()
    }

    /// A session seeded with an existing token
    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.write().token = Some(token.into());
        session
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().token.is_some()
    }

    /// Store the result of a successful login.
    pub fn establish(&self, token: String, user: Option<UserProfile>) {
        let mut state = self.write();
        state.token = Some(token);
        state.user = user;
        info!("Session established");
    }

    /// Forget token and user after the server rejected the token.
    pub fn invalidate(&self) {
        let mut state = self.write();
        if state.token.is_some() {
            warn!("Session invalidated");
        }
        *state = SessionState::default();
    }

    /// Explicit logout.
    pub fn logout(&self) {
        *self.write() = SessionState::default();
        info!("Logged out");
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
