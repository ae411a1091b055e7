//! Caller session shared by every backend request
//!
//! The backend scopes requests by tenant and caller identity headers. A 401
//! from any endpoint clears the session and broadcasts
//! [`SessionEvent::SignedOut`] so the host can route to its sign-in screen.

use kompete_domain::SessionConfig;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{info, warn};

const EVENT_CAPACITY: usize = 16;

/// Identity attached to outgoing requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub tenant_id: Option<String>,
    pub user_email: Option<String>,
}

impl Session {
    pub fn new(tenant_id: impl Into<String>, user_email: impl Into<String>) -> Self {
        Self { tenant_id: Some(tenant_id.into()), user_email: Some(user_email.into()) }
    }

    fn is_empty(&self) -> bool {
        self.tenant_id.is_none() && self.user_email.is_none()
    }
}

impl From<&SessionConfig> for Session {
    fn from(config: &SessionConfig) -> Self {
        Self { tenant_id: config.tenant_id.clone(), user_email: config.user_email.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut { reason: String },
}

/// Current session plus a broadcast of its transitions.
pub struct SessionStore {
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { current: RwLock::new(None), events }
    }

    /// Store signed in with the configured identity, or signed out when the
    /// configuration names none.
    pub fn from_config(config: &SessionConfig) -> Self {
        let store = Self::new();
        let session = Session::from(config);
        if !session.is_empty() {
            *store.current.write() = Some(session);
        }
        store
    }

    pub fn sign_in(&self, session: Session) {
        *self.current.write() = Some(session);
        info!("session established");
        let _ = self.events.send(SessionEvent::SignedIn);
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.read().is_some()
    }

    /// Drop the session after the backend rejected it.
    ///
    /// Returns `false` when there was no session to clear; subscribers are
    /// notified either way.
    pub fn force_logout(&self, reason: &str) -> bool {
        let cleared = self.current.write().take().is_some();
        warn!(reason, cleared, "backend rejected session, signing out");
        let _ = self.events.send(SessionEvent::SignedOut { reason: reason.to_string() });
        cleared
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
