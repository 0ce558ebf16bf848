use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::models::LoginResult;

/// The signed-in user as the client knows them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub token: String,
}

impl From<LoginResult> for Session {
    fn from(result: LoginResult) -> Self {
        Self {
            user_id: result.user_id,
            name: result.name,
            email: result.email,
            token: result.token,
        }
    }
}

/// Shared, observable session state
///
/// Clients read the bearer token from it and clear it when the backend
/// rejects the token; the controller subscribes to it and reloads on
/// every identity change.
#[derive(Clone)]
pub struct SessionContext {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::guest()
    }
}

impl SessionContext {
    pub fn guest() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn with_session(session: Session) -> Self {
        let context = Self::guest();
        context.sign_in(session);
        context
    }

    pub fn sign_in(&self, session: Session) {
        tracing::info!(user_id = %session.user_id, "Session started");
        self.tx.send_replace(Some(session));
    }

    /// Clears the session. Subscribers are only notified if there was one.
    pub fn sign_out(&self) {
        let cleared = self.tx.send_if_modified(|current| current.take().is_some());
        if cleared {
            tracing::info!("Session cleared");
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.tx.borrow().as_ref().map(|s| s.user_id)
    }

    pub fn token(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|s| s.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}
