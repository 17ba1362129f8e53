//! Session state shared by the whole client. The store is created once by the
//! composition root and cloned into every consumer; clones share one
//! `watch` channel so readers always see the latest value. Only the auth
//! backend's event stream writes to it (through the single attached
//! subscription), plus the one-shot `initialize` restore.

use super::{
    backend::AuthBackend,
    events::{AuthChange, AuthEvents, Subscription},
    types::{Session, User},
};
use crate::shared::errors::{swallowed, AppError};
use secrecy::SecretString;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::watch;
use tracing::{debug, instrument};

#[derive(Clone, Debug)]
pub enum SessionState {
    /// The initial restore has not resolved yet.
    Loading,
    Ready(Option<Session>),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Loading | Self::Ready(None) => None,
            Self::Ready(Some(session)) => Some(session),
        }
    }
}

struct Inner {
    state: watch::Sender<SessionState>,
    attached: AtomicBool,
    initialized: AtomicBool,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            inner: Arc::new(Inner {
                state,
                attached: AtomicBool::new(false),
                initialized: AtomicBool::new(false),
            }),
        }
    }

    /// Asks the backend for the current session, once per store. Failures
    /// collapse to "no session". If an auth event already settled the state
    /// while the request was in flight, that newer value wins.
    #[instrument(skip_all)]
    pub async fn initialize<B: AuthBackend>(&self, backend: &B) {
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            debug!("session store already initialized");
            return;
        }

        let session = match backend.get_session().await {
            Ok(session) => session,
            Err(err) => {
                swallowed("session restore", &err);
                None
            }
        };

        self.inner.state.send_if_modified(|state| {
            if matches!(state, SessionState::Loading) {
                *state = SessionState::Ready(session);
                true
            } else {
                false
            }
        });
    }

    /// Attaches the store to the backend's event stream. `on_change` runs
    /// after the store has been updated, synchronously with the emission.
    /// Only one subscription may be attached at a time.
    ///
    /// # Errors
    /// Returns a config error if a subscription is already attached.
    pub fn subscribe<F>(
        &self,
        events: &AuthEvents,
        on_change: F,
    ) -> Result<SessionSubscription, AppError>
    where
        F: Fn(&AuthChange) + Send + Sync + 'static,
    {
        if self.inner.attached.swap(true, Ordering::SeqCst) {
            return Err(AppError::config(
                "session store is already subscribed to the auth backend",
            ));
        }

        let inner = Arc::clone(&self.inner);
        let subscription = events.subscribe(move |change| {
            inner
                .state
                .send_replace(SessionState::Ready(change.session.clone()));
            on_change(change);
        });

        Ok(SessionSubscription {
            _subscription: subscription,
            inner: Arc::clone(&self.inner),
        })
    }

    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.inner.state.borrow(), SessionState::Loading)
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.state.borrow().session().cloned()
    }

    pub fn access_token(&self) -> Option<SecretString> {
        self.inner
            .state
            .borrow()
            .session()
            .map(|session| session.access_token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.inner
            .state
            .borrow()
            .session()
            .map(|session| session.user.clone())
    }
}

/// Keeps the store attached to the backend; dropping it detaches.
pub struct SessionSubscription {
    _subscription: Subscription,
    inner: Arc<Inner>,
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.inner.attached.store(false, Ordering::SeqCst);
    }
}
