//! Listener registry for auth state transitions. Backends emit changes
//! synchronously, in the order they happen; listeners run in registration
//! order. A [`Subscription`] unregisters its listener when dropped, so a
//! consumer that goes away can never be called again.

use super::types::Session;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthChangeKind {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

impl AuthChangeKind {
    /// Changes after which pending work that needs a fresh session (the
    /// referral link) may run.
    pub fn establishes_session(self) -> bool {
        matches!(self, Self::SignedIn | Self::InitialSession)
    }
}

#[derive(Clone, Debug)]
pub struct AuthChange {
    pub kind: AuthChangeKind,
    pub session: Option<Session>,
}

type Listener = Arc<dyn Fn(&AuthChange) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Default)]
pub struct AuthEvents {
    registry: Arc<Mutex<Registry>>,
}

impl AuthEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener`; it stays registered until the returned handle is dropped.
    #[must_use = "dropping the subscription unregisters the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AuthChange) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.insert(id, Arc::new(listener));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Delivers `change` to every listener. The registry lock is released
    /// before listeners run so they may subscribe or unsubscribe.
    pub fn emit(&self, change: &AuthChange) {
        let listeners: Vec<Listener> = lock(&self.registry).listeners.values().cloned().collect();
        trace!(kind = ?change.kind, listeners = listeners.len(), "auth change");
        for listener in listeners {
            listener(change);
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.registry).listeners.len()
    }
}

/// Handle for a registered listener.
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).listeners.remove(&self.id);
        }
    }
}
