//! Access gates for protected and admin-only surfaces. Both gates are explicit
//! state machines fed by [`SessionState`] values; they return a [`GateAction`]
//! telling the caller what to show. The admin gate asks an [`AdminCheck`] once
//! per user identity and fails closed on every outcome other than `Ok(true)`.
//! UX-only: the business API enforces authorization on its own.

use super::state::{SessionState, SessionStore};
use crate::shared::errors::AppError;
use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, instrument, warn};

/// Where anonymous visitors are sent.
pub const ENTRY_PATH: &str = "/";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateAction {
    /// Initial check pending; show a neutral waiting state.
    Wait,
    Redirect(&'static str),
    Render,
    /// Access refused; `diagnostic` carries the lookup error, if any.
    Deny { diagnostic: Option<String> },
}

/// Lookup of the admin indicator for the signed-in user.
pub trait AdminCheck: Send + Sync {
    fn is_admin(&self) -> impl Future<Output = Result<bool, AppError>> + Send;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionGateState {
    Loading,
    Anonymous,
    Authenticated { user_id: String },
}

impl SessionGateState {
    fn from_session(state: &SessionState) -> Self {
        match state {
            SessionState::Loading => Self::Loading,
            SessionState::Ready(None) => Self::Anonymous,
            SessionState::Ready(Some(session)) => Self::Authenticated {
                user_id: session.user.id.clone(),
            },
        }
    }

    fn action(&self) -> GateAction {
        match self {
            Self::Loading => GateAction::Wait,
            Self::Anonymous => GateAction::Redirect(ENTRY_PATH),
            Self::Authenticated { .. } => GateAction::Render,
        }
    }
}

/// Session-required gate. Emits an action only when its state changes, so
/// redelivering the same session never redirects or renders twice.
#[derive(Debug, Default)]
pub struct SessionGate {
    state: Option<SessionGateState>,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&SessionGateState> {
        self.state.as_ref()
    }

    pub fn observe(&mut self, session: &SessionState) -> Option<GateAction> {
        let next = SessionGateState::from_session(session);
        if self.state.as_ref() == Some(&next) {
            return None;
        }
        let action = next.action();
        self.state = Some(next);
        Some(action)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdminGateState {
    Loading,
    Anonymous,
    Checking { user_id: String },
    Authorized { user_id: String },
    Denied {
        user_id: String,
        diagnostic: Option<String>,
    },
}

impl AdminGateState {
    fn user_id(&self) -> Option<&str> {
        match self {
            Self::Loading | Self::Anonymous => None,
            Self::Checking { user_id }
            | Self::Authorized { user_id }
            | Self::Denied { user_id, .. } => Some(user_id),
        }
    }

    pub fn action(&self) -> GateAction {
        match self {
            Self::Loading | Self::Checking { .. } => GateAction::Wait,
            Self::Anonymous => GateAction::Redirect(ENTRY_PATH),
            Self::Authorized { .. } => GateAction::Render,
            Self::Denied { diagnostic, .. } => GateAction::Deny {
                diagnostic: diagnostic.clone(),
            },
        }
    }
}

/// Admin-required gate, nested in an authenticated context.
pub struct AdminGate<C> {
    check: C,
    state: Mutex<AdminGateState>,
}

impl<C: AdminCheck> AdminGate<C> {
    pub fn new(check: C) -> Self {
        Self {
            check,
            state: Mutex::new(AdminGateState::Loading),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AdminGateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> AdminGateState {
        self.lock().clone()
    }

    /// Evaluates the gate for `session`. The lookup runs only when the user
    /// identity changed; a second evaluation while one is checking the same
    /// user returns [`GateAction::Wait`] instead of issuing another request.
    /// A result is applied only if the gate still checks that user.
    #[instrument(skip_all)]
    pub async fn evaluate(&self, session: &SessionState) -> GateAction {
        let user_id = {
            let mut state = self.lock();
            let user_id = match session {
                SessionState::Loading => {
                    *state = AdminGateState::Loading;
                    return GateAction::Wait;
                }
                SessionState::Ready(None) => {
                    *state = AdminGateState::Anonymous;
                    return GateAction::Redirect(ENTRY_PATH);
                }
                SessionState::Ready(Some(session)) => session.user.id.clone(),
            };

            if state.user_id() == Some(user_id.as_str()) {
                debug!("admin check already done or running for this user");
                return state.action();
            }
            *state = AdminGateState::Checking {
                user_id: user_id.clone(),
            };
            user_id
        };

        let outcome = match self.check.is_admin().await {
            Ok(true) => AdminGateState::Authorized {
                user_id: user_id.clone(),
            },
            Ok(false) => AdminGateState::Denied {
                user_id: user_id.clone(),
                diagnostic: None,
            },
            Err(err) => {
                warn!(error = %err, "admin check failed, denying");
                AdminGateState::Denied {
                    user_id: user_id.clone(),
                    diagnostic: Some(err.message().to_string()),
                }
            }
        };

        let mut state = self.lock();
        if *state == (AdminGateState::Checking { user_id }) {
            *state = outcome;
        } else {
            debug!("discarding stale admin check result");
        }
        state.action()
    }
}

/// Background watcher that re-runs a gate on every session change. Dropping
/// the handle aborts the task, so no action is delivered after teardown.
pub struct GuardTask {
    handle: JoinHandle<()>,
}

impl GuardTask {
    /// Feeds every session change through a [`SessionGate`]; `on_action`
    /// receives only state transitions.
    pub fn session<F>(store: &SessionStore, on_action: F) -> Self
    where
        F: Fn(GateAction) + Send + 'static,
    {
        let mut receiver = store.watch();
        let handle = tokio::spawn(async move {
            let mut gate = SessionGate::new();
            loop {
                let current = receiver.borrow_and_update().clone();
                if let Some(action) = gate.observe(&current) {
                    on_action(action);
                }
                if receiver.changed().await.is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Re-evaluates `gate` on every session change.
    pub fn admin<C, F>(store: &SessionStore, gate: Arc<AdminGate<C>>, on_action: F) -> Self
    where
        C: AdminCheck + 'static,
        F: Fn(GateAction) + Send + 'static,
    {
        let receiver = store.watch();
        let handle = tokio::spawn(watch_admin(receiver, gate, on_action));
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn watch_admin<C, F>(
    mut receiver: watch::Receiver<SessionState>,
    gate: Arc<AdminGate<C>>,
    on_action: F,
) where
    C: AdminCheck,
    F: Fn(GateAction),
{
    let mut last = None;
    loop {
        let current = receiver.borrow_and_update().clone();
        let action = gate.evaluate(&current).await;
        if last.as_ref() != Some(&action) {
            on_action(action.clone());
            last = Some(action);
        }
        if receiver.changed().await.is_err() {
            break;
        }
    }
}

impl Drop for GuardTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
