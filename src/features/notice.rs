//! Transient notices ("toasts"). A notice stays visible until it is replaced,
//! dismissed, or its timer runs out. Dropping the board cancels the timer.

use crate::shared::errors::AppError;
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};
use tracing::debug;

pub const NOTICE_TTL: Duration = Duration::from_millis(3_500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoticeKind::Success => write!(f, "ok: {}", self.message),
            NoticeKind::Error => write!(f, "error: {}", self.message),
        }
    }
}

pub struct NoticeBoard {
    state: Arc<watch::Sender<Option<Notice>>>,
    generation: Arc<AtomicU64>,
    timer: Mutex<Option<JoinHandle<()>>>,
    ttl: Duration,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::with_ttl(NOTICE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            timer: Mutex::new(None),
            ttl,
        }
    }

    pub fn current(&self) -> Option<Notice> {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Option<Notice>> {
        self.state.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(NoticeKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(NoticeKind::Error, message);
    }

    pub fn from_error(&self, err: &AppError) {
        self.show(NoticeKind::Error, err.message());
    }

    /// Replaces the visible notice and restarts the dismiss timer. Outside a
    /// tokio runtime the notice stays until replaced or dismissed.
    pub fn show(&self, kind: NoticeKind, message: impl Into<String>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(Some(Notice {
            kind,
            message: message.into(),
        }));

        let mut timer = self.lock_timer();
        if let Some(previous) = timer.take() {
            previous.abort();
        }

        let Ok(handle) = Handle::try_current() else {
            debug!("no runtime, notice will not auto-dismiss");
            return;
        };
        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.generation);
        let ttl = self.ttl;
        *timer = Some(handle.spawn(async move {
            tokio::time::sleep(ttl).await;
            if current.load(Ordering::SeqCst) == generation {
                state.send_replace(None);
            }
        }));
    }

    pub fn dismiss(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(timer) = self.lock_timer().take() {
            timer.abort();
        }
        self.state.send_replace(None);
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for NoticeBoard {
    fn drop(&mut self) {
        if let Some(timer) = self.lock_timer().take() {
            timer.abort();
        }
    }
}
