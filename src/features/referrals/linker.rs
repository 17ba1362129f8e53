//! Pending invitation code handling. A code entered before an account is
//! confirmed is kept in durable storage and applied once a session exists.
//! At most one link call runs at a time. A failure keeps the code for the
//! next session-establishment event, never in a loop, and the code is
//! dropped after [`MAX_LINK_ATTEMPTS`] failed attempts.

use super::{
    client::{ref_from_url, ReferralApi},
    types::{CaptureSource, LinkOutcome},
};
use crate::{
    features::auth::state::SessionStore,
    shared::{errors::swallowed, storage::Storage},
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};
use tracing::{debug, info, instrument};

/// Storage key of the code waiting to be linked.
pub const PENDING_INVITE_KEY: &str = "doja_pending_invite_code";

/// Storage key of the failed attempt count for the pending code.
pub const PENDING_ATTEMPTS_KEY: &str = "doja_pending_invite_attempts";

/// Failed link attempts after which a pending code is discarded.
pub const MAX_LINK_ATTEMPTS: u32 = 3;

pub struct ReferralLinker<A> {
    api: A,
    storage: Arc<dyn Storage>,
    session: SessionStore,
    candidate: Mutex<Option<String>>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the attempt ends, including on cancellation.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn normalize(code: &str) -> Option<String> {
    let code = code.trim();
    (!code.is_empty()).then(|| code.to_string())
}

impl<A: ReferralApi> ReferralLinker<A> {
    pub fn new(api: A, storage: Arc<dyn Storage>, session: SessionStore) -> Self {
        Self {
            api,
            storage,
            session,
            candidate: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    fn candidate_slot(&self) -> MutexGuard<'_, Option<String>> {
        self.candidate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Offers a candidate code for this visit. A query-string capture never
    /// replaces an existing candidate; a manual entry always does. Returns
    /// whether the candidate changed.
    pub fn capture(&self, code: &str, source: CaptureSource) -> bool {
        let Some(code) = normalize(code) else {
            return false;
        };

        let mut slot = self.candidate_slot();
        if slot.is_some() && source != CaptureSource::Manual {
            debug!("keeping previously captured invite code");
            return false;
        }
        *slot = Some(code);
        true
    }

    /// Captures the `ref` query parameter of a landing URL.
    pub fn capture_from_url(&self, link: &str) -> bool {
        ref_from_url(link).is_some_and(|code| self.capture(&code, CaptureSource::Query))
    }

    pub fn candidate(&self) -> Option<String> {
        self.candidate_slot().clone()
    }

    /// Stores `code` as the pending code (last write wins). Empty codes are ignored.
    pub fn store_pending(&self, code: &str) {
        let Some(code) = normalize(code) else {
            return;
        };
        if let Err(err) = self.storage.set(PENDING_INVITE_KEY, &code) {
            swallowed("store pending invite code", &err);
        }
        self.reset_attempts();
    }

    pub fn pending(&self) -> Option<String> {
        self.storage
            .get(PENDING_INVITE_KEY)
            .as_deref()
            .and_then(normalize)
    }

    pub fn clear_pending(&self) {
        if let Err(err) = self.storage.remove(PENDING_INVITE_KEY) {
            swallowed("clear pending invite code", &err);
        }
        self.reset_attempts();
    }

    /// Failed attempts recorded for the pending code. Unreadable counts are zero.
    pub fn failed_attempts(&self) -> u32 {
        self.storage
            .get(PENDING_ATTEMPTS_KEY)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    }

    fn reset_attempts(&self) {
        if let Err(err) = self.storage.remove(PENDING_ATTEMPTS_KEY) {
            swallowed("reset invite link attempts", &err);
        }
    }

    /// Counts a failed attempt; returns true once the code should be dropped.
    fn record_failure(&self) -> bool {
        let attempts = self.failed_attempts().saturating_add(1);
        if attempts >= MAX_LINK_ATTEMPTS {
            return true;
        }
        if let Err(err) = self.storage.set(PENDING_ATTEMPTS_KEY, &attempts.to_string()) {
            swallowed("record invite link attempt", &err);
        }
        false
    }

    /// Submits the pending code once. Call after a session was established;
    /// never errors, the outcome says what happened.
    #[instrument(skip_all)]
    pub async fn consume_pending(&self) -> LinkOutcome {
        let Some(code) = self.pending() else {
            return LinkOutcome::NoPending;
        };

        if self.session.access_token().is_none() {
            debug!("pending invite code waits for a session");
            return LinkOutcome::NoSession;
        }

        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("referral link already in flight");
            return LinkOutcome::InFlight;
        }
        let _guard = InFlight(&self.in_flight);

        match self.api.link_referral(&code).await {
            Ok(_) => {
                // a newer code may have been stored meanwhile
                if self.pending().as_deref() == Some(code.as_str()) {
                    self.clear_pending();
                }
                info!("referral linked");
                LinkOutcome::Linked { code }
            }
            Err(error) => {
                if self.record_failure() {
                    swallowed("link referral, pending invite code dropped", &error);
                    if self.pending().as_deref() == Some(code.as_str()) {
                        self.clear_pending();
                    }
                    LinkOutcome::Dropped { code, error }
                } else {
                    swallowed("link referral", &error);
                    LinkOutcome::Failed { code, error }
                }
            }
        }
    }
}
