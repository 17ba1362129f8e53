//! Types for referral capture, linking and the /api/referrals responses.

use crate::shared::errors::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a candidate invitation code came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureSource {
    /// The `ref` query parameter of the landing URL.
    Query,
    /// Typed by the user; replaces any earlier candidate.
    Manual,
}

/// Result of one attempt to apply the pending invitation code.
#[derive(Debug)]
pub enum LinkOutcome {
    NoPending,
    /// A code is pending but there is no session to attach it to yet.
    NoSession,
    /// Another attempt is already running; this one was skipped.
    InFlight,
    Linked {
        code: String,
    },
    /// The code stays stored for the next session.
    Failed {
        code: String,
        error: AppError,
    },
    /// The last allowed attempt failed; the code was discarded.
    Dropped {
        code: String,
        error: AppError,
    },
}

impl LinkOutcome {
    pub fn is_linked(&self) -> bool {
        matches!(self, Self::Linked { .. })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct LinkRequest<'a> {
    pub invite_code: &'a str,
}

/// Response of `/api/referrals/link`. Only `ok` is relied upon.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LinkResponse {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Referral overview for the signed-in user: their code, link and the
/// backend's aggregates.
#[derive(Clone, Debug)]
pub struct ReferralOverview {
    pub invite_code: String,
    pub invite_link: Option<String>,
    pub stats: Value,
    pub profile: Value,
}
