//! Referral feature: invite code capture, the pending-code link step that runs
//! after a session is established, and the `/api/referrals` endpoints.

pub mod client;
pub mod linker;
pub mod types;

pub use client::{invite_code, invite_link, ReferralApi};
pub use linker::{ReferralLinker, MAX_LINK_ATTEMPTS, PENDING_ATTEMPTS_KEY, PENDING_INVITE_KEY};
pub use types::{CaptureSource, LinkOutcome};
