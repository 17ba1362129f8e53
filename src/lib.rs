//! # Dojaweb client core
//!
//! `dojaweb` is the client side of the Dojaweb rewards platform (watch
//! videos, earn USDT, refer friends). The business rules live on the
//! backend; this crate owns what the client must get right on its own.
//!
//! ## Session
//!
//! A single [`features::auth::state::SessionStore`] per process mirrors the
//! auth backend. It starts in `Loading`, is restored once at startup and is
//! then only moved by backend events. Consumers read it, they never write it.
//!
//! ## Referrals
//!
//! An invitation code captured from a `ref` link or typed at sign-up is kept
//! in durable storage until a session exists, then submitted exactly once to
//! `/api/referrals/link`. Failures keep the code for the next session.
//!
//! ## Route gates
//!
//! The session gate waits while the store is loading and redirects anonymous
//! users to the entry screen. The admin gate additionally asks `/api/me` for
//! `usuario.is_admin` once per user and denies on any failure.
//!
//! ## Business API
//!
//! [`shared::api::ApiClient`] attaches the current bearer token to every call
//! and turns non-2xx answers into classified [`shared::errors::AppError`]s.
//! Endpoints that use 404 for "nothing yet" say so in their client module.

pub mod app;
pub mod cli;
pub mod features;
pub mod shared;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with("dojaweb/"));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
