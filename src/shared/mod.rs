//! Shared client utilities for API access, configuration, errors and durable
//! storage.
//!
//! ## Core flows
//!
//! ### Sign-up with an invitation code
//!
//! 1. **Capture:** A `ref` query parameter (or manual entry) becomes the invite candidate.
//! 2. **Sign-up:** The code travels to the auth backend as user metadata and is
//!    also stored as the pending invite code.
//! 3. **Link:** Once a session exists the pending code is submitted to
//!    `/api/referrals/link` and cleared on success.
//!
//! ### Admin access
//!
//! The admin gate asks `/api/me` for `usuario.is_admin` once per user identity.
//! Any failure denies access.
//!
//! These helpers do not store secrets beyond the persisted auth session; callers
//! must still avoid logging credentials.

pub mod api;
pub mod config;
pub mod errors;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, RequestOptions};
pub use config::{AppConfig, BuildMode, ConfigError, RuntimeConfig};
pub use errors::{AppError, ErrorKind, Payload};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
