//! Admin dashboard endpoints. Access is decided by the admin gate; the
//! backend still rejects non-admins on every call.

pub mod client;
pub mod types;
