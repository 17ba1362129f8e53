//! Current-user profile (`/api/me`), which also carries the admin flag.

pub mod client;
pub mod types;
