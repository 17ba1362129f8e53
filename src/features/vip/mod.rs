//! VIP subscriptions: plan catalog, the user's current plan and purchases.

pub mod client;
pub mod types;
