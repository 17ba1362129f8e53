//! Wallet: balance and movements, deposit addresses, withdrawals and the
//! withdrawal PIN.

pub mod client;
pub mod types;
