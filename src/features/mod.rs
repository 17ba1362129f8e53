pub mod admin;
pub mod auth;
pub mod me;
pub mod notice;
pub mod prefs;
pub mod referrals;
pub mod videos;
pub mod vip;
pub mod wallet;
