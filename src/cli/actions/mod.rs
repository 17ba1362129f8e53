pub mod admin;
pub mod referral;
pub mod session;
pub mod videos;
pub mod vip;
pub mod wallet;

mod access;
mod output;

// Internal "interpreter" for `Action`.
// We keep the match in a separate module so `mod.rs` stays small as more actions are added.
mod run;

use crate::cli::globals::GlobalArgs;

#[derive(Debug)]
pub enum Command {
    Session(session::Command),
    Referral(referral::Command),
    Admin(admin::Command),
    Vip(vip::Command),
    Wallet(wallet::Command),
    Videos(videos::Command),
}

#[derive(Debug)]
pub struct Action {
    pub globals: GlobalArgs,
    pub command: Command,
}

impl Action {
    // Convenience wrapper so call sites can do `action.execute().await`.
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
