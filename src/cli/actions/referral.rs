use crate::{
    app::App,
    cli::actions::{
        access::require_session,
        output::{print_field, print_json},
    },
    features::referrals::{
        client::{fetch_my_commissions, fetch_referral_members, referral_overview},
        types::{CaptureSource, LinkOutcome},
    },
    shared::errors::AppError,
};
use anyhow::Result;

#[derive(Debug)]
pub enum Source {
    Code(String),
    Url(String),
}

#[derive(Debug)]
pub enum Command {
    Capture(Source),
    Link,
    Stats,
    Members { level: Option<u32> },
    Commissions,
}

/// # Errors
/// Returns an error if the command needs a session and there is none, or
/// if the business API fails.
pub async fn execute(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Capture(source) => {
            let captured = match &source {
                Source::Code(code) => app.linker().capture(code, CaptureSource::Manual),
                Source::Url(url) => app.linker().capture_from_url(url),
            };
            let Some(code) = app.linker().candidate().filter(|_| captured) else {
                return Err(AppError::validation("No invitation code found").into());
            };
            app.linker().store_pending(&code);
            print_field("pending invite", &code);
            report(&app.link_pending_referral().await)
        }
        Command::Link => report(&app.link_pending_referral().await),
        Command::Stats => {
            require_session(app)?;
            let overview = referral_overview(app.api()).await?;
            print_field("invite code", &overview.invite_code);
            if let Some(link) = &overview.invite_link {
                print_field("invite link", link);
            }
            print_json(&overview.stats)?;
            print_json(&overview.profile)
        }
        Command::Members { level } => {
            require_session(app)?;
            print_json(&fetch_referral_members(app.api(), level).await?)
        }
        Command::Commissions => {
            require_session(app)?;
            print_json(&fetch_my_commissions(app.api()).await?)
        }
    }
}

fn report(outcome: &LinkOutcome) -> Result<()> {
    match outcome {
        LinkOutcome::NoPending => println!("No pending invitation code"),
        LinkOutcome::NoSession => println!("Invitation code kept until you sign in"),
        LinkOutcome::InFlight => println!("Invitation code is already being applied"),
        LinkOutcome::Linked { code } => println!("Invitation code {code} applied"),
        LinkOutcome::Failed { error, .. } | LinkOutcome::Dropped { error, .. } => {
            return Err(error.clone().into())
        }
    }
    Ok(())
}
