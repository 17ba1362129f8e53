use crate::{
    app::App,
    cli::actions::{
        access::denial_detail, admin, referral, session, videos, vip, wallet, Action, Command,
    },
    shared::errors::AppError,
};
use anyhow::Result;
use tracing::error;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the app cannot boot or the action fails.
pub async fn execute(action: Action) -> Result<()> {
    let app = App::bootstrap(action.globals.into_config()).await?;

    let result = match action.command {
        Command::Session(command) => session::execute(&app, command).await,
        Command::Referral(command) => referral::execute(&app, command).await,
        Command::Admin(command) => admin::execute(&app, command).await,
        Command::Vip(command) => vip::execute(&app, command).await,
        Command::Wallet(command) => wallet::execute(&app, command).await,
        Command::Videos(command) => videos::execute(&app, command).await,
    };

    if let Err(err) = &result {
        let app_error = err.downcast_ref::<AppError>();
        match app_error {
            Some(app_error) => app.notices().from_error(app_error),
            None => app.notices().error(err.to_string()),
        }
        if let Some(notice) = app.notices().current() {
            error!(%notice, "command failed");
        }
        if let Some(detail) = app_error.and_then(denial_detail) {
            eprintln!("detail: {detail}");
        }
    }

    result
}
