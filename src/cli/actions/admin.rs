use crate::{
    app::App,
    cli::actions::{access::require_admin, output::print_json},
    features::admin::{
        client::{fetch_summary, fetch_user_detail, fetch_user_referrals, fetch_users},
        types::UserListQuery,
    },
};
use anyhow::Result;

#[derive(Debug)]
pub enum Command {
    Summary,
    Users(UserListQuery),
    User { user_id: String, referrals: bool },
}

/// Every admin command passes the admin gate first.
///
/// # Errors
/// Returns an authorization error for non-admins or the API error.
pub async fn execute(app: &App, command: Command) -> Result<()> {
    require_admin(app).await?;
    let api = app.api();

    let value = match command {
        Command::Summary => fetch_summary(api).await?,
        Command::Users(query) => fetch_users(api, &query).await?,
        Command::User {
            user_id,
            referrals: false,
        } => fetch_user_detail(api, &user_id).await?,
        Command::User {
            user_id,
            referrals: true,
        } => fetch_user_referrals(api, &user_id).await?,
    };
    print_json(&value)
}
