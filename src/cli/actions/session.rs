use crate::{
    app::App,
    cli::actions::output::print_field,
    features::{
        auth::{
            gateway::auth_error,
            types::{AuthMethod, Credentials, PasswordResetForm, SignUpForm},
            SignUpResult,
        },
        prefs::AuthMode,
        referrals::{
            client::{invite_code, invite_link},
            types::{CaptureSource, LinkOutcome},
        },
    },
};
use anyhow::Result;
use secrecy::SecretString;
use tracing::info;

#[derive(Debug)]
pub struct LoginArgs {
    pub method: AuthMethod,
    pub identifier: String,
    pub password: SecretString,
}

#[derive(Debug)]
pub struct SignUpArgs {
    pub method: AuthMethod,
    pub identifier: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub invite: Option<String>,
    pub ref_url: Option<String>,
}

#[derive(Debug)]
pub struct ResetArgs {
    pub link: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

#[derive(Debug)]
pub enum Command {
    Status,
    Login(LoginArgs),
    SignUp(SignUpArgs),
    Logout,
    ResetPassword(ResetArgs),
}

/// # Errors
/// Returns an error if validation or the auth backend fails.
pub async fn execute(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Status => status(app),
        Command::Login(args) => login(app, args).await,
        Command::SignUp(args) => sign_up(app, args).await,
        Command::Logout => {
            app.gateway().sign_out().await?;
            app.notices().success("Signed out");
            println!("Signed out");
            Ok(())
        }
        Command::ResetPassword(args) => reset_password(app, args).await,
    }
}

fn status(app: &App) -> Result<()> {
    let prefs = app.prefs();
    let mode = prefs.initial_auth_mode();
    prefs.mark_visited();

    match app.session().user() {
        Some(user) => {
            let code = invite_code(&user);
            print_field("user", &user.id);
            print_field("contact", user.contact.value());
            print_field("invite code", &code);
            if let Some(link) = invite_link(&app.config().app_origin, &code) {
                print_field("invite link", link);
            }
        }
        None => {
            print_field("user", "signed out");
            let next = match mode {
                AuthMode::SignUp => "signup",
                AuthMode::SignIn => "login",
            };
            print_field("next step", next);
        }
    }
    if let Some(pending) = app.linker().pending() {
        print_field("pending invite", pending);
    }
    Ok(())
}

async fn login(app: &App, args: LoginArgs) -> Result<()> {
    let credentials = Credentials {
        method: args.method,
        identifier: args.identifier,
        password: args.password,
    };
    let signed_in = app.gateway().sign_in(&credentials).await?;
    app.prefs().mark_visited();

    println!("Signed in as {}", signed_in.session.user.contact.value());
    report_referral(&signed_in.referral);
    Ok(())
}

async fn sign_up(app: &App, args: SignUpArgs) -> Result<()> {
    if let Some(url) = &args.ref_url {
        app.linker().capture_from_url(url);
    }
    if let Some(code) = &args.invite {
        app.linker().capture(code, CaptureSource::Manual);
    }

    let form = SignUpForm {
        method: args.method,
        identifier: args.identifier,
        password: args.password,
        confirm_password: args.confirm_password,
        invitation_code: app.linker().candidate().unwrap_or_default(),
    };
    let result = app.gateway().sign_up(&form).await?;
    app.prefs().mark_visited();

    match result {
        SignUpResult::Registered { referral } => {
            println!("Account created");
            report_referral(&referral);
        }
        SignUpResult::VerificationRequired { method } => match method {
            AuthMethod::Email => println!("Check your email to confirm the account"),
            AuthMethod::Phone => println!("Check your phone to confirm the account"),
        },
    }
    Ok(())
}

async fn reset_password(app: &App, args: ResetArgs) -> Result<()> {
    app.backend()
        .recover_from_redirect(&args.link)
        .await
        .map_err(|err| auth_error(&err))?;
    info!("recovery session established");

    let form = PasswordResetForm {
        new_password: args.password,
        confirm_password: args.confirm_password,
    };
    app.gateway().reset_password(&form).await?;
    app.notices().success("Password updated");
    println!("Password updated, sign in again with the new password");
    Ok(())
}

fn report_referral(outcome: &LinkOutcome) {
    match outcome {
        LinkOutcome::Linked { code } => println!("Invitation code {code} applied"),
        LinkOutcome::Failed { code, error } => {
            println!("Invitation code {code} kept for later: {error}");
        }
        LinkOutcome::Dropped { code, error } => {
            println!("Invitation code {code} discarded after repeated failures: {error}");
        }
        LinkOutcome::NoPending | LinkOutcome::NoSession | LinkOutcome::InFlight => {}
    }
}
