//! Credential flows: sign-in, sign-up, password reset and sign-out. The
//! gateway validates forms locally, calls the auth backend and converts its
//! errors to [`AppError`]s carrying the normalized message. It never writes
//! the session itself; the store follows the backend's events. Once a call
//! yields a session, the pending invitation code is applied.

use super::{
    backend::{AuthBackend, BackendError},
    types::{
        AuthMethod, Credentials, PasswordResetForm, SignUpForm, SignUpRequest, Session,
    },
};
use crate::{
    features::referrals::{linker::ReferralLinker, types::LinkOutcome, ReferralApi},
    shared::{
        config::AppConfig,
        errors::{swallowed, AppError},
    },
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{info, instrument};

/// Shortest password accepted by the reset flow.
pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug)]
pub struct SignedIn {
    pub session: Session,
    pub referral: LinkOutcome,
}

#[derive(Debug)]
pub enum SignUpResult {
    /// The account was confirmed immediately and a session exists.
    Registered { referral: LinkOutcome },
    /// The backend sent a verification message on this channel.
    VerificationRequired { method: AuthMethod },
}

/// Converts a backend error into an auth error with the normalized message.
pub fn auth_error(err: &BackendError) -> AppError {
    let error = AppError::auth(err.display_message());
    match err.status {
        Some(status) => error.with_status(status),
        None => error,
    }
}

fn require_identifier(method: AuthMethod, identifier: &str) -> Result<String, AppError> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(AppError::validation(match method {
            AuthMethod::Email => "Enter your email",
            AuthMethod::Phone => "Enter your phone number",
        }));
    }
    Ok(identifier.to_string())
}

fn require_password(password: &SecretString) -> Result<(), AppError> {
    if password.expose_secret().is_empty() {
        return Err(AppError::validation("Enter your password"));
    }
    Ok(())
}

/// Checks a sign-in form without touching the network.
///
/// # Errors
/// Returns a validation error for an empty identifier or password.
pub fn validate_credentials(credentials: &Credentials) -> Result<Credentials, AppError> {
    let identifier = require_identifier(credentials.method, &credentials.identifier)?;
    require_password(&credentials.password)?;
    Ok(Credentials {
        method: credentials.method,
        identifier,
        password: credentials.password.clone(),
    })
}

/// Checks a sign-up form and builds the backend request. Synchronous; a
/// mismatched confirmation never reaches the backend.
///
/// # Errors
/// Returns a validation error for empty fields or mismatched passwords.
pub fn validate_sign_up(
    form: &SignUpForm,
    email_redirect_to: Option<&str>,
) -> Result<SignUpRequest, AppError> {
    let identifier = require_identifier(form.method, &form.identifier)?;
    require_password(&form.password)?;
    if form.password.expose_secret() != form.confirm_password.expose_secret() {
        return Err(AppError::validation("Passwords do not match"));
    }

    let invitation_code = Some(form.invitation_code.trim())
        .filter(|code| !code.is_empty())
        .map(str::to_string);
    // phone sign-ups have no confirmation link
    let email_redirect_to = match form.method {
        AuthMethod::Email => email_redirect_to.map(str::to_string),
        AuthMethod::Phone => None,
    };

    Ok(SignUpRequest {
        credentials: Credentials {
            method: form.method,
            identifier,
            password: form.password.clone(),
        },
        invitation_code,
        email_redirect_to,
    })
}

/// Checks a new password and its confirmation.
///
/// # Errors
/// Returns a validation error if the password is too short or mismatched.
pub fn validate_password_reset(form: &PasswordResetForm) -> Result<(), AppError> {
    if form.new_password.expose_secret().chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    if form.new_password.expose_secret() != form.confirm_password.expose_secret() {
        return Err(AppError::validation("Passwords do not match"));
    }
    Ok(())
}

pub struct AuthGateway<B, A> {
    backend: Arc<B>,
    linker: Arc<ReferralLinker<A>>,
    config: Arc<AppConfig>,
}

impl<B: AuthBackend, A: ReferralApi> AuthGateway<B, A> {
    pub fn new(backend: Arc<B>, linker: Arc<ReferralLinker<A>>, config: Arc<AppConfig>) -> Self {
        Self {
            backend,
            linker,
            config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn linker(&self) -> &ReferralLinker<A> {
        &self.linker
    }

    /// # Errors
    /// Returns a validation error for an incomplete form or an auth error
    /// with the normalized backend message.
    #[instrument(skip_all, fields(method = %credentials.method))]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<SignedIn, AppError> {
        let credentials = validate_credentials(credentials)?;
        let session = self
            .backend
            .sign_in_with_password(&credentials)
            .await
            .map_err(|err| auth_error(&err))?;

        info!("signed in");
        let referral = self.linker.consume_pending().await;
        Ok(SignedIn { session, referral })
    }

    /// # Errors
    /// Returns a validation error (without any network call) for an invalid
    /// form, or an auth error with the normalized backend message.
    #[instrument(skip_all, fields(method = %form.method))]
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<SignUpResult, AppError> {
        let request = validate_sign_up(form, self.config.email_redirect_url())?;
        let outcome = self
            .backend
            .sign_up(&request)
            .await
            .map_err(|err| auth_error(&err))?;

        if let Some(code) = &request.invitation_code {
            self.linker.store_pending(code);
        }

        if outcome.session.is_some() {
            info!("signed up with immediate session");
            let referral = self.linker.consume_pending().await;
            return Ok(SignUpResult::Registered { referral });
        }

        info!("sign-up awaits verification");
        Ok(SignUpResult::VerificationRequired {
            method: request.credentials.method,
        })
    }

    /// Sets a new password for the current (recovery) session, then signs
    /// out so the user logs in again with it.
    ///
    /// # Errors
    /// Returns a validation error for an invalid form or an auth error if
    /// the backend rejects the update.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, form: &PasswordResetForm) -> Result<(), AppError> {
        validate_password_reset(form)?;
        self.backend
            .update_user(&form.new_password)
            .await
            .map_err(|err| auth_error(&err))?;

        if let Err(err) = self.backend.sign_out().await {
            swallowed("sign out after password reset", &err);
        }
        Ok(())
    }

    /// # Errors
    /// Returns an auth error if the backend rejects the sign-out.
    #[instrument(skip_all)]
    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.backend.sign_out().await.map_err(|err| auth_error(&err))
    }
}
