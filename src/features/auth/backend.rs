//! Contract toward the authentication backend and the shape of its errors.
//! Backend errors arrive as loose bags of optional fields; they are decoded
//! once into [`BackendError`] and rendered to a single display string by
//! [`BackendError::display_message`].

use super::{
    events::AuthEvents,
    types::{Credentials, Session, SignUpOutcome, SignUpRequest, User},
};
use secrecy::SecretString;
use serde_json::Value;
use std::{fmt, future::Future};

const SEPARATOR: &str = " | ";
const UNKNOWN_ERROR: &str = "Unknown error";

/// Session primitive of the auth backend. Implementations emit every session
/// transition through [`AuthBackend::events`] before the corresponding call
/// returns.
pub trait AuthBackend: Send + Sync {
    fn events(&self) -> &AuthEvents;

    /// Current session, restoring or refreshing a persisted one if needed.
    fn get_session(&self)
        -> impl Future<Output = Result<Option<Session>, BackendError>> + Send;

    fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Session, BackendError>> + Send;

    fn sign_up(
        &self,
        request: &SignUpRequest,
    ) -> impl Future<Output = Result<SignUpOutcome, BackendError>> + Send;

    /// Changes the password of the user owning the current session.
    fn update_user(
        &self,
        password: &SecretString,
    ) -> impl Future<Output = Result<User, BackendError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), BackendError>> + Send;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BackendError {
    pub message: Option<String>,
    pub code: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
    pub status: Option<u16>,
    /// Original body, kept for the last-resort rendering.
    pub raw: Option<Value>,
}

impl BackendError {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Decodes an error body. Accepts the GoTrue (`msg`, `error_description`,
    /// `error_code`) and PostgREST (`message`, `code`, `details`, `hint`) shapes.
    pub fn from_json(status: Option<u16>, value: &Value) -> Self {
        let message = first_text(value, &["message", "msg", "error_description", "error"]);
        let code = first_text(value, &["error_code", "code"]);
        let details = first_text(value, &["details"]);
        let hint = first_text(value, &["hint"]);
        let status = status.or_else(|| {
            ["status", "statusCode"]
                .iter()
                .filter_map(|key| value.get(*key))
                .find_map(Value::as_u64)
                .and_then(|status| u16::try_from(status).ok())
        });

        Self {
            message,
            code,
            details,
            hint,
            status,
            raw: Some(value.clone()),
        }
    }

    /// Renders every present field, in order, joined by a fixed separator.
    /// Never returns an empty string.
    pub fn display_message(&self) -> String {
        let mut parts = Vec::new();
        if let Some(message) = self.message.as_deref().filter(|m| *m != "{}") {
            parts.push(message.to_string());
        }
        if let Some(code) = &self.code {
            parts.push(format!("code: {code}"));
        }
        if let Some(details) = &self.details {
            parts.push(format!("details: {details}"));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("hint: {hint}"));
        }
        if let Some(status) = self.status {
            parts.push(format!("status: {status}"));
        }

        if !parts.is_empty() {
            return parts.join(SEPARATOR);
        }

        match &self.raw {
            Some(Value::Null) | None => UNKNOWN_ERROR.to_string(),
            Some(Value::Object(map)) if map.is_empty() => UNKNOWN_ERROR.to_string(),
            Some(raw) => format!("{UNKNOWN_ERROR}: {raw}"),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_message())
    }
}

impl std::error::Error for BackendError {}

fn first_text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find_map(|field| match field {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
}
