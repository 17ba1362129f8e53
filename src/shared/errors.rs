//! Error type shared by every client-side operation. Errors are classified once,
//! at the boundary where they are produced (form validation, auth backend,
//! HTTP response handling), so callers match on [`ErrorKind`] instead of
//! probing messages.

use serde_json::Value;
use std::fmt;
use tracing::warn;

/// Maximum number of error body characters surfaced to the UI.
pub(crate) const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Local form checks; never sent to the backend.
    Validation,
    /// Bad credentials, expired recovery link, unconfirmed account.
    Auth,
    /// Insufficient privilege (401/403 from the business API).
    Authorization,
    /// Network failures, timeouts, HTML or unparseable bodies.
    Transport,
    /// Well-formed error responses from the business API.
    Business,
    /// Missing or inconsistent client configuration.
    Config,
}

/// Body of a response as the client understood it.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Json(Value),
    /// The body looked like an HTML page (wrong endpoint or proxy misconfigured).
    Html(String),
    /// Non-empty text that is neither JSON nor HTML.
    Raw(String),
}

#[derive(Clone, Debug)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
    payload: Option<Payload>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            payload: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Option<Payload>) -> Self {
        self.payload = payload;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// True for a 404 response. Endpoints that use 404 to mean "nothing yet"
    /// check this explicitly; no message matching is involved.
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// True when the response was an HTML page where JSON was expected.
    pub fn is_html_response(&self) -> bool {
        matches!(self.payload, Some(Payload::Html(_)))
    }

    /// A 404 answered by the API itself. An HTML 404 comes from a proxy or a
    /// wrong base URL and stays an error.
    pub fn is_missing_record(&self) -> bool {
        self.is_not_found() && !self.is_html_response()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)
    }
}

impl std::error::Error for AppError {}

/// Single seam for failures that are deliberately not propagated (best-effort
/// storage writes, referral linking, post-reset sign-out). Every swallowed
/// error goes through here so systemic failures show up in the logs.
pub fn swallowed(context: &str, err: &dyn fmt::Display) {
    warn!(target: "dojaweb::swallowed", context, error = %err, "ignored failure");
}

/// Trims and truncates text for user-facing messages.
pub(crate) fn sanitize_text(text: &str) -> String {
    text.trim().chars().take(MAX_ERROR_CHARS).collect()
}
