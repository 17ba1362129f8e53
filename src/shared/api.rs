//! Authorized HTTP access to the business API. Every call goes through
//! [`ApiClient::request`], which reads the bearer token from the session store
//! at call time, resolves the URL against the configured base, and turns any
//! non-2xx response into a classified [`AppError`]. The client never logs
//! request bodies or tokens; bodies may carry PINs and passwords.

use super::{
    config::{AppConfig, BuildMode, PROXY_PREFIX},
    errors::{sanitize_text, AppError, ErrorKind, Payload},
};
use crate::{
    features::auth::{state::SessionStore, types::User},
    APP_USER_AGENT,
};
use reqwest::{header, Client, Method};
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tracing::{debug, instrument};
use url::Url;

/// Default request timeout (milliseconds) applied to every call.
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: Vec::new(),
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Option<Value>) -> Self {
        Self {
            method: Method::POST,
            body,
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: Arc<AppConfig>,
    session: SessionStore,
}

impl ApiClient {
    /// # Errors
    /// Returns a config error if the HTTP client cannot be built.
    pub fn new(config: Arc<AppConfig>, session: SessionStore) -> Result<Self, AppError> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .build()
            .map_err(|err| AppError::config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            config,
            session,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Returns the signed-in user or an auth error, without touching the network.
    ///
    /// # Errors
    /// Returns an auth error when no session is present.
    pub fn require_user(&self) -> Result<User, AppError> {
        self.session
            .user()
            .ok_or_else(|| AppError::auth("You must sign in first."))
    }

    /// Resolves a request path the way the web application does: absolute
    /// URLs and the catalog proxy prefix pass through unchanged, other paths
    /// are joined to the backend base. In production a missing base is a
    /// configuration error rather than a silent relative call.
    ///
    /// # Errors
    /// Returns a config error in production mode when the backend base URL is unset.
    pub fn resolve_url(&self, path: &str) -> Result<String, AppError> {
        let path = path.trim();
        if is_absolute(path) || path.starts_with(PROXY_PREFIX) {
            return Ok(path.to_string());
        }

        let base = self.config.api_base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            if self.config.mode == BuildMode::Production {
                return Err(AppError::config(format!(
                    "DOJA_BACKEND_URL must be configured in production (refusing to call {path})"
                )));
            }
            return Ok(path.to_string());
        }

        Ok(format!("{}/{}", base, path.trim_start_matches('/')))
    }

    fn absolute_url(&self, resolved: &str) -> Result<Url, AppError> {
        if is_absolute(resolved) {
            return Url::parse(resolved)
                .map_err(|err| AppError::config(format!("Invalid URL {resolved}: {err}")));
        }

        let origin = self.config.app_origin.trim();
        if origin.is_empty() {
            return Err(AppError::config(format!(
                "No application origin configured to resolve {resolved}"
            )));
        }
        let origin = Url::parse(origin)
            .map_err(|err| AppError::config(format!("Invalid application origin: {err}")))?;
        origin
            .join(resolved)
            .map_err(|err| AppError::config(format!("Invalid path {resolved}: {err}")))
    }

    /// Sends a request and returns the decoded body (`None` for an empty body).
    ///
    /// # Errors
    /// Returns a config error before any network call if the URL cannot be
    /// resolved, a transport error on network failure, or a classified error
    /// for any non-2xx response.
    #[instrument(skip_all, fields(path = %path, method = %options.method))]
    pub async fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<Payload>, AppError> {
        let resolved = self.resolve_url(path)?;
        let url = self.absolute_url(&resolved)?;

        let mut builder = self
            .http
            .request(options.method, url)
            .header(header::ACCEPT, "application/json");

        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        // read at call time: tokens rotate on refresh
        if let Some(token) = self.session.access_token() {
            builder = builder.bearer_auth(token.expose_secret());
        }

        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_request_error)?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let payload = parse_payload(&text);

        debug!(status = status.as_u16(), "api response");

        if status.is_success() {
            Ok(payload)
        } else {
            Err(error_from_response(status.as_u16(), payload))
        }
    }

    /// # Errors
    /// See [`ApiClient::request`]; also fails if the body does not match `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let payload = self.request(path, RequestOptions::get()).await?;
        decode_payload(payload)
    }

    /// # Errors
    /// See [`ApiClient::request`]; also fails if the body does not match `T`.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let body = serde_json::to_value(body).map_err(|err| {
            AppError::new(
                ErrorKind::Validation,
                format!("Failed to encode request: {err}"),
            )
        })?;
        let payload = self.request(path, RequestOptions::post(Some(body))).await?;
        decode_payload(payload)
    }

    /// # Errors
    /// See [`ApiClient::request`]; also fails if the body does not match `T`.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let payload = self.request(path, RequestOptions::post(None)).await?;
        decode_payload(payload)
    }
}

fn is_absolute(path: &str) -> bool {
    let lowered = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

/// Maps network errors into transport errors with timeout detection.
fn map_request_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::transport("Request timed out. Please try again.")
    } else {
        AppError::transport(format!("Unable to reach the server: {err}"))
    }
}

/// Reads a body as JSON when possible, keeping HTML pages and other text as
/// distinguishable shapes instead of failing.
pub(crate) fn parse_payload(text: &str) -> Option<Payload> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let head = trimmed.get(..15).unwrap_or(trimmed).to_ascii_lowercase();
    if head.starts_with("<!doctype") || head.starts_with("<html") {
        return Some(Payload::Html(trimmed.to_string()));
    }

    Some(match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Payload::Json(value),
        Err(_) => Payload::Raw(text.to_string()),
    })
}

/// Builds the error for a non-2xx response. Message priority: structured
/// `error`/`message` field, HTML placeholder with status, raw text, generic.
pub(crate) fn error_from_response(status: u16, payload: Option<Payload>) -> AppError {
    let structured = match &payload {
        Some(Payload::Json(value)) => structured_message(value),
        _ => None,
    };

    let (kind, message) = match (&payload, structured) {
        (_, Some(message)) => (kind_for_status(status), message),
        (Some(Payload::Html(_)), None) => (
            ErrorKind::Transport,
            format!("Endpoint not found ({status})"),
        ),
        (Some(Payload::Raw(text)), None) if !text.trim().is_empty() => {
            (kind_for_status(status), sanitize_text(text))
        }
        _ => (kind_for_status(status), format!("Request failed ({status})")),
    };

    AppError::new(kind, message)
        .with_status(status)
        .with_payload(payload)
}

fn structured_message(value: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .filter_map(|field| value.get(*field))
        .find_map(|field| match field {
            Value::String(text) if !text.trim().is_empty() => Some(sanitize_text(text)),
            Value::String(_) | Value::Null | Value::Bool(false) => None,
            other => Some(sanitize_text(&other.to_string())),
        })
}

fn kind_for_status(status: u16) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::Authorization,
        _ => ErrorKind::Business,
    }
}

/// Decodes a successful payload into `T`. HTML or raw text where JSON was
/// expected is a transport error that keeps the payload for diagnostics.
pub(crate) fn decode_payload<T: DeserializeOwned>(
    payload: Option<Payload>,
) -> Result<T, AppError> {
    match payload {
        Some(Payload::Json(value)) => decode_value(value),
        None => decode_value(Value::Null),
        Some(html @ Payload::Html(_)) => Err(AppError::transport(
            "Received an HTML page instead of JSON; check the backend URL configuration.",
        )
        .with_payload(Some(html))),
        Some(raw @ Payload::Raw(_)) => {
            Err(AppError::transport("Response was not valid JSON.").with_payload(Some(raw)))
        }
    }
}

pub(crate) fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|err| AppError::transport(format!("Failed to decode response: {err}")))
}

/// Reads a number that may arrive as a JSON number or a numeric string.
pub(crate) fn json_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

/// `deserialize_with` helper for amounts the backend sends as numbers or
/// numeric strings. Anything else reads as `None`.
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(json_number(value.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::BuildMode;
    use secrecy::SecretString;
    use serde_json::json;
    use std::path::PathBuf;

    fn client(base: &str, mode: BuildMode) -> ApiClient {
        let config = AppConfig {
            api_base_url: base.to_string(),
            app_origin: "https://www.dajoweb.org".to_string(),
            auth_url: String::new(),
            auth_key: SecretString::from(String::new()),
            mode,
            storage_path: PathBuf::from("unused.json"),
        };
        ApiClient::new(Arc::new(config), SessionStore::new()).unwrap()
    }

    #[test]
    fn resolve_url_joins_backend_base() {
        let api = client("https://api.dajoweb.org/", BuildMode::Production);
        assert_eq!(
            api.resolve_url("/api/me").unwrap(),
            "https://api.dajoweb.org/api/me"
        );
        assert_eq!(
            api.resolve_url("api/me").unwrap(),
            "https://api.dajoweb.org/api/me"
        );
    }

    #[test]
    fn resolve_url_keeps_proxy_and_absolute_paths() {
        let api = client("https://api.dajoweb.org", BuildMode::Production);
        assert_eq!(
            api.resolve_url("/api/pexels/videos/popular?page=1").unwrap(),
            "/api/pexels/videos/popular?page=1"
        );
        assert_eq!(
            api.resolve_url("https://other.example/x").unwrap(),
            "https://other.example/x"
        );
    }

    #[test]
    fn production_without_base_is_a_config_error() {
        let api = client("", BuildMode::Production);
        let err = api.resolve_url("/api/me").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.message().contains("DOJA_BACKEND_URL"));

        // the catalog proxy is unaffected
        assert_eq!(
            api.resolve_url("/api/pexels/videos/search?query=movie").unwrap(),
            "/api/pexels/videos/search?query=movie"
        );
    }

    #[test]
    fn development_without_base_passes_through() {
        let api = client("", BuildMode::Development);
        assert_eq!(api.resolve_url("/api/me").unwrap(), "/api/me");
    }

    #[test]
    fn parse_payload_distinguishes_shapes() {
        assert_eq!(parse_payload(""), None);
        assert_eq!(parse_payload("   \n"), None);
        assert_eq!(
            parse_payload(r#"{"ok":true}"#),
            Some(Payload::Json(json!({"ok": true})))
        );
        assert!(matches!(
            parse_payload("<!DOCTYPE html><html></html>"),
            Some(Payload::Html(_))
        ));
        assert!(matches!(
            parse_payload("  <html lang=\"es\">"),
            Some(Payload::Html(_))
        ));
        assert_eq!(
            parse_payload("Bad Gateway"),
            Some(Payload::Raw("Bad Gateway".to_string()))
        );
    }

    #[test]
    fn error_message_priority() {
        let err = error_from_response(
            400,
            Some(Payload::Json(json!({"error": "Saldo insuficiente", "message": "x"}))),
        );
        assert_eq!(err.message(), "Saldo insuficiente");
        assert_eq!(err.kind(), ErrorKind::Business);
        assert_eq!(err.status(), Some(400));

        let err = error_from_response(422, Some(Payload::Json(json!({"message": "PIN invalido"}))));
        assert_eq!(err.message(), "PIN invalido");

        let err = error_from_response(400, Some(Payload::Json(json!({"error": {"field": "pin"}}))));
        assert_eq!(err.message(), r#"{"field":"pin"}"#);

        let err = error_from_response(404, Some(Payload::Html("<html>".to_string())));
        assert_eq!(err.message(), "Endpoint not found (404)");
        assert_eq!(err.kind(), ErrorKind::Transport);

        let err = error_from_response(502, Some(Payload::Raw("upstream down".to_string())));
        assert_eq!(err.message(), "upstream down");

        let err = error_from_response(500, None);
        assert_eq!(err.message(), "Request failed (500)");

        let err = error_from_response(500, Some(Payload::Json(json!({"error": ""}))));
        assert_eq!(err.message(), "Request failed (500)");
    }

    #[test]
    fn forbidden_is_an_authorization_error() {
        let err = error_from_response(403, Some(Payload::Json(json!({"error": "forbidden"}))));
        assert_eq!(err.kind(), ErrorKind::Authorization);
        let err = error_from_response(401, None);
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn numbers_accept_strings() {
        assert_eq!(json_number(Some(&json!(12.5))), Some(12.5));
        assert_eq!(json_number(Some(&json!(" 7 "))), Some(7.0));
        assert_eq!(json_number(Some(&json!("n/a"))), None);
        assert_eq!(json_number(None), None);
    }

    #[test]
    fn decode_payload_rejects_html() {
        let result: Result<Value, _> =
            decode_payload(Some(Payload::Html("<html></html>".to_string())));
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.is_html_response());

        let empty: Option<Value> = decode_payload(None).unwrap();
        assert_eq!(empty, None);
    }
}
