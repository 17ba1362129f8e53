//! GoTrue-compatible auth backend over HTTP. Sessions are persisted in
//! durable storage so a restart restores them; an expired persisted session
//! is refreshed with its refresh token before it is handed out. Every session
//! transition is emitted on [`AuthEvents`] after local state is updated.

use super::{
    backend::{AuthBackend, BackendError},
    events::{AuthChange, AuthChangeKind, AuthEvents},
    types::{
        AuthMethod, Contact, Credentials, Session, SignUpOutcome, SignUpRequest, User,
        INVITATION_CODE_KEY,
    },
};
use crate::{
    shared::{
        config::AppConfig,
        errors::{sanitize_text, swallowed, AppError},
        storage::{Storage, StorageError},
    },
    APP_USER_AGENT,
};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tracing::{debug, info_span, instrument, Instrument};
use url::Url;

/// Storage key of the persisted session.
pub const SESSION_STORAGE_KEY: &str = "doja_auth_session";

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    user_metadata: Option<Map<String, Value>>,
}

impl WireUser {
    fn into_user(self) -> Result<User, BackendError> {
        let non_empty = |value: Option<String>| value.filter(|text| !text.trim().is_empty());
        let contact = match (non_empty(self.email), non_empty(self.phone)) {
            (Some(email), _) => Contact::Email(email),
            (None, Some(phone)) => Contact::Phone(phone),
            (None, None) => {
                return Err(BackendError::message(format!(
                    "auth user {} has neither email nor phone",
                    self.id
                )))
            }
        };

        Ok(User {
            id: self.id,
            contact,
            metadata: self.user_metadata.unwrap_or_default(),
        })
    }
}

#[derive(Deserialize)]
struct WireSession {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    expires_at: Option<u64>,
    user: WireUser,
}

impl WireSession {
    fn into_session(self) -> Result<Session, BackendError> {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|seconds| now() + seconds));
        Ok(Session {
            access_token: SecretString::from(self.access_token),
            refresh_token: self.refresh_token.map(SecretString::from),
            expires_at,
            user: self.user.into_user()?,
        })
    }
}

/// On-disk shape of a session. Tokens are exposed only here.
#[derive(Serialize, Deserialize)]
struct PersistedSession {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<u64>,
    user: User,
}

impl From<&Session> for PersistedSession {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.access_token.expose_secret().to_string(),
            refresh_token: session
                .refresh_token
                .as_ref()
                .map(|token| token.expose_secret().to_string()),
            expires_at: session.expires_at,
            user: session.user.clone(),
        }
    }
}

impl From<PersistedSession> for Session {
    fn from(persisted: PersistedSession) -> Self {
        Self {
            access_token: SecretString::from(persisted.access_token),
            refresh_token: persisted.refresh_token.map(SecretString::from),
            expires_at: persisted.expires_at,
            user: persisted.user,
        }
    }
}

/// Tokens carried in the fragment of a confirmation or recovery link.
#[derive(Debug)]
pub struct RedirectTokens {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_in: Option<u64>,
    pub kind: Option<String>,
}

impl RedirectTokens {
    pub fn is_recovery(&self) -> bool {
        self.kind.as_deref() == Some("recovery")
    }
}

/// Reads the tokens from a redirect URL fragment
/// (`#access_token=..&refresh_token=..&expires_in=..&type=recovery`).
///
/// # Errors
/// Returns an error if the URL is invalid, carries an error description, or
/// has no access token.
pub fn parse_redirect(link: &str) -> Result<RedirectTokens, BackendError> {
    let url = Url::parse(link)
        .map_err(|err| BackendError::message(format!("Invalid redirect link: {err}")))?;
    let fragment = url.fragment().unwrap_or_default();

    let mut access_token = None;
    let mut refresh_token = None;
    let mut expires_in = None;
    let mut kind = None;
    let mut failure = Map::new();

    for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
        match key.as_ref() {
            "access_token" => access_token = Some(value.into_owned()),
            "refresh_token" => refresh_token = Some(value.into_owned()),
            "expires_in" => expires_in = value.parse::<u64>().ok(),
            "type" => kind = Some(value.into_owned()),
            "error" | "error_code" | "error_description" => {
                failure.insert(key.into_owned(), Value::String(value.into_owned()));
            }
            _ => {}
        }
    }

    if !failure.is_empty() {
        return Err(BackendError::from_json(None, &Value::Object(failure)));
    }

    let access_token = access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| BackendError::message("Redirect link has no access token"))?;

    Ok(RedirectTokens {
        access_token: SecretString::from(access_token),
        refresh_token: refresh_token
            .filter(|token| !token.is_empty())
            .map(SecretString::from),
        expires_in,
        kind,
    })
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

pub struct GoTrueBackend {
    http: Client,
    base_url: String,
    api_key: SecretString,
    storage: Arc<dyn Storage>,
    events: AuthEvents,
    current: Mutex<Option<Session>>,
    restored: AtomicBool,
}

impl GoTrueBackend {
    /// # Errors
    /// Returns a config error if the HTTP client cannot be built.
    pub fn new(config: &AppConfig, storage: Arc<dyn Storage>) -> Result<Self, AppError> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .build()
            .map_err(|err| AppError::config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.auth_url.trim_end_matches('/').to_string(),
            api_key: config.auth_key.clone(),
            storage,
            events: AuthEvents::new(),
            current: Mutex::new(None),
            restored: AtomicBool::new(false),
        })
    }

    fn current(&self) -> MutexGuard<'_, Option<Session>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn endpoint(&self, path: &str) -> Result<String, BackendError> {
        if self.base_url.is_empty() {
            return Err(BackendError::message(
                "Auth backend URL is not configured (DOJA_AUTH_URL)",
            ));
        }
        Ok(format!("{}/auth/v1/{}", self.base_url, path))
    }

    /// Attaches the project key; `bearer` defaults to the key itself for
    /// calls made without a user session.
    fn authorize(&self, builder: RequestBuilder, bearer: Option<&SecretString>) -> RequestBuilder {
        let key = self.api_key.expose_secret();
        let bearer = bearer.map_or(key, |token| token.expose_secret());
        builder.header("apikey", key).bearer_auth(bearer)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, BackendError> {
        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                BackendError::message("Auth request timed out. Please try again.")
            } else {
                BackendError::message(format!("Unable to reach the auth server: {err}"))
            }
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&text).ok();
        debug!(status = status.as_u16(), "auth response");

        if status.is_success() {
            return Ok(body.unwrap_or(Value::Null));
        }

        Err(match body {
            Some(value @ Value::Object(_)) => BackendError::from_json(Some(status.as_u16()), &value),
            _ => BackendError {
                message: Some(sanitize_text(&text)).filter(|text| !text.is_empty()),
                status: Some(status.as_u16()),
                ..BackendError::default()
            },
        })
    }

    fn store_session(&self, session: Option<&Session>) {
        *self.current() = session.cloned();

        let result = match session {
            Some(session) => serde_json::to_string(&PersistedSession::from(session))
                .map_err(StorageError::from)
                .and_then(|encoded| self.storage.set(SESSION_STORAGE_KEY, &encoded)),
            None => self.storage.remove(SESSION_STORAGE_KEY),
        };
        if let Err(err) = result {
            swallowed("persist auth session", &err);
        }
    }

    fn emit(&self, kind: AuthChangeKind, session: Option<Session>) {
        self.events.emit(&AuthChange { kind, session });
    }

    fn load_persisted(&self) -> Option<Session> {
        let raw = self.storage.get(SESSION_STORAGE_KEY)?;
        match serde_json::from_str::<PersistedSession>(&raw) {
            Ok(persisted) => Some(persisted.into()),
            Err(err) => {
                swallowed("decode persisted auth session", &err);
                self.store_session(None);
                None
            }
        }
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &SecretString) -> Result<Session, BackendError> {
        let url = self.endpoint("token?grant_type=refresh_token")?;
        let builder = self
            .authorize(self.http.post(url), None)
            .json(&json!({ "refresh_token": refresh_token.expose_secret() }));
        let body = self.send(builder).await?;
        decode_session(body)
    }

    async fn fetch_user(&self, access_token: &SecretString) -> Result<User, BackendError> {
        let url = self.endpoint("user")?;
        let builder = self.authorize(self.http.get(url), Some(access_token));
        let body = self.send(builder).await?;
        decode_user(body)
    }

    /// Establishes a session from a confirmation or recovery link. A
    /// recovery link emits [`AuthChangeKind::PasswordRecovery`].
    ///
    /// # Errors
    /// Returns an error if the link is invalid or the backend rejects its token.
    #[instrument(skip_all)]
    pub async fn recover_from_redirect(&self, link: &str) -> Result<Session, BackendError> {
        let tokens = parse_redirect(link)?;
        let user = self.fetch_user(&tokens.access_token).await?;
        let recovery = tokens.is_recovery();

        let session = Session {
            expires_at: tokens.expires_in.map(|seconds| now() + seconds),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user,
        };

        self.store_session(Some(&session));
        let kind = if recovery {
            AuthChangeKind::PasswordRecovery
        } else {
            AuthChangeKind::SignedIn
        };
        self.emit(kind, Some(session.clone()));
        Ok(session)
    }
}

fn decode_session(body: Value) -> Result<Session, BackendError> {
    serde_json::from_value::<WireSession>(body)
        .map_err(|err| BackendError::message(format!("Unexpected auth session response: {err}")))?
        .into_session()
}

fn decode_user(body: Value) -> Result<User, BackendError> {
    serde_json::from_value::<WireUser>(body)
        .map_err(|err| BackendError::message(format!("Unexpected auth user response: {err}")))?
        .into_user()
}

/// A sign-up response is a full session when the backend auto-confirms the
/// account, otherwise the bare (or wrapped) user awaiting verification.
fn decode_sign_up(body: Value) -> Result<SignUpOutcome, BackendError> {
    if body.get("access_token").is_some() {
        let session = decode_session(body)?;
        return Ok(SignUpOutcome {
            user: Some(session.user.clone()),
            session: Some(session),
        });
    }

    let user = match body.get("user") {
        Some(user) if user.is_object() => Some(decode_user(user.clone())?),
        _ if body.get("id").is_some() => Some(decode_user(body)?),
        _ => None,
    };
    Ok(SignUpOutcome {
        user,
        session: None,
    })
}

fn credentials_body(credentials: &Credentials) -> Map<String, Value> {
    let field = match credentials.method {
        AuthMethod::Email => "email",
        AuthMethod::Phone => "phone",
    };
    let mut body = Map::new();
    body.insert(
        field.to_string(),
        Value::String(credentials.identifier.trim().to_string()),
    );
    body.insert(
        "password".to_string(),
        Value::String(credentials.password.expose_secret().to_string()),
    );
    body
}

impl AuthBackend for GoTrueBackend {
    fn events(&self) -> &AuthEvents {
        &self.events
    }

    #[instrument(skip_all)]
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        let first = !self.restored.swap(true, Ordering::SeqCst);

        let cached = self.current().clone();
        let candidate = match cached {
            Some(session) => Some(session),
            None => self.load_persisted(),
        };

        let (session, refreshed) = match candidate {
            Some(session) if session.is_expired(now()) => match session.refresh_token.clone() {
                Some(refresh_token) => match self.refresh(&refresh_token).await {
                    Ok(session) => (Some(session), true),
                    Err(err) => {
                        self.store_session(None);
                        return Err(err);
                    }
                },
                None => {
                    debug!("persisted session expired without refresh token");
                    self.store_session(None);
                    (None, false)
                }
            },
            other => (other, false),
        };

        if refreshed || first {
            self.store_session(session.as_ref());
        }
        if first {
            self.emit(AuthChangeKind::InitialSession, session.clone());
        } else if refreshed {
            self.emit(AuthChangeKind::TokenRefreshed, session.clone());
        }
        Ok(session)
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, BackendError> {
        let url = self.endpoint("token?grant_type=password")?;
        let span = info_span!("auth.sign_in", method = %credentials.method);
        let builder = self
            .authorize(self.http.post(url), None)
            .json(&credentials_body(credentials));
        let body = self.send(builder).instrument(span).await?;
        let session = decode_session(body)?;

        self.store_session(Some(&session));
        self.emit(AuthChangeKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, BackendError> {
        let mut url = Url::parse(&self.endpoint("signup")?)
            .map_err(|err| BackendError::message(format!("Invalid auth URL: {err}")))?;
        if let Some(redirect) = &request.email_redirect_to {
            url.query_pairs_mut().append_pair("redirect_to", redirect);
        }

        let mut body = credentials_body(&request.credentials);
        let mut data = Map::new();
        data.insert(
            INVITATION_CODE_KEY.to_string(),
            request
                .invitation_code
                .clone()
                .map_or(Value::Null, Value::String),
        );
        body.insert("data".to_string(), Value::Object(data));

        let span = info_span!("auth.sign_up", method = %request.credentials.method);
        let builder = self.authorize(self.http.post(url), None).json(&body);
        let response = self.send(builder).instrument(span).await?;
        let outcome = decode_sign_up(response)?;

        if let Some(session) = &outcome.session {
            self.store_session(Some(session));
            self.emit(AuthChangeKind::SignedIn, Some(session.clone()));
        }
        Ok(outcome)
    }

    #[instrument(skip_all)]
    async fn update_user(&self, password: &SecretString) -> Result<User, BackendError> {
        let session = self
            .current()
            .clone()
            .ok_or_else(|| BackendError::message("Auth session missing!"))?;

        let url = self.endpoint("user")?;
        let builder = self
            .authorize(self.http.put(url), Some(&session.access_token))
            .json(&json!({ "password": password.expose_secret() }));
        let user = decode_user(self.send(builder).await?)?;

        let updated = Session {
            user: user.clone(),
            ..session
        };
        self.store_session(Some(&updated));
        self.emit(AuthChangeKind::UserUpdated, Some(updated));
        Ok(user)
    }

    #[instrument(skip_all)]
    async fn sign_out(&self) -> Result<(), BackendError> {
        let session = self.current().clone();

        let remote = match session {
            Some(session) => match self.endpoint("logout") {
                Ok(url) => {
                    let builder = self.authorize(self.http.post(url), Some(&session.access_token));
                    self.send(builder).await.map(|_| ())
                }
                Err(err) => Err(err),
            },
            None => Ok(()),
        };

        // the token is already unusable in these cases
        let remote = remote.or_else(|err| match err.status {
            Some(401 | 403 | 404) => Ok(()),
            _ => Err(err),
        });

        self.store_session(None);
        self.emit(AuthChangeKind::SignedOut, None);
        remote
    }
}
