//! Fixtures for in-crate tests that talk to a `wiremock` server.

use crate::{
    features::auth::{
        events::{AuthChange, AuthChangeKind, AuthEvents},
        state::{SessionStore, SessionSubscription},
        types::{Contact, Session, User},
    },
    shared::{
        api::ApiClient,
        config::{AppConfig, BuildMode},
    },
};
use secrecy::SecretString;
use serde_json::Map;
use std::{net::TcpListener, path::PathBuf, sync::Arc};

pub(crate) fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

pub(crate) fn config(api_base_url: &str, app_origin: &str) -> AppConfig {
    AppConfig {
        api_base_url: api_base_url.to_string(),
        app_origin: app_origin.to_string(),
        auth_url: String::new(),
        auth_key: SecretString::from(String::new()),
        mode: BuildMode::Development,
        storage_path: PathBuf::from("unused.json"),
    }
}

pub(crate) fn session(user_id: &str) -> Session {
    Session {
        access_token: SecretString::from(format!("token-{user_id}")),
        refresh_token: None,
        expires_at: None,
        user: User {
            id: user_id.to_string(),
            contact: Contact::Email(format!("{user_id}@dajoweb.org")),
            metadata: Map::new(),
        },
    }
}

/// An API client whose session store follows a local event registry.
pub(crate) struct TestClient {
    pub api: ApiClient,
    pub events: AuthEvents,
    _subscription: SessionSubscription,
}

impl TestClient {
    pub fn new(api_base_url: &str, app_origin: &str) -> Self {
        let store = SessionStore::new();
        let events = AuthEvents::new();
        let subscription = store.subscribe(&events, |_| {}).unwrap();
        let api = ApiClient::new(Arc::new(config(api_base_url, app_origin)), store).unwrap();
        Self {
            api,
            events,
            _subscription: subscription,
        }
    }

    pub fn signed_in(api_base_url: &str, user_id: &str) -> Self {
        let client = Self::new(api_base_url, api_base_url);
        client.events.emit(&AuthChange {
            kind: AuthChangeKind::SignedIn,
            session: Some(session(user_id)),
        });
        client
    }
}
