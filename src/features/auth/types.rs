//! Session, user and credential types. Passwords and tokens are held in
//! `SecretString` so `Debug` output and tracing fields never reveal them.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

/// Metadata key under which sign-up records the invitation code.
pub const INVITATION_CODE_KEY: &str = "invitation_code";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMethod {
    Email,
    Phone,
}

impl FromStr for AuthMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "phone" | "mobile" => Ok(Self::Phone),
            other => Err(format!("invalid auth method: {other}")),
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => f.write_str("email"),
            Self::Phone => f.write_str("phone"),
        }
    }
}

/// The single identifying contact method of an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contact {
    Email(String),
    Phone(String),
}

impl Contact {
    pub fn value(&self) -> &str {
        match self {
            Self::Email(value) | Self::Phone(value) => value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub contact: Contact,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl User {
    /// Invitation code recorded in the metadata at sign-up, if any.
    pub fn invitation_code(&self) -> Option<&str> {
        self.metadata
            .get(INVITATION_CODE_KEY)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

/// Backend-issued proof of authentication. Replaced wholesale on every change.
#[derive(Clone, Debug)]
pub struct Session {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    /// Unix seconds; `None` when the backend did not say.
    pub expires_at: Option<u64>,
    pub user: User,
}

impl Session {
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[derive(Clone, Debug)]
pub struct Credentials {
    pub method: AuthMethod,
    pub identifier: String,
    pub password: SecretString,
}

#[derive(Clone, Debug)]
pub struct SignUpForm {
    pub method: AuthMethod,
    pub identifier: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub invitation_code: String,
}

/// What the gateway sends to the backend once the form is valid.
#[derive(Clone, Debug)]
pub struct SignUpRequest {
    pub credentials: Credentials,
    pub invitation_code: Option<String>,
    pub email_redirect_to: Option<String>,
}

/// A session is only present when the backend auto-confirms the account.
#[derive(Clone, Debug, Default)]
pub struct SignUpOutcome {
    pub user: Option<User>,
    pub session: Option<Session>,
}

#[derive(Clone, Debug)]
pub struct PasswordResetForm {
    pub new_password: SecretString,
    pub confirm_password: SecretString,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_method_accepts_mobile_alias() {
        assert_eq!("mobile".parse::<AuthMethod>(), Ok(AuthMethod::Phone));
        assert_eq!("Email".parse::<AuthMethod>(), Ok(AuthMethod::Email));
        assert!("sms".parse::<AuthMethod>().is_err());
    }

    #[test]
    fn invitation_code_is_trimmed_and_optional() {
        let mut user = User {
            id: "u1".to_string(),
            contact: Contact::Email("a@b.co".to_string()),
            metadata: Map::new(),
        };
        assert_eq!(user.invitation_code(), None);

        user.metadata
            .insert(INVITATION_CODE_KEY.to_string(), json!("  1368AF63 "));
        assert_eq!(user.invitation_code(), Some("1368AF63"));

        user.metadata.insert(INVITATION_CODE_KEY.to_string(), json!(null));
        assert_eq!(user.invitation_code(), None);
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let session = Session {
            access_token: SecretString::from("super-secret-token".to_string()),
            refresh_token: None,
            expires_at: Some(10),
            user: User {
                id: "u1".to_string(),
                contact: Contact::Phone("+15551234567".to_string()),
                metadata: Map::new(),
            },
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("super-secret-token"));
        assert!(session.is_expired(10));
        assert!(!session.is_expired(9));
    }
}
