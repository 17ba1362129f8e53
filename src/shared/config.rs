//! Client configuration: build-time defaults with optional runtime overrides.
//! Defaults come from `option_env!` so a release build can bake in its
//! endpoints; the CLI (or an embedding application) then applies overrides,
//! ignoring empty values. The auth key is the public anon key of the auth
//! backend, it is still kept in a `SecretString` so it never lands in logs.

use secrecy::SecretString;
use std::{fmt, path::PathBuf, str::FromStr};
use thiserror::Error;

/// Same-origin path prefix forwarded server-side to the video catalog.
/// Never joined with the backend base URL.
pub const PROXY_PREFIX: &str = "/api/pexels";

const DEFAULT_STORAGE_PATH: &str = ".dojaweb/storage.json";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid mode: {0}")]
    InvalidMode(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    /// Mode implied by the compilation profile.
    pub const fn from_profile() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }
}

impl FromStr for BuildMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Base URL of the business API; relative `/api/...` paths are joined to it.
    pub api_base_url: String,
    /// Origin the web application is served from. Hosts the catalog proxy and
    /// is used for email redirects and invite links.
    pub app_origin: String,
    /// Base URL of the auth backend (GoTrue compatible).
    pub auth_url: String,
    pub auth_key: SecretString,
    pub mode: BuildMode,
    pub storage_path: PathBuf,
}

impl AppConfig {
    /// Loads the compiled-in defaults.
    pub fn load() -> Self {
        let api_base_url = option_env!("DOJA_BACKEND_URL").unwrap_or("");
        let app_origin = option_env!("DOJA_APP_ORIGIN").unwrap_or("");
        let auth_url = option_env!("DOJA_AUTH_URL").unwrap_or("");
        let auth_key = option_env!("DOJA_AUTH_KEY").unwrap_or("");

        Self {
            api_base_url: trim_base(api_base_url),
            app_origin: trim_base(app_origin),
            auth_url: trim_base(auth_url),
            auth_key: SecretString::from(auth_key.to_string()),
            mode: BuildMode::from_profile(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }

    /// Loads the defaults and applies the given overrides.
    pub fn with_overrides(runtime: RuntimeConfig) -> Self {
        let mut config = Self::load();
        apply_runtime_overrides(&mut config, runtime);
        config
    }

    /// Where sign-up confirmation emails should send the user back to.
    pub fn email_redirect_url(&self) -> Option<&str> {
        if self.app_origin.is_empty() {
            None
        } else {
            Some(&self.app_origin)
        }
    }
}

/// Values supplied at runtime (CLI flags or environment). Empty strings are
/// treated as absent.
#[derive(Default, Debug)]
pub struct RuntimeConfig {
    pub api_base_url: Option<String>,
    pub app_origin: Option<String>,
    pub auth_url: Option<String>,
    pub auth_key: Option<String>,
    pub mode: Option<BuildMode>,
    pub storage_path: Option<String>,
}

pub(crate) fn apply_runtime_overrides(config: &mut AppConfig, runtime: RuntimeConfig) {
    if let Some(value) = runtime.api_base_url.as_deref().and_then(normalize_runtime_value) {
        config.api_base_url = trim_base(&value);
    }
    if let Some(value) = runtime.app_origin.as_deref().and_then(normalize_runtime_value) {
        config.app_origin = trim_base(&value);
    }
    if let Some(value) = runtime.auth_url.as_deref().and_then(normalize_runtime_value) {
        config.auth_url = trim_base(&value);
    }
    if let Some(value) = runtime.auth_key.as_deref().and_then(normalize_runtime_value) {
        config.auth_key = SecretString::from(value);
    }
    if let Some(mode) = runtime.mode {
        config.mode = mode;
    }
    if let Some(value) = runtime.storage_path.as_deref().and_then(normalize_runtime_value) {
        config.storage_path = PathBuf::from(value);
    }
}

pub(crate) fn normalize_runtime_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn trim_base(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn base_config() -> AppConfig {
        AppConfig {
            api_base_url: "https://api.default".to_string(),
            app_origin: "https://app.default".to_string(),
            auth_url: "https://auth.default".to_string(),
            auth_key: SecretString::from("default-key".to_string()),
            mode: BuildMode::Development,
            storage_path: PathBuf::from("default.json"),
        }
    }

    #[test]
    fn normalize_runtime_value_trims_and_rejects_empty() {
        assert_eq!(normalize_runtime_value(""), None);
        assert_eq!(normalize_runtime_value("   "), None);
        assert_eq!(
            normalize_runtime_value("  https://api.dajoweb.org "),
            Some("https://api.dajoweb.org".to_string())
        );
    }

    #[test]
    fn apply_runtime_overrides_ignores_empty_values() {
        let mut config = base_config();
        let runtime = RuntimeConfig {
            api_base_url: Some(String::new()),
            app_origin: Some("  ".to_string()),
            auth_url: None,
            auth_key: Some(String::new()),
            mode: None,
            storage_path: Some(" ".to_string()),
        };

        apply_runtime_overrides(&mut config, runtime);

        assert_eq!(config.api_base_url, "https://api.default");
        assert_eq!(config.app_origin, "https://app.default");
        assert_eq!(config.auth_url, "https://auth.default");
        assert_eq!(config.auth_key.expose_secret(), "default-key");
        assert_eq!(config.mode, BuildMode::Development);
        assert_eq!(config.storage_path, PathBuf::from("default.json"));
    }

    #[test]
    fn apply_runtime_overrides_overwrites_and_trims_trailing_slash() {
        let mut config = base_config();
        let runtime = RuntimeConfig {
            api_base_url: Some("https://api.override/".to_string()),
            app_origin: Some("https://www.dajoweb.org/".to_string()),
            auth_url: Some("https://auth.override".to_string()),
            auth_key: Some("override-key".to_string()),
            mode: Some(BuildMode::Production),
            storage_path: Some("/tmp/doja.json".to_string()),
        };

        apply_runtime_overrides(&mut config, runtime);

        assert_eq!(config.api_base_url, "https://api.override");
        assert_eq!(config.app_origin, "https://www.dajoweb.org");
        assert_eq!(config.auth_url, "https://auth.override");
        assert_eq!(config.auth_key.expose_secret(), "override-key");
        assert_eq!(config.mode, BuildMode::Production);
        assert_eq!(config.email_redirect_url(), Some("https://www.dajoweb.org"));
    }

    #[test]
    fn build_mode_parses_aliases() {
        assert_eq!("prod".parse::<BuildMode>(), Ok(BuildMode::Production));
        assert_eq!(" Development ".parse::<BuildMode>(), Ok(BuildMode::Development));
        assert_eq!(
            "staging".parse::<BuildMode>(),
            Err(ConfigError::InvalidMode("staging".to_string()))
        );
        assert_eq!(
            "Staging".parse::<BuildMode>().unwrap_err().to_string(),
            "invalid mode: staging"
        );
    }
}
