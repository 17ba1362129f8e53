use crate::{
    cli::commands::config::{
        ARG_APP_ORIGIN, ARG_AUTH_KEY, ARG_AUTH_URL, ARG_BACKEND_URL, ARG_MODE, ARG_STORAGE_PATH,
    },
    shared::config::{AppConfig, BuildMode, RuntimeConfig},
};
use anyhow::Result;
use clap::ArgMatches;
use secrecy::{ExposeSecret, SecretString};

/// Connection settings shared by every subcommand.
#[derive(Clone, Default)]
pub struct GlobalArgs {
    pub backend_url: Option<String>,
    pub app_origin: Option<String>,
    pub auth_url: Option<String>,
    pub auth_key: Option<SecretString>,
    pub mode: Option<BuildMode>,
    pub storage_path: Option<String>,
}

impl GlobalArgs {
    /// # Errors
    /// Returns an error if `--mode` is not a known build mode.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let mode = matches
            .get_one::<String>(ARG_MODE)
            .map(|mode| mode.parse::<BuildMode>())
            .transpose()?;

        Ok(Self {
            backend_url: matches.get_one::<String>(ARG_BACKEND_URL).cloned(),
            app_origin: matches.get_one::<String>(ARG_APP_ORIGIN).cloned(),
            auth_url: matches.get_one::<String>(ARG_AUTH_URL).cloned(),
            auth_key: matches
                .get_one::<String>(ARG_AUTH_KEY)
                .map(|key| SecretString::from(key.clone())),
            mode,
            storage_path: matches.get_one::<String>(ARG_STORAGE_PATH).cloned(),
        })
    }

    /// Compiled-in defaults with these values applied on top.
    #[must_use]
    pub fn into_config(self) -> AppConfig {
        AppConfig::with_overrides(RuntimeConfig {
            api_base_url: self.backend_url,
            app_origin: self.app_origin,
            auth_url: self.auth_url,
            auth_key: self.auth_key.map(|key| key.expose_secret().to_string()),
            mode: self.mode,
            storage_path: self.storage_path,
        })
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("backend_url", &self.backend_url)
            .field("app_origin", &self.app_origin)
            .field("auth_url", &self.auth_url)
            .field("auth_key", &self.auth_key.as_ref().map(|_| "***"))
            .field("mode", &self.mode)
            .field("storage_path", &self.storage_path)
            .finish()
    }
}
