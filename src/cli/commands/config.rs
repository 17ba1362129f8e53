use clap::{Arg, Command};

pub const ARG_BACKEND_URL: &str = "backend-url";
pub const ARG_APP_ORIGIN: &str = "app-origin";
pub const ARG_AUTH_URL: &str = "auth-url";
pub const ARG_AUTH_KEY: &str = "auth-key";
pub const ARG_MODE: &str = "mode";
pub const ARG_STORAGE_PATH: &str = "storage-path";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BACKEND_URL)
                .long("backend-url")
                .help("Base URL of the business API, example: https://api.dajoweb.org")
                .env("DOJA_BACKEND_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_APP_ORIGIN)
                .long("app-origin")
                .help("Origin of the web application (catalog proxy, invite links, email redirects)")
                .env("DOJA_APP_ORIGIN")
                .global(true),
        )
        .arg(
            Arg::new(ARG_AUTH_URL)
                .long("auth-url")
                .help("Base URL of the auth backend")
                .env("DOJA_AUTH_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_AUTH_KEY)
                .long("auth-key")
                .help("Public (anon) key of the auth backend")
                .env("DOJA_AUTH_KEY")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_MODE)
                .long("mode")
                .help("Build mode; production refuses to run without a backend URL")
                .env("DOJA_MODE")
                .global(true)
                .value_parser(["development", "production"]),
        )
        .arg(
            Arg::new(ARG_STORAGE_PATH)
                .long("storage-path")
                .help("JSON file holding the session and local preferences")
                .env("DOJA_STORAGE_PATH")
                .global(true),
        )
}
