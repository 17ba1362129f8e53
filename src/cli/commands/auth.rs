use clap::{Arg, Command};

pub const ARG_METHOD: &str = "method";
pub const ARG_IDENTIFIER: &str = "identifier";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_CONFIRM_PASSWORD: &str = "confirm-password";
pub const ARG_INVITE: &str = "invite";
pub const ARG_REF_URL: &str = "ref-url";
pub const ARG_LINK: &str = "link";

fn method_arg() -> Arg {
    Arg::new(ARG_METHOD)
        .long("method")
        .help("Sign in with an email address or a phone number")
        .default_value("email")
        .value_parser(["email", "phone"])
}

fn identifier_arg() -> Arg {
    Arg::new(ARG_IDENTIFIER)
        .help("Email address or phone number")
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .long("password")
        .help("Account password")
        .env("DOJA_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

fn confirm_password_arg() -> Arg {
    Arg::new(ARG_CONFIRM_PASSWORD)
        .long("confirm-password")
        .help("Repeat the password")
        .env("DOJA_CONFIRM_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(Command::new("status").about("Show the current session and invite code"))
        .subcommand(
            Command::new("login")
                .about("Sign in with a password")
                .arg(method_arg())
                .arg(identifier_arg())
                .arg(password_arg()),
        )
        .subcommand(
            Command::new("signup")
                .about("Create an account, optionally with an invitation code")
                .arg(method_arg())
                .arg(identifier_arg())
                .arg(password_arg())
                .arg(confirm_password_arg())
                .arg(
                    Arg::new(ARG_INVITE)
                        .long("invite")
                        .help("Invitation code"),
                )
                .arg(
                    Arg::new(ARG_REF_URL)
                        .long("ref-url")
                        .help("Invite link carrying the code in its `ref` parameter")
                        .conflicts_with(ARG_INVITE),
                ),
        )
        .subcommand(Command::new("logout").about("Sign out and clear the local session"))
        .subcommand(
            Command::new("reset-password")
                .about("Set a new password from a recovery link")
                .arg(
                    Arg::new(ARG_LINK)
                        .long("link")
                        .help("Recovery link received by email")
                        .required(true),
                )
                .arg(password_arg().help("New password"))
                .arg(confirm_password_arg()),
        )
}
