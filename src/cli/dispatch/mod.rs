use crate::{
    cli::{
        actions::{admin, referral, session, videos, vip, wallet, Action, Command},
        commands::{auth::*, business::*, referral::*},
        globals::GlobalArgs,
    },
    features::{
        admin::types::UserListQuery,
        auth::types::AuthMethod,
        videos::types::DEFAULT_PER_PAGE,
        wallet::types::{WithdrawForm, DEFAULT_NETWORK},
    },
};
use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: {id}"))
}

fn secret(matches: &ArgMatches, id: &str) -> Result<SecretString> {
    required(matches, id).map(SecretString::from)
}

fn method(matches: &ArgMatches) -> Result<AuthMethod> {
    matches
        .get_one::<String>(ARG_METHOD)
        .map_or(Ok(AuthMethod::Email), |method| method.parse().map_err(|e: String| anyhow!(e)))
}

fn plan_id(matches: &ArgMatches) -> Result<i64> {
    matches
        .get_one::<i64>(ARG_PLAN_ID)
        .copied()
        .context("missing required argument: plan-id")
}

fn session_command(name: &str, matches: &ArgMatches) -> Result<Option<session::Command>> {
    let command = match name {
        "status" => session::Command::Status,
        "logout" => session::Command::Logout,
        "login" => session::Command::Login(session::LoginArgs {
            method: method(matches)?,
            identifier: required(matches, ARG_IDENTIFIER)?,
            password: secret(matches, ARG_PASSWORD)?,
        }),
        "signup" => session::Command::SignUp(session::SignUpArgs {
            method: method(matches)?,
            identifier: required(matches, ARG_IDENTIFIER)?,
            password: secret(matches, ARG_PASSWORD)?,
            confirm_password: secret(matches, ARG_CONFIRM_PASSWORD)?,
            invite: matches.get_one::<String>(ARG_INVITE).cloned(),
            ref_url: matches.get_one::<String>(ARG_REF_URL).cloned(),
        }),
        "reset-password" => session::Command::ResetPassword(session::ResetArgs {
            link: required(matches, ARG_LINK)?,
            password: secret(matches, ARG_PASSWORD)?,
            confirm_password: secret(matches, ARG_CONFIRM_PASSWORD)?,
        }),
        _ => return Ok(None),
    };
    Ok(Some(command))
}

fn referral_command(matches: &ArgMatches) -> Result<referral::Command> {
    Ok(match matches.subcommand() {
        Some(("capture", sub)) => {
            let source = match (sub.get_one::<String>(ARG_CODE), sub.get_one::<String>(ARG_URL)) {
                (Some(code), _) => referral::Source::Code(code.clone()),
                (None, Some(url)) => referral::Source::Url(url.clone()),
                (None, None) => bail!("missing invitation code or --url"),
            };
            referral::Command::Capture(source)
        }
        Some(("link", _)) => referral::Command::Link,
        Some(("stats", _)) => referral::Command::Stats,
        Some(("members", sub)) => referral::Command::Members {
            level: sub.get_one::<u32>(ARG_LEVEL).copied(),
        },
        Some(("commissions", _)) => referral::Command::Commissions,
        _ => bail!("unknown referral command"),
    })
}

fn admin_command(matches: &ArgMatches) -> Result<admin::Command> {
    Ok(match matches.subcommand() {
        Some(("summary", _)) => admin::Command::Summary,
        Some(("users", sub)) => admin::Command::Users(UserListQuery {
            search: sub.get_one::<String>(ARG_SEARCH).cloned(),
            limit: sub.get_one::<u32>(ARG_LIMIT).copied(),
            offset: sub.get_one::<u32>(ARG_OFFSET).copied(),
        }),
        Some(("user", sub)) => admin::Command::User {
            user_id: required(sub, ARG_USER_ID)?,
            referrals: sub.get_flag(ARG_REFERRALS),
        },
        _ => bail!("unknown admin command"),
    })
}

fn vip_command(matches: &ArgMatches) -> Result<vip::Command> {
    Ok(match matches.subcommand() {
        Some(("status", _)) => vip::Command::Status,
        Some(("plans", _)) => vip::Command::Plans,
        Some(("my-plans", _)) => vip::Command::MyPlans,
        Some(("intent", sub)) => vip::Command::Intent(plan_id(sub)?),
        Some(("buy", sub)) => vip::Command::Buy(plan_id(sub)?),
        Some(("activate", sub)) => vip::Command::Activate(plan_id(sub)?),
        _ => bail!("unknown vip command"),
    })
}

fn wallet_command(matches: &ArgMatches) -> Result<wallet::Command> {
    Ok(match matches.subcommand() {
        Some(("balance", _)) => wallet::Command::Balance,
        Some(("account", _)) => wallet::Command::Account,
        Some(("history", _)) => wallet::Command::History,
        Some(("movements", _)) => wallet::Command::Movements,
        Some(("deposit", _)) => wallet::Command::Deposit,
        Some(("withdraw", sub)) => {
            let mut form = WithdrawForm::new(
                &required(sub, ARG_AMOUNT)?,
                &required(sub, ARG_ADDRESS)?,
                secret(sub, ARG_PIN)?,
            );
            form.network = sub
                .get_one::<String>(ARG_NETWORK)
                .cloned()
                .unwrap_or_else(|| DEFAULT_NETWORK.to_string());
            wallet::Command::Withdraw(wallet::WithdrawArgs {
                form,
                confirm: sub.get_flag(ARG_CONFIRM),
            })
        }
        Some(("set-pin", sub)) => wallet::Command::SetPin(secret(sub, ARG_PIN)?),
        Some(("reset-pin", sub)) => wallet::Command::ResetPin {
            password: secret(sub, ARG_ACCOUNT_PASSWORD)?,
            pin: secret(sub, ARG_PIN)?,
        },
        _ => bail!("unknown wallet command"),
    })
}

fn videos_command(matches: &ArgMatches) -> Result<videos::Command> {
    Ok(match matches.subcommand() {
        Some(("status", _)) => videos::Command::Status,
        Some(("catalog", sub)) => videos::Command::Catalog {
            page: sub.get_one::<u32>(ARG_PAGE).copied().unwrap_or(1),
            per_page: sub
                .get_one::<u32>(ARG_PER_PAGE)
                .copied()
                .unwrap_or(DEFAULT_PER_PAGE),
        },
        Some(("watch", sub)) => videos::Command::Watch {
            video_id: required(sub, ARG_VIDEO_ID)?,
            plan_id: sub.get_one::<i64>(ARG_PLAN_ID).copied(),
        },
        Some(("rate", sub)) => videos::Command::Rate {
            video_id: required(sub, ARG_VIDEO_ID)?,
            rating: sub
                .get_one::<u8>(ARG_RATING)
                .copied()
                .context("missing required argument: rating")?,
        },
        _ => bail!("unknown videos command"),
    })
}

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let globals = GlobalArgs::from_matches(matches)?;

    let Some((name, sub)) = matches.subcommand() else {
        bail!("missing command, see --help");
    };

    let command = match name {
        "referral" => Command::Referral(referral_command(sub)?),
        "admin" => Command::Admin(admin_command(sub)?),
        "vip" => Command::Vip(vip_command(sub)?),
        "wallet" => Command::Wallet(wallet_command(sub)?),
        "videos" => Command::Videos(videos_command(sub)?),
        other => match session_command(other, sub)? {
            Some(command) => Command::Session(command),
            None => bail!("unknown command: {other}"),
        },
    };

    Ok(Action { globals, command })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    fn action(args: &[&str]) -> Result<Action> {
        let matches = commands::new().try_get_matches_from(args)?;
        handler(&matches)
    }

    #[test]
    fn test_login_action() -> Result<()> {
        let action = action(&[
            "dojaweb",
            "login",
            "ana@dajoweb.org",
            "--password",
            "secret1",
        ])?;
        match action.command {
            Command::Session(session::Command::Login(args)) => {
                assert_eq!(args.method, AuthMethod::Email);
                assert_eq!(args.identifier, "ana@dajoweb.org");
                assert_eq!(args.password.expose_secret(), "secret1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_referral_capture_from_url() -> Result<()> {
        let action = action(&[
            "dojaweb",
            "referral",
            "capture",
            "--url",
            "https://www.dajoweb.org/?ref=DJ-42",
        ])?;
        assert!(matches!(
            action.command,
            Command::Referral(referral::Command::Capture(referral::Source::Url(ref url)))
                if url.ends_with("ref=DJ-42")
        ));
        Ok(())
    }

    #[test]
    fn test_admin_users_query() -> Result<()> {
        let action = action(&[
            "dojaweb", "admin", "users", "--search", "ana", "--limit", "20",
        ])?;
        match action.command {
            Command::Admin(admin::Command::Users(query)) => {
                assert_eq!(query.search.as_deref(), Some("ana"));
                assert_eq!(query.limit, Some(20));
                assert_eq!(query.offset, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_withdraw_form() -> Result<()> {
        let action = action(&[
            "dojaweb",
            "wallet",
            "withdraw",
            "--amount",
            "12.5",
            "--address",
            "0xabc",
            "--network",
            "TRC20-USDT",
            "--pin",
            "9876",
            "--confirm",
        ])?;
        match action.command {
            Command::Wallet(wallet::Command::Withdraw(args)) => {
                assert_eq!(args.form.amount, "12.5");
                assert_eq!(args.form.network, "TRC20-USDT");
                assert_eq!(args.form.pin.expose_secret(), "9876");
                assert!(args.confirm);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_catalog_defaults() -> Result<()> {
        let action = action(&["dojaweb", "videos", "catalog"])?;
        assert!(matches!(
            action.command,
            Command::Videos(videos::Command::Catalog {
                page: 1,
                per_page: DEFAULT_PER_PAGE
            })
        ));
        Ok(())
    }

    #[test]
    fn test_vip_buy_plan_id() -> Result<()> {
        let action = action(&["dojaweb", "--mode", "development", "vip", "buy", "3"])?;
        assert!(matches!(action.command, Command::Vip(vip::Command::Buy(3))));
        assert!(action.globals.mode.is_some());
        Ok(())
    }
}
