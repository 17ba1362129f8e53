use clap::{Arg, ArgAction, Command};

pub const ARG_SEARCH: &str = "search";
pub const ARG_LIMIT: &str = "limit";
pub const ARG_OFFSET: &str = "offset";
pub const ARG_USER_ID: &str = "user-id";
pub const ARG_REFERRALS: &str = "referrals";
pub const ARG_PLAN_ID: &str = "plan-id";
pub const ARG_AMOUNT: &str = "amount";
pub const ARG_ADDRESS: &str = "address";
pub const ARG_NETWORK: &str = "network";
pub const ARG_PIN: &str = "pin";
pub const ARG_ACCOUNT_PASSWORD: &str = "account-password";
pub const ARG_CONFIRM: &str = "confirm";
pub const ARG_PAGE: &str = "page";
pub const ARG_PER_PAGE: &str = "per-page";
pub const ARG_VIDEO_ID: &str = "video-id";
pub const ARG_RATING: &str = "rating";

fn plan_id_arg() -> Arg {
    Arg::new(ARG_PLAN_ID)
        .help("Plan id")
        .required(true)
        .value_parser(clap::value_parser!(i64))
}

fn pin_arg() -> Arg {
    Arg::new(ARG_PIN)
        .long("pin")
        .help("Withdrawal PIN")
        .env("DOJA_WITHDRAW_PIN")
        .hide_env_values(true)
        .required(true)
}

fn admin() -> Command {
    Command::new("admin")
        .about("Admin dashboard (admins only)")
        .subcommand_required(true)
        .subcommand(Command::new("summary").about("Platform totals"))
        .subcommand(
            Command::new("users")
                .about("Search users")
                .arg(Arg::new(ARG_SEARCH).long("search").help("Email, phone or name"))
                .arg(
                    Arg::new(ARG_LIMIT)
                        .long("limit")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new(ARG_OFFSET)
                        .long("offset")
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
        .subcommand(
            Command::new("user")
                .about("Show one user")
                .arg(Arg::new(ARG_USER_ID).required(true))
                .arg(
                    Arg::new(ARG_REFERRALS)
                        .long("referrals")
                        .help("Show the user's referrals instead")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn vip() -> Command {
    Command::new("vip")
        .about("VIP plans")
        .subcommand_required(true)
        .subcommand(Command::new("status").about("Current VIP state"))
        .subcommand(Command::new("plans").about("Plan catalog"))
        .subcommand(Command::new("my-plans").about("Your subscriptions"))
        .subcommand(
            Command::new("intent")
                .about("Register interest in a plan")
                .arg(plan_id_arg()),
        )
        .subcommand(Command::new("buy").about("Buy a plan with your balance").arg(plan_id_arg()))
        .subcommand(Command::new("activate").about("Activate a plan").arg(plan_id_arg()))
}

fn wallet() -> Command {
    Command::new("wallet")
        .about("Balance, deposits and withdrawals")
        .subcommand_required(true)
        .subcommand(Command::new("balance").about("Current balance"))
        .subcommand(Command::new("account").about("Balance and total earned"))
        .subcommand(Command::new("history").about("Wallet history"))
        .subcommand(Command::new("movements").about("Balance movements"))
        .subcommand(Command::new("deposit").about("Create a deposit address"))
        .subcommand(
            Command::new("withdraw")
                .about("Validate a withdrawal and, with --confirm, create it")
                .arg(
                    Arg::new(ARG_AMOUNT)
                        .long("amount")
                        .help("Amount in USDT (minimum 10)")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_ADDRESS)
                        .long("address")
                        .help("Destination address")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_NETWORK)
                        .long("network")
                        .default_value(crate::features::wallet::types::DEFAULT_NETWORK),
                )
                .arg(pin_arg())
                .arg(
                    Arg::new(ARG_CONFIRM)
                        .long("confirm")
                        .help("Create the withdrawal after a successful validation")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("set-pin").about("Set the withdrawal PIN").arg(pin_arg()))
        .subcommand(
            Command::new("reset-pin")
                .about("Replace the withdrawal PIN")
                .arg(
                    Arg::new(ARG_ACCOUNT_PASSWORD)
                        .long("password")
                        .help("Account password")
                        .env("DOJA_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(pin_arg().help("New withdrawal PIN")),
        )
}

fn videos() -> Command {
    Command::new("videos")
        .about("Daily video task")
        .subcommand_required(true)
        .subcommand(Command::new("status").about("Today's quota per plan"))
        .subcommand(
            Command::new("catalog")
                .about("Browse trailers")
                .arg(
                    Arg::new(ARG_PAGE)
                        .long("page")
                        .default_value("1")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new(ARG_PER_PAGE)
                        .long("per-page")
                        .default_value("12")
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
        .subcommand(
            Command::new("watch")
                .about("Record today's view of a video")
                .arg(Arg::new(ARG_VIDEO_ID).required(true))
                .arg(
                    Arg::new(ARG_PLAN_ID)
                        .long("plan-id")
                        .value_parser(clap::value_parser!(i64)),
                ),
        )
        .subcommand(
            Command::new("rate")
                .about("Rate a video (1 to 5), sent with its next view")
                .arg(Arg::new(ARG_VIDEO_ID).required(true))
                .arg(
                    Arg::new(ARG_RATING)
                        .required(true)
                        .value_parser(clap::value_parser!(u8).range(1..=5)),
                ),
        )
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(admin())
        .subcommand(vip())
        .subcommand(wallet())
        .subcommand(videos())
}
