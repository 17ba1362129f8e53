use clap::{Arg, ArgGroup, Command};

pub const ARG_CODE: &str = "code";
pub const ARG_URL: &str = "url";
pub const ARG_LEVEL: &str = "level";

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command.subcommand(
        Command::new("referral")
            .about("Invite codes and referral network")
            .subcommand_required(true)
            .subcommand(
                Command::new("capture")
                    .about("Keep an invitation code until a session exists, then link it")
                    .arg(Arg::new(ARG_CODE).help("Invitation code"))
                    .arg(
                        Arg::new(ARG_URL)
                            .long("url")
                            .help("Invite link carrying the code in its `ref` parameter"),
                    )
                    .group(
                        ArgGroup::new("source")
                            .args([ARG_CODE, ARG_URL])
                            .required(true),
                    ),
            )
            .subcommand(Command::new("link").about("Submit the pending invitation code"))
            .subcommand(Command::new("stats").about("Show your invite code, link and stats"))
            .subcommand(
                Command::new("members")
                    .about("List your referral network")
                    .arg(
                        Arg::new(ARG_LEVEL)
                            .long("level")
                            .help("Only members at this depth")
                            .value_parser(clap::value_parser!(u32)),
                    ),
            )
            .subcommand(Command::new("commissions").about("List your commissions")),
    )
}
