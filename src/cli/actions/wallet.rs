use crate::{
    app::App,
    cli::actions::{
        access::require_session,
        output::{print_field, print_json},
    },
    features::wallet::{
        client::{
            create_deposit_address, create_withdrawal, fetch_account_info, fetch_balance,
            fetch_history, fetch_movements, reset_withdraw_pin, set_withdraw_pin,
            validate_withdrawal,
        },
        types::{validate_withdraw, WithdrawForm},
    },
};
use anyhow::Result;
use secrecy::SecretString;
use tracing::warn;

#[derive(Debug)]
pub struct WithdrawArgs {
    pub form: WithdrawForm,
    pub confirm: bool,
}

#[derive(Debug)]
pub enum Command {
    Balance,
    Account,
    History,
    Movements,
    Deposit,
    Withdraw(WithdrawArgs),
    SetPin(SecretString),
    ResetPin {
        password: SecretString,
        pin: SecretString,
    },
}

/// # Errors
/// Returns an error without a session, for an invalid form or when the
/// business API fails.
pub async fn execute(app: &App, command: Command) -> Result<()> {
    require_session(app)?;
    let api = app.api();

    match command {
        Command::Balance => print_json(&fetch_balance(api).await?),
        Command::Account => {
            let info = fetch_account_info(api).await?;
            print_field("balance", format!("{:.2} USDT", info.saldo_interno));
            print_field("total earned", format!("{:.2} USDT", info.total_ganado));
            Ok(())
        }
        Command::History => print_json(&fetch_history(api).await?),
        Command::Movements => print_json(&fetch_movements(api).await?),
        Command::Deposit => {
            let address = create_deposit_address(api, None).await?;
            print_field("address", &address.payment_address);
            print_field("network", &address.network);
            Ok(())
        }
        Command::Withdraw(args) => withdraw(app, args).await,
        Command::SetPin(pin) => {
            set_withdraw_pin(api, &pin).await?;
            app.notices().success("Withdrawal PIN saved");
            println!("Withdrawal PIN saved");
            Ok(())
        }
        Command::ResetPin { password, pin } => {
            reset_withdraw_pin(api, &password, &pin).await?;
            app.notices().success("Withdrawal PIN updated");
            println!("Withdrawal PIN updated");
            Ok(())
        }
    }
}

/// Validates locally, asks the backend for a quote and only with `confirm`
/// turns the approved quote into a withdrawal.
async fn withdraw(app: &App, args: WithdrawArgs) -> Result<()> {
    let api = app.api();
    let available = match fetch_account_info(api).await {
        Ok(info) => Some(info.saldo_interno),
        Err(err) => {
            warn!(error = %err, "balance unavailable, skipping local balance check");
            None
        }
    };

    let request = validate_withdraw(&args.form, available)?;
    let validated = validate_withdrawal(api, request).await?;

    let quote = &validated.quote;
    for (label, value) in [("amount", quote.monto), ("fee", quote.fee), ("total", quote.total)] {
        if let Some(value) = value {
            print_field(label, format!("{value:.2} USDT"));
        }
    }

    if available.is_some_and(|available| validated.exceeds(available)) {
        println!("Total exceeds the available balance");
        return Ok(());
    }
    if !args.confirm {
        println!("Run again with --confirm to create the withdrawal");
        return Ok(());
    }

    let created = create_withdrawal(api, validated).await?;
    app.notices().success("Withdrawal requested");
    print_json(&created)
}
