//! Client helpers for wallet endpoints. Withdrawal and PIN calls require a
//! session and fail before any request without one.

use crate::{
    features::{
        me::types::MeResponse,
        wallet::types::{
            validate_pin, AccountInfo, DepositAddress, ValidatedWithdrawal, WithdrawQuote,
            WithdrawRequest,
        },
    },
    shared::{
        api::{json_number as number, ApiClient},
        errors::{swallowed, AppError, ErrorKind},
    },
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument};

pub async fn fetch_balance(api: &ApiClient) -> Result<Value, AppError> {
    api.get_json("/api/user/balance").await
}

pub async fn fetch_history(api: &ApiClient) -> Result<Value, AppError> {
    api.get_json("/api/wallet/history").await
}

/// Balance movements; servers without the endpoint answer 404 and the wallet
/// history is used instead.
pub async fn fetch_movements(api: &ApiClient) -> Result<Value, AppError> {
    match api.get_json("/api/balance/movements").await {
        Err(err) if err.is_missing_record() => {
            debug!("balance movements unavailable, using wallet history");
            fetch_history(api).await
        }
        other => other,
    }
}

/// Requests a deposit address. `body` carries optional hints such as the
/// amount or network.
pub async fn create_deposit_address(
    api: &ApiClient,
    body: Option<Value>,
) -> Result<DepositAddress, AppError> {
    let response: Value = match body {
        Some(body) => api.post_json("/api/deposit/address", &body).await?,
        None => api.post_empty("/api/deposit/address").await?,
    };
    Ok(DepositAddress::from_response(&response))
}

/// Combines `/api/cuenta/info` with `/api/me`. Each call may fail on its own;
/// the balance prefers the profile's `saldo_interno`.
///
/// # Errors
/// Fails only when both calls fail, returning the account error.
#[instrument(skip_all)]
pub async fn fetch_account_info(api: &ApiClient) -> Result<AccountInfo, AppError> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let cuenta_path = format!("/api/cuenta/info?ts={millis}");

    let (cuenta, me) = tokio::join!(
        api.get_json::<Value>(&cuenta_path),
        api.get_json::<MeResponse>("/api/me")
    );

    let (cuenta, me) = match (cuenta, me) {
        (Err(err), Err(me_err)) => {
            swallowed("profile lookup for account info", &me_err);
            return Err(err);
        }
        (cuenta, me) => (
            cuenta
                .map_err(|err| swallowed("account info", &err))
                .ok()
                .and_then(|value| match value {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .unwrap_or_default(),
            me.map_err(|err| swallowed("profile lookup for account info", &err))
                .ok(),
        ),
    };

    Ok(assemble_account_info(cuenta, me.as_ref()))
}

fn assemble_account_info(cuenta: Map<String, Value>, me: Option<&MeResponse>) -> AccountInfo {
    let from_profile = me
        .and_then(|me| me.usuario.as_ref())
        .and_then(|usuario| number(usuario.saldo_interno.as_ref()));
    let from_cuenta = ["balance", "saldo_interno", "saldoInterno"]
        .iter()
        .find_map(|key| number(cuenta.get(*key)));

    let me_cuenta = me.and_then(|me| me.cuenta.as_ref());
    let total_ganado = ["total_ganado", "totalGanado"]
        .iter()
        .find_map(|key| number(cuenta.get(*key)))
        .or_else(|| {
            ["total_ganado", "totalGanado"]
                .iter()
                .find_map(|key| number(me_cuenta.and_then(|cuenta| cuenta.get(*key))))
        });

    AccountInfo {
        saldo_interno: from_profile.or(from_cuenta).unwrap_or_default(),
        total_ganado: total_ganado.unwrap_or_default(),
        cuenta,
    }
}

/// Asks the backend to quote a withdrawal. Only an `ok: true` answer yields
/// a [`ValidatedWithdrawal`].
///
/// # Errors
/// Returns an auth error without a session, or a business error when the
/// backend does not approve the request.
#[instrument(skip_all, fields(amount = request.amount, network = %request.network))]
pub async fn validate_withdrawal(
    api: &ApiClient,
    request: WithdrawRequest,
) -> Result<ValidatedWithdrawal, AppError> {
    api.require_user()?;
    let body = json!({
        "monto": request.amount,
        "red": request.network,
        "pin": request.pin.expose_secret(),
    });
    let quote: Option<WithdrawQuote> = api.post_json("/api/withdraw/validate", &body).await?;
    let quote = quote.unwrap_or_default();

    if quote.ok != Some(true) {
        let message = quote
            .message
            .clone()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| "Withdrawal was not approved".to_string());
        return Err(AppError::new(ErrorKind::Business, message));
    }

    Ok(ValidatedWithdrawal { request, quote })
}

/// # Errors
/// Returns an auth error without a session or the backend's error.
#[instrument(skip_all, fields(amount = validated.request.amount))]
pub async fn create_withdrawal(
    api: &ApiClient,
    validated: ValidatedWithdrawal,
) -> Result<Value, AppError> {
    api.require_user()?;
    let request = validated.request;
    let body = json!({
        "monto": request.amount,
        "red": request.network,
        "direccion": request.address,
        "pin": request.pin.expose_secret(),
    });
    let created: Option<Value> = api.post_json("/api/withdraw/create", &body).await?;
    Ok(created.unwrap_or(Value::Null))
}

/// # Errors
/// Returns a validation error for a malformed PIN or an auth error without
/// a session.
#[instrument(skip_all)]
pub async fn set_withdraw_pin(api: &ApiClient, pin: &SecretString) -> Result<Value, AppError> {
    validate_pin(pin)?;
    api.require_user()?;
    let body = json!({ "pin": pin.expose_secret() });
    let response: Option<Value> = api.post_json("/api/set-withdraw-pin", &body).await?;
    Ok(response.unwrap_or(Value::Null))
}

/// Replaces the withdrawal PIN after re-checking the account password.
///
/// # Errors
/// Returns a validation error for an empty password or malformed PIN, or an
/// auth error without a session.
#[instrument(skip_all)]
pub async fn reset_withdraw_pin(
    api: &ApiClient,
    password: &SecretString,
    pin: &SecretString,
) -> Result<Value, AppError> {
    if password.expose_secret().is_empty() {
        return Err(AppError::validation("Enter your password"));
    }
    validate_pin(pin)?;
    api.require_user()?;
    let body = json!({
        "password": password.expose_secret(),
        "pin": pin.expose_secret(),
    });
    let response: Option<Value> = api.post_json("/api/withdraw/pin/reset", &body).await?;
    Ok(response.unwrap_or(Value::Null))
}
