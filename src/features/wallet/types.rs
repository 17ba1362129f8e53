//! Wallet forms and response shapes. PINs and passwords stay in
//! `SecretString` until the request body is built.

use crate::shared::{api::lenient_number, errors::AppError};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Smallest withdrawal the backend accepts, in USDT.
pub const MIN_WITHDRAWAL: f64 = 10.0;

pub const DEFAULT_NETWORK: &str = "BEP20-USDT";

pub const MIN_PIN_DIGITS: usize = 4;

/// Withdrawal form as entered. `amount` is kept as text so parse failures are
/// reported like any other validation error.
#[derive(Clone, Debug)]
pub struct WithdrawForm {
    pub amount: String,
    pub network: String,
    pub address: String,
    pub pin: SecretString,
}

impl WithdrawForm {
    pub fn new(amount: &str, address: &str, pin: SecretString) -> Self {
        Self {
            amount: amount.to_string(),
            network: DEFAULT_NETWORK.to_string(),
            address: address.to_string(),
            pin,
        }
    }
}

/// A withdrawal that passed local validation.
#[derive(Clone, Debug)]
pub struct WithdrawRequest {
    pub amount: f64,
    pub network: String,
    pub address: String,
    pub pin: SecretString,
}

/// Checks the form locally. `available` is the known balance, if any.
///
/// # Errors
/// Returns a validation error naming the first failing field.
pub fn validate_withdraw(
    form: &WithdrawForm,
    available: Option<f64>,
) -> Result<WithdrawRequest, AppError> {
    let amount = form
        .amount
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount > 0.0)
        .ok_or_else(|| AppError::validation("Invalid amount"))?;
    if amount < MIN_WITHDRAWAL {
        return Err(AppError::validation(format!(
            "Minimum withdrawal is {MIN_WITHDRAWAL} USDT"
        )));
    }

    let network = form.network.trim();
    if network.is_empty() {
        return Err(AppError::validation("Select a network"));
    }
    let address = form.address.trim();
    if address.is_empty() {
        return Err(AppError::validation("Enter a destination address"));
    }
    if form.pin.expose_secret().trim().is_empty() {
        return Err(AppError::validation("Enter your PIN"));
    }
    if available.is_some_and(|available| amount > available) {
        return Err(AppError::validation("Insufficient balance"));
    }

    Ok(WithdrawRequest {
        amount,
        network: network.to_string(),
        address: address.to_string(),
        pin: form.pin.clone(),
    })
}

/// Withdrawal PINs are digits only, at least [`MIN_PIN_DIGITS`] long.
pub fn valid_pin(pin: &str) -> bool {
    Regex::new(r"^[0-9]{4,}$").is_ok_and(|re| re.is_match(pin))
}

/// # Errors
/// Returns a validation error for a malformed PIN.
pub fn validate_pin(pin: &SecretString) -> Result<(), AppError> {
    if valid_pin(pin.expose_secret()) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "PIN must be at least {MIN_PIN_DIGITS} digits"
        )))
    }
}

/// Response of `/api/withdraw/validate`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct WithdrawQuote {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub monto: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub fee: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Proof that the backend approved this exact request. Only obtainable from
/// a validation call that answered `ok: true`; creating a withdrawal
/// consumes it.
#[derive(Debug)]
pub struct ValidatedWithdrawal {
    pub(crate) request: WithdrawRequest,
    pub quote: WithdrawQuote,
}

impl ValidatedWithdrawal {
    pub fn request(&self) -> &WithdrawRequest {
        &self.request
    }

    /// True when the quoted total exceeds `available`.
    pub fn exceeds(&self, available: f64) -> bool {
        self.quote.total.is_some_and(|total| total > available)
    }
}

/// Deposit address with the alias fields resolved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DepositAddress {
    pub payment_address: String,
    pub network: String,
}

impl DepositAddress {
    pub fn from_response(value: &Value) -> Self {
        Self {
            payment_address: first_text(
                value,
                &[
                    "/address",
                    "/payment_address",
                    "/direccion",
                    "/data/address",
                    "/data/payment_address",
                ],
            ),
            network: first_text(value, &["/network", "/red", "/data/network", "/data/red"]),
        }
    }
}

fn first_text(value: &Value, pointers: &[&str]) -> String {
    pointers
        .iter()
        .filter_map(|pointer| value.pointer(pointer).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Account summary assembled from `/api/cuenta/info` and `/api/me`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccountInfo {
    pub saldo_interno: f64,
    pub total_ganado: f64,
    /// The `cuenta` response as returned, when that call succeeded.
    pub cuenta: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(amount: &str) -> WithdrawForm {
        WithdrawForm::new(amount, " 0xabc ", SecretString::from("1234".to_string()))
    }

    #[test]
    fn withdraw_amount_rules() {
        for bad in ["", "abc", "0", "-5", "NaN", "inf"] {
            let err = validate_withdraw(&form(bad), None).unwrap_err();
            assert_eq!(err.message(), "Invalid amount", "amount {bad:?}");
        }
        let err = validate_withdraw(&form("9.99"), None).unwrap_err();
        assert_eq!(err.message(), "Minimum withdrawal is 10 USDT");

        let request = validate_withdraw(&form("10"), None).unwrap();
        assert_eq!(request.amount, 10.0);
        assert_eq!(request.network, DEFAULT_NETWORK);
        assert_eq!(request.address, "0xabc");
    }

    #[test]
    fn withdraw_required_fields_and_balance() {
        let mut missing = form("20");
        missing.address = "  ".to_string();
        assert!(validate_withdraw(&missing, None).is_err());

        let mut missing = form("20");
        missing.network = String::new();
        assert!(validate_withdraw(&missing, None).is_err());

        let mut missing = form("20");
        missing.pin = SecretString::from(" ".to_string());
        assert_eq!(
            validate_withdraw(&missing, None).unwrap_err().message(),
            "Enter your PIN"
        );

        assert_eq!(
            validate_withdraw(&form("20"), Some(19.5)).unwrap_err().message(),
            "Insufficient balance"
        );
        assert!(validate_withdraw(&form("20"), Some(20.0)).is_ok());
    }

    #[test]
    fn pin_rules() {
        assert!(valid_pin("1234"));
        assert!(valid_pin("123456"));
        assert!(!valid_pin("123"));
        assert!(!valid_pin("12a4"));
        assert!(!valid_pin(" 1234"));
    }

    #[test]
    fn deposit_address_aliases() {
        let address = DepositAddress::from_response(&json!({
            "address": "",
            "data": {"payment_address": " 0xdef ", "red": "BEP20"}
        }));
        assert_eq!(address.payment_address, "0xdef");
        assert_eq!(address.network, "BEP20");

        let address = DepositAddress::from_response(&json!({"direccion": "T123", "network": "TRC20"}));
        assert_eq!(address.payment_address, "T123");
        assert_eq!(address.network, "TRC20");

        assert_eq!(DepositAddress::from_response(&json!(null)), DepositAddress::default());
    }
}
