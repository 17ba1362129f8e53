//! Types for /api/me responses.

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct MeResponse {
    #[serde(default)]
    pub usuario: Option<Usuario>,
    #[serde(default)]
    pub cuenta: Option<Map<String, Value>>,
}

/// Profile row of the signed-in user. Only the fields the client acts on are
/// named; the rest is kept for display.
#[derive(Clone, Debug, Deserialize)]
pub struct Usuario {
    #[serde(default)]
    pub is_admin: Option<Value>,
    #[serde(default, alias = "saldoInterno")]
    pub saldo_interno: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Usuario {
    /// Strict: only a JSON `true` grants admin.
    pub fn is_admin(&self) -> bool {
        matches!(self.is_admin, Some(Value::Bool(true)))
    }
}
