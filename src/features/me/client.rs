//! Client helpers for current-user endpoints.

use crate::{
    features::{auth::guards::AdminCheck, me::types::MeResponse},
    shared::{api::ApiClient, errors::AppError},
};

/// Fetch the authenticated user's profile. A 404 is an error here.
pub async fn fetch_me(api: &ApiClient) -> Result<MeResponse, AppError> {
    api.get_json("/api/me").await
}

impl AdminCheck for ApiClient {
    /// A response without a `usuario` object is malformed and fails the check.
    async fn is_admin(&self) -> Result<bool, AppError> {
        let me = fetch_me(self).await?;
        me.usuario
            .map(|usuario| usuario.is_admin())
            .ok_or_else(|| AppError::transport("Malformed profile response: missing usuario"))
    }
}
