//! Client helpers for referral endpoints, plus the invite code and link
//! derivation used on the invite screen.

use crate::{
    features::{
        auth::types::User,
        referrals::types::{LinkRequest, LinkResponse, ReferralOverview},
    },
    shared::{api::ApiClient, errors::AppError},
};
use serde_json::Value;
use std::future::Future;
use url::Url;

/// Metadata keys that may hold the user's own invite code, in priority order.
const INVITE_CODE_KEYS: [&str; 5] = [
    "invite_code",
    "ref_code",
    "referral_code",
    "codigo_invitacion",
    "invitation_code",
];

const FALLBACK_CODE_MODULUS: u64 = 1_000_000;

/// Seam used by the referral linker, so linking can be exercised without HTTP.
pub trait ReferralApi: Send + Sync {
    fn link_referral(
        &self,
        invite_code: &str,
    ) -> impl Future<Output = Result<LinkResponse, AppError>> + Send;
}

impl ReferralApi for ApiClient {
    async fn link_referral(&self, invite_code: &str) -> Result<LinkResponse, AppError> {
        link_referral(self, invite_code).await
    }
}

/// Attribute the signed-in user to the owner of `invite_code`.
pub async fn link_referral(api: &ApiClient, invite_code: &str) -> Result<LinkResponse, AppError> {
    let response: Option<LinkResponse> = api
        .post_json("/api/referrals/link", &LinkRequest { invite_code })
        .await?;
    Ok(response.unwrap_or_default())
}

pub async fn fetch_my_referrals(api: &ApiClient) -> Result<Value, AppError> {
    api.get_json("/api/referrals/me/referrals").await
}

pub async fn fetch_my_commissions(api: &ApiClient) -> Result<Value, AppError> {
    api.get_json("/api/referrals/me/commissions").await
}

pub async fn fetch_referral_profile(api: &ApiClient) -> Result<Value, AppError> {
    api.get_json("/api/referrals/me/profile").await
}

pub async fn fetch_referral_stats(api: &ApiClient) -> Result<Value, AppError> {
    api.get_json("/api/referrals/me/stats").await
}

/// Members of the user's network. `level` filters by depth when positive.
pub async fn fetch_referral_members(api: &ApiClient, level: Option<u32>) -> Result<Value, AppError> {
    let path = match level.filter(|level| *level > 0) {
        Some(level) => format!("/api/referrals/me/members?level={level}"),
        None => "/api/referrals/me/members".to_string(),
    };
    api.get_json(&path).await
}

/// Invite screen data for the signed-in user. Stats and profile are fetched
/// concurrently; either failing fails the overview.
///
/// # Errors
/// Returns an auth error without a session, otherwise the first API error.
pub async fn referral_overview(api: &ApiClient) -> Result<ReferralOverview, AppError> {
    let user = api.require_user()?;
    let (stats, profile) = tokio::try_join!(fetch_referral_stats(api), fetch_referral_profile(api))?;
    let invite_code = invite_code(&user);
    let invite_link = invite_link(&api.config().app_origin, &invite_code);
    Ok(ReferralOverview {
        invite_code,
        invite_link,
        stats,
        profile,
    })
}

/// The user's own invite code: the first non-empty metadata code, otherwise a
/// stable six-digit code derived from the user id (or contact).
pub fn invite_code(user: &User) -> String {
    let stored = INVITE_CODE_KEYS.iter().find_map(|key| {
        user.metadata
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|code| !code.is_empty())
    });
    if let Some(code) = stored {
        return code.to_string();
    }

    let seed = if user.id.is_empty() {
        user.contact.value()
    } else {
        user.id.as_str()
    };
    derive_code(seed)
}

/// Six-digit rolling hash over the UTF-16 code units of `seed`.
pub(crate) fn derive_code(seed: &str) -> String {
    if seed.is_empty() {
        return String::new();
    }
    let hash = seed.encode_utf16().fold(0_u64, |hash, unit| {
        (hash * 31 + u64::from(unit)) % FALLBACK_CODE_MODULUS
    });
    format!("{hash:06}")
}

/// Shareable landing link carrying `code` in the `ref` query parameter.
pub fn invite_link(origin: &str, code: &str) -> Option<String> {
    let origin = origin.trim().trim_end_matches('/');
    if origin.is_empty() || code.is_empty() {
        return None;
    }
    let mut url = Url::parse(&format!("{origin}/")).ok()?;
    url.query_pairs_mut().append_pair("ref", code);
    Some(url.to_string())
}

/// The trimmed `ref` query parameter of `link`, if any.
pub fn ref_from_url(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "ref")
        .map(|(_, value)| value.trim().to_string())
        .filter(|code| !code.is_empty())
}
