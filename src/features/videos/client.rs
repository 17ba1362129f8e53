//! Client helpers for the daily video task and the trailer catalog.

use crate::{
    features::videos::types::{CatalogPage, RawCatalogPage, VideoStatus, ViewRequest, RATING_RANGE},
    shared::{api::ApiClient, errors::AppError},
};
use serde_json::Value;
use tracing::{debug, instrument};

pub async fn fetch_status(api: &ApiClient) -> Result<VideoStatus, AppError> {
    api.get_json("/api/videos/status").await
}

/// Records today's view of `video_id`, with the user's rating if given.
///
/// # Errors
/// Returns a validation error for an empty id or a rating outside one to
/// five stars, and an auth error without a session.
#[instrument(skip_all, fields(video_id = %request.video_id))]
pub async fn record_view(api: &ApiClient, request: &ViewRequest) -> Result<Value, AppError> {
    if request.video_id.trim().is_empty() {
        return Err(AppError::validation("Missing video id"));
    }
    if request
        .calificacion
        .is_some_and(|rating| !RATING_RANGE.contains(&rating))
    {
        return Err(AppError::validation("Rating must be between 1 and 5"));
    }
    api.require_user()?;

    let response: Option<Value> = api.post_json("/api/videos/ver", request).await?;
    Ok(response.unwrap_or(Value::Null))
}

/// One page of trailers. The search endpoint is tried first; an upstream 500
/// switches to the popular listing for the same page.
#[instrument(skip(api))]
pub async fn fetch_catalog(api: &ApiClient, page: u32, per_page: u32) -> Result<CatalogPage, AppError> {
    let page = page.max(1);
    let per_page = per_page.max(1);

    let search = format!("/api/pexels/videos/search?query=movie&per_page={per_page}&page={page}");
    let raw: RawCatalogPage = match api.get_json(&search).await {
        Err(err) if err.status() == Some(500) => {
            debug!("catalog search failed upstream, using popular videos");
            let popular = format!("/api/pexels/videos/popular?per_page={per_page}&page={page}");
            api.get_json(&popular).await?
        }
        other => other?,
    };
    Ok(CatalogPage::from(raw))
}
