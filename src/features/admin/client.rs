//! Client helpers for `/api/admin`. A 404 from any of these is an error.

use crate::{
    features::admin::types::UserListQuery,
    shared::{api::ApiClient, errors::AppError},
};
use serde_json::Value;
use tracing::instrument;
use url::Url;

const USERS_PATH: &str = "/api/admin/users";

pub async fn fetch_summary(api: &ApiClient) -> Result<Value, AppError> {
    api.get_json("/api/admin/summary").await
}

pub async fn fetch_users(api: &ApiClient, query: &UserListQuery) -> Result<Value, AppError> {
    let query = query.to_query();
    let path = if query.is_empty() {
        USERS_PATH.to_string()
    } else {
        format!("{USERS_PATH}?{query}")
    };
    api.get_json(&path).await
}

/// # Errors
/// Returns a validation error for an empty user id, before any request.
#[instrument(skip(api))]
pub async fn fetch_user_detail(api: &ApiClient, user_id: &str) -> Result<Value, AppError> {
    let path = user_path(user_id, None)?;
    api.get_json(&path).await
}

/// # Errors
/// Returns a validation error for an empty user id, before any request.
#[instrument(skip(api))]
pub async fn fetch_user_referrals(api: &ApiClient, user_id: &str) -> Result<Value, AppError> {
    let path = user_path(user_id, Some("referrals"))?;
    api.get_json(&path).await
}

/// `/api/admin/users/<id>[/<tail>]` with `id` percent-encoded as one segment.
fn user_path(user_id: &str, tail: Option<&str>) -> Result<String, AppError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::validation("Missing user id"));
    }

    let mut url = Url::parse(&format!("http://localhost{USERS_PATH}"))
        .map_err(|err| AppError::config(format!("Invalid admin path: {err}")))?;
    url.path_segments_mut()
        .map_err(|()| AppError::config("Invalid admin path"))?
        .push(user_id)
        .extend(tail);
    Ok(url.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{
        errors::ErrorKind,
        testing::{can_bind_localhost, TestClient},
    };
    use serde_json::json;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    #[test]
    fn user_path_encodes_the_id() {
        assert_eq!(user_path("u1", None).unwrap(), "/api/admin/users/u1");
        assert_eq!(
            user_path("a/b c", Some("referrals")).unwrap(),
            "/api/admin/users/a%2Fb%20c/referrals"
        );
        let err = user_path("  ", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn users_list_sends_filters() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/admin/users"))
            .and(query_param("search", "ana"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": [], "total": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let client = TestClient::signed_in(&server.uri(), "admin-1");
        let users = fetch_users(
            &client.api,
            &UserListQuery {
                search: Some("ana".to_string()),
                limit: Some(10),
                offset: None,
            },
        )
        .await?;
        assert_eq!(users["total"], 0);
        Ok(())
    }

    #[tokio::test]
    async fn empty_user_id_never_hits_the_network() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let client = TestClient::signed_in(&server.uri(), "admin-1");
        let err = fetch_user_referrals(&client.api, "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        Ok(())
    }

    #[tokio::test]
    async fn not_found_is_an_error_for_admin_reads() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/admin/users/u9"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "User not found"})))
            .mount(&server)
            .await;

        let client = TestClient::signed_in(&server.uri(), "admin-1");
        let err = fetch_user_detail(&client.api, "u9").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.message(), "User not found");
        Ok(())
    }
}
