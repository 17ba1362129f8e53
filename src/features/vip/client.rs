//! Client helpers for VIP endpoints. Each read states what a 404 means:
//! `current` and `mi-plan` answer 404 when the user has no plan,
//! `mis-planes` and `activate` are missing on older servers.

use crate::{
    features::vip::types::{
        MyPlan, MyPlans, Plan, PlanId, PlanList, PlanRequest, VipCurrent, VipState,
    },
    shared::{api::ApiClient, errors::AppError},
};
use serde_json::Value;
use tracing::{debug, instrument};

/// Turns an API 404 into `None`. HTML 404s and every other error are kept.
fn absent_on_not_found<T>(result: Result<T, AppError>) -> Result<Option<T>, AppError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_missing_record() => Ok(None),
        Err(err) => Err(err),
    }
}

pub async fn fetch_plans(api: &ApiClient) -> Result<Vec<Plan>, AppError> {
    let plans: PlanList = api.get_json("/api/vip/plans").await?;
    Ok(plans.into_plans())
}

/// The active subscription, or `None` when the server answers 404.
pub async fn fetch_current(api: &ApiClient) -> Result<Option<VipCurrent>, AppError> {
    absent_on_not_found(api.get_json("/api/vip/current").await)
}

/// The user's plan, or `None` when the server answers 404.
pub async fn fetch_my_plan(api: &ApiClient) -> Result<Option<MyPlan>, AppError> {
    absent_on_not_found(api.get_json("/api/suscripcion/mi-plan").await)
}

/// All of the user's subscriptions. Servers without `mis-planes` get the
/// single-plan answer folded into the same shape.
pub async fn fetch_my_plans(api: &ApiClient) -> Result<MyPlans, AppError> {
    match api.get_json("/api/suscripcion/mis-planes").await {
        Err(err) if err.is_missing_record() => {
            debug!("mis-planes unavailable, using mi-plan");
            let plan = fetch_my_plan(api).await?;
            Ok(plan.map(MyPlans::from).unwrap_or_else(|| MyPlans {
                ok: true,
                planes: Vec::new(),
            }))
        }
        other => other,
    }
}

/// Records interest in a plan the user cannot afford yet.
#[instrument(skip(api))]
pub async fn create_intent(api: &ApiClient, plan_id: PlanId) -> Result<Value, AppError> {
    api.require_user()?;
    post_plan(api, "/api/vip/intent", plan_id).await
}

/// Buys a plan with the internal balance.
#[instrument(skip(api))]
pub async fn buy(api: &ApiClient, plan_id: PlanId) -> Result<Value, AppError> {
    api.require_user()?;
    post_plan(api, "/api/vip/buy", plan_id).await
}

/// Activates a plan; servers without `activate` (404) are sent to `buy`.
#[instrument(skip(api))]
pub async fn activate(api: &ApiClient, plan_id: PlanId) -> Result<Value, AppError> {
    api.require_user()?;
    match post_plan(api, "/api/vip/activate", plan_id).await {
        Err(err) if err.is_missing_record() => post_plan(api, "/api/vip/buy", plan_id).await,
        other => other,
    }
}

async fn post_plan(api: &ApiClient, path: &str, plan_id: PlanId) -> Result<Value, AppError> {
    let response: Option<Value> = api.post_json(path, &PlanRequest { plan_id }).await?;
    Ok(response.unwrap_or(Value::Null))
}

/// Loads the VIP screen state. Signed-out users have no plan; errors other
/// than the API's 404 "no plan" answer surface as [`VipState::Failed`].
pub async fn load_vip_state(api: &ApiClient) -> VipState {
    if api.session().user().is_none() {
        return VipState::NoActivePlan;
    }
    match fetch_current(api).await {
        Ok(Some(current)) if current.is_active => VipState::Active(current),
        Ok(_) => VipState::NoActivePlan,
        Err(err) => VipState::Failed(err.message().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::testing::{can_bind_localhost, TestClient};
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    async fn server_with_current(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/vip/current"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn current_not_found_means_no_plan() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = server_with_current(
            ResponseTemplate::new(404).set_body_json(json!({"error": "Sin suscripción activa"})),
        )
        .await;

        let client = TestClient::signed_in(&server.uri(), "u1");
        assert_eq!(load_vip_state(&client.api).await, VipState::NoActivePlan);
        assert_eq!(fetch_current(&client.api).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn html_not_found_is_not_an_empty_plan() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = server_with_current(
            ResponseTemplate::new(404)
                .set_body_string("<!DOCTYPE html><html><body>Not Found</body></html>"),
        )
        .await;

        let client = TestClient::signed_in(&server.uri(), "u1");
        assert_eq!(
            load_vip_state(&client.api).await,
            VipState::Failed("Endpoint not found (404)".to_string())
        );
        let err = fetch_current(&client.api).await.unwrap_err();
        assert!(err.is_html_response());
        Ok(())
    }

    #[tokio::test]
    async fn activate_html_not_found_does_not_buy() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/vip/activate"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/vip/buy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(0)
            .mount(&server)
            .await;

        let client = TestClient::signed_in(&server.uri(), "u1");
        let err = activate(&client.api, 3).await.unwrap_err();
        assert_eq!(err.kind(), crate::shared::errors::ErrorKind::Transport);
        Ok(())
    }

    #[tokio::test]
    async fn current_server_error_is_reported() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = server_with_current(
            ResponseTemplate::new(500).set_body_json(json!({"error": "db unavailable"})),
        )
        .await;

        let client = TestClient::signed_in(&server.uri(), "u1");
        assert_eq!(
            load_vip_state(&client.api).await,
            VipState::Failed("db unavailable".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn active_and_inactive_plans() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = server_with_current(ResponseTemplate::new(200).set_body_json(json!({
            "is_active": true, "expires_at": "2026-12-01T00:00:00Z", "plan": {"id": 2}
        })))
        .await;
        let client = TestClient::signed_in(&server.uri(), "u1");
        match load_vip_state(&client.api).await {
            VipState::Active(current) => {
                assert_eq!(current.expires_at.as_deref(), Some("2026-12-01T00:00:00Z"));
            }
            other => panic!("unexpected state: {other:?}"),
        }

        let server = server_with_current(
            ResponseTemplate::new(200).set_body_json(json!({"is_active": false})),
        )
        .await;
        let client = TestClient::signed_in(&server.uri(), "u1");
        assert_eq!(load_vip_state(&client.api).await, VipState::NoActivePlan);
        Ok(())
    }

    #[tokio::test]
    async fn signed_out_users_have_no_plan() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let client = TestClient::new(&server.uri(), &server.uri());
        assert_eq!(load_vip_state(&client.api).await, VipState::NoActivePlan);
        Ok(())
    }

    #[tokio::test]
    async fn activate_falls_back_to_buy() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/vip/activate"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/vip/buy"))
            .and(body_json(json!({"plan_id": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "newBalance": 5})))
            .expect(1)
            .mount(&server)
            .await;

        let client = TestClient::signed_in(&server.uri(), "u1");
        let response = activate(&client.api, 3).await?;
        assert_eq!(response["newBalance"], 5);
        Ok(())
    }

    #[tokio::test]
    async fn my_plans_falls_back_to_my_plan() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/suscripcion/mis-planes"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/suscripcion/mi-plan"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "plan_activo": true, "plan_id": 2, "nombre": "Oro", "ganancia_diaria": "1.25"
            })))
            .mount(&server)
            .await;

        let client = TestClient::signed_in(&server.uri(), "u1");
        let plans = fetch_my_plans(&client.api).await?;
        assert!(plans.ok);
        assert_eq!(plans.planes.len(), 1);
        assert_eq!(plans.planes[0].ganancia_diaria, Some(1.25));
        Ok(())
    }
}
