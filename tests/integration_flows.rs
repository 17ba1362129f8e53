//! End-to-end client flows against a mocked auth backend and business API.
//!
//! A single `wiremock` server plays both roles: `/auth/v1/*` answers like a
//! GoTrue-compatible auth backend, `/api/*` like the business API. Each test
//! boots a full [`App`] on in-memory storage, exactly as the binary does with
//! its JSON file.

use anyhow::{anyhow, Result};
use dojaweb::{
    app::App,
    features::{
        auth::{
            types::{AuthMethod, Credentials, SignUpForm},
            GateAction, SignUpResult,
        },
        referrals::{MAX_LINK_ATTEMPTS, PENDING_ATTEMPTS_KEY, PENDING_INVITE_KEY},
        vip::{client::load_vip_state, types::VipState},
    },
    shared::{
        config::{AppConfig, BuildMode},
        storage::{MemoryStorage, Storage},
    },
};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::{net::TcpListener, path::PathBuf, sync::Arc};
use wiremock::{
    matchers::{body_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn config(server: &MockServer) -> AppConfig {
    AppConfig {
        api_base_url: server.uri(),
        app_origin: server.uri(),
        auth_url: server.uri(),
        auth_key: SecretString::from("anon-key".to_string()),
        mode: BuildMode::Development,
        storage_path: PathBuf::from("unused.json"),
    }
}

fn session_body(id: &str) -> Value {
    json!({
        "access_token": format!("access-{id}"),
        "refresh_token": format!("refresh-{id}"),
        "token_type": "bearer",
        "expires_in": 3600,
        "user": {"id": id, "email": format!("{id}@dajoweb.org"), "user_metadata": {}}
    })
}

async fn boot(server: &MockServer) -> Result<(App, Arc<MemoryStorage>)> {
    let storage = Arc::new(MemoryStorage::new());
    let app = App::bootstrap_with_storage(config(server), storage.clone())
        .await
        .map_err(|err| anyhow!(err.to_string()))?;
    Ok((app, storage))
}

fn sign_up_form(code: &str) -> SignUpForm {
    SignUpForm {
        method: AuthMethod::Email,
        identifier: "u1@dajoweb.org".to_string(),
        password: SecretString::from("secret1".to_string()),
        confirm_password: SecretString::from("secret1".to_string()),
        invitation_code: code.to_string(),
    }
}

#[tokio::test]
async fn auto_confirmed_sign_up_links_invite_code_once() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("u1")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/referrals/link"))
        .and(header("authorization", "Bearer access-u1"))
        .and(body_json(json!({"invite_code": "DJ-7"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let (app, _storage) = boot(&server).await?;
    let result = app
        .gateway()
        .sign_up(&sign_up_form(" DJ-7 "))
        .await
        .map_err(|err| anyhow!(err.to_string()))?;

    assert!(matches!(result, SignUpResult::Registered { ref referral } if referral.is_linked()));
    assert_eq!(app.session().user().map(|user| user.id), Some("u1".to_string()));
    assert_eq!(app.linker().pending(), None);

    // nothing left to submit
    assert!(!app.link_pending_referral().await.is_linked());
    Ok(())
}

#[tokio::test]
async fn unconfirmed_sign_up_keeps_code_until_sign_in() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "u1", "email": "u1@dajoweb.org"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("u1")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/referrals/link"))
        .and(body_json(json!({"invite_code": "DJ-9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let (app, _storage) = boot(&server).await?;
    let result = app
        .gateway()
        .sign_up(&sign_up_form("DJ-9"))
        .await
        .map_err(|err| anyhow!(err.to_string()))?;
    assert!(matches!(
        result,
        SignUpResult::VerificationRequired {
            method: AuthMethod::Email
        }
    ));
    assert_eq!(app.linker().pending().as_deref(), Some("DJ-9"));

    let signed_in = app
        .gateway()
        .sign_in(&Credentials {
            method: AuthMethod::Email,
            identifier: "u1@dajoweb.org".to_string(),
            password: SecretString::from("secret1".to_string()),
        })
        .await
        .map_err(|err| anyhow!(err.to_string()))?;

    assert!(signed_in.referral.is_linked());
    assert_eq!(app.linker().pending(), None);
    Ok(())
}

#[tokio::test]
async fn failed_link_keeps_code_for_next_session() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("u1")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/referrals/link"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid invite code"})),
        )
        .mount(&server)
        .await;

    let (app, storage) = boot(&server).await?;
    let result = app
        .gateway()
        .sign_up(&sign_up_form("DJ-0"))
        .await
        .map_err(|err| anyhow!(err.to_string()))?;

    // the account exists even though linking failed
    assert!(matches!(result, SignUpResult::Registered { .. }));
    assert_eq!(
        storage.get(PENDING_INVITE_KEY).as_deref(),
        Some("DJ-0")
    );
    Ok(())
}

#[tokio::test]
async fn rejected_code_stops_after_repeated_restarts() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("u1")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/referrals/link"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid invite code"})),
        )
        .expect(u64::from(MAX_LINK_ATTEMPTS))
        .mount(&server)
        .await;

    let (app, storage) = boot(&server).await?;
    app.gateway()
        .sign_up(&sign_up_form("BADCODE"))
        .await
        .map_err(|err| anyhow!(err.to_string()))?;
    drop(app);

    // every command run restores the session and retries until the cap
    for _ in 0..10 {
        let app = App::bootstrap_with_storage(config(&server), storage.clone())
            .await
            .map_err(|err| anyhow!(err.to_string()))?;
        assert!(app.session().session().is_some());
    }

    assert_eq!(storage.get(PENDING_INVITE_KEY), None);
    assert_eq!(storage.get(PENDING_ATTEMPTS_KEY), None);
    Ok(())
}

#[tokio::test]
async fn persisted_session_survives_restart() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("u2")))
        .expect(1)
        .mount(&server)
        .await;

    let (app, storage) = boot(&server).await?;
    app.gateway()
        .sign_in(&Credentials {
            method: AuthMethod::Email,
            identifier: "u2@dajoweb.org".to_string(),
            password: SecretString::from("secret1".to_string()),
        })
        .await
        .map_err(|err| anyhow!(err.to_string()))?;
    drop(app);

    let restarted = App::bootstrap_with_storage(config(&server), storage)
        .await
        .map_err(|err| anyhow!(err.to_string()))?;
    assert!(!restarted.session().is_loading());
    assert_eq!(
        restarted.session().user().map(|user| user.id),
        Some("u2".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn admin_gate_checks_profile_once_and_denies_non_admins() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("u3")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"usuario": {"is_admin": "true", "email": "u3@dajoweb.org"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (app, _storage) = boot(&server).await?;
    let gate = app.admin_gate();
    assert_eq!(
        gate.evaluate(&app.session().snapshot()).await,
        GateAction::Redirect("/")
    );

    app.gateway()
        .sign_in(&Credentials {
            method: AuthMethod::Email,
            identifier: "u3@dajoweb.org".to_string(),
            password: SecretString::from("secret1".to_string()),
        })
        .await
        .map_err(|err| anyhow!(err.to_string()))?;

    // a string "true" is not an admin flag
    let first = gate.evaluate(&app.session().snapshot()).await;
    assert!(matches!(first, GateAction::Deny { .. }));
    let second = gate.evaluate(&app.session().snapshot()).await;
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn missing_vip_plan_is_a_normal_state() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("u4")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/vip/current"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "No plan"})))
        .mount(&server)
        .await;

    let (app, _storage) = boot(&server).await?;
    app.gateway()
        .sign_in(&Credentials {
            method: AuthMethod::Email,
            identifier: "u4@dajoweb.org".to_string(),
            password: SecretString::from("secret1".to_string()),
        })
        .await
        .map_err(|err| anyhow!(err.to_string()))?;

    assert_eq!(load_vip_state(app.api()).await, VipState::NoActivePlan);
    Ok(())
}
