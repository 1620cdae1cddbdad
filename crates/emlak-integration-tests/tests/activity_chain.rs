//! Audit-log behavior across the back office: every mutation leaves a
//! chained event, the chain verifies, and the console is admin-only.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use emlak_api::state::AppState;
use emlak_core::{PasswordDigest, Role, UserId, UserRecord};

fn state_with_users() -> AppState {
    let state = AppState::new();
    for (username, role, password) in [
        ("admin", Role::Admin, "admin-parola-1"),
        ("agent", Role::Agent, "agent-parola-1"),
    ] {
        let now = Utc::now();
        let user = UserRecord {
            id: UserId::new(),
            username: username.to_string(),
            display_name: username.to_string(),
            email: format!("{username}@example.com"),
            role,
            password: PasswordDigest::derive(password),
            active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user);
    }
    state
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_authed(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn login(app: &axum::Router, username: &str, password: &str) -> String {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            None,
            json!({"username": username, "password": password}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["token"].as_str().unwrap().to_string()
}

fn sample_listing() -> Value {
    json!({
        "title": "Denemelik Daire",
        "listing_type": "sale",
        "category": {"main": "residential"},
        "price": 1_000_000,
        "location": {"country": "TR", "city": "İstanbul"},
        "specs": {
            "net_size": 80,
            "rooms": "2+1",
            "bathrooms": 1,
            "age": 0,
            "heating": "central",
            "furnishing": "unfurnished"
        }
    })
}

#[tokio::test]
async fn mutations_append_verifiable_chain_events() {
    let state = state_with_users();
    let app = emlak_api::app(state.clone());
    let token = login(&app, "agent", "agent-parola-1").await;

    // login itself is the first audited event.
    assert_eq!(state.activity.len(), 1);

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/v1/properties", Some(&token), sample_listing()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id = body_json(resp).await["id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/v1/properties/{id}"),
            Some(&token),
            json!({"price": 1_100_000}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/properties/{id}"))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let events = state.activity.list();
    assert_eq!(events.len(), 4, "login + create + update + delete");
    let actions: Vec<&str> = events.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["login", "create", "update", "delete"]);
    assert!(events.iter().skip(1).all(|e| e.resource_type == "property"));
    assert!(state.activity.verify().chain_valid);
}

#[tokio::test]
async fn failed_logins_are_audited() {
    let state = state_with_users();
    let app = emlak_api::app(state.clone());

    let resp = app
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            None,
            json!({"username": "agent", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let events = state.activity.list();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, "login_failed");
}

#[tokio::test]
async fn activity_console_is_admin_only_and_filters() {
    let state = state_with_users();
    let app = emlak_api::app(state.clone());
    let agent_token = login(&app, "agent", "agent-parola-1").await;
    let admin_token = login(&app, "admin", "admin-parola-1").await;

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/v1/properties", Some(&agent_token), sample_listing()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Agent is forbidden.
    let resp = app
        .clone()
        .oneshot(get_authed("/v1/activity", &agent_token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Admin sees newest-first events and can filter by resource.
    let v = body_json(
        app.clone()
            .oneshot(get_authed("/v1/activity", &admin_token))
            .await
            .unwrap(),
    )
    .await;
    let items = v["items"].as_array().unwrap();
    assert_eq!(items[0]["action"], "create", "newest first");

    let v = body_json(
        app.clone()
            .oneshot(get_authed("/v1/activity?resource_type=property", &admin_token))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(v["pagination"]["total"], 1);

    let v = body_json(
        app.oneshot(get_authed("/v1/activity/verify", &admin_token))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(v["chain_valid"], true);
    assert_eq!(v["broken_links"], 0);
}
