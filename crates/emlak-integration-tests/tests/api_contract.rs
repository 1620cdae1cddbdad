//! API contract tests: status codes, envelope shape, auth surfaces, and
//! the not-found-vs-empty-list distinction, all driven through the full
//! router with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use emlak_api::state::AppState;
use emlak_core::{PasswordDigest, Role, UserId, UserRecord};

/// Build a test app with one admin and one agent account.
fn test_state() -> AppState {
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

fn test_app() -> axum::Router {
    emlak_api::app(test_state())
}

/// Read response body as JSON Value.
async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_authed(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
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

/// Log in and return the session token.
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
    let v = body_json(resp).await;
    v["token"].as_str().unwrap().to_string()
}

fn sample_listing(title: &str, price: u64) -> Value {
    json!({
        "title": title,
        "description": "Merkezi konumda",
        "listing_type": "sale",
        "category": {"main": "residential", "sub": "Apartment"},
        "price": price,
        "location": {"country": "TR", "city": "İstanbul", "district": "Kadıköy"},
        "specs": {
            "net_size": 95,
            "rooms": "2+1",
            "bathrooms": 1,
            "age": 5,
            "heating": "natural_gas",
            "furnishing": "unfurnished"
        }
    })
}

/// Create a listing as the given user and return its id.
async fn create_listing(app: &axum::Router, token: &str, title: &str, price: u64) -> String {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/properties",
            Some(token),
            sample_listing(title, price),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let v = body_json(resp).await;
    v["id"].as_str().unwrap().to_string()
}

// ── Health & docs ───────────────────────────────────────────────────

#[tokio::test]
async fn health_probes_respond_without_auth() {
    let app = test_app();
    for uri in ["/health/liveness", "/health/readiness"] {
        let resp = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn openapi_spec_is_served() {
    let app = test_app();
    let resp = app.oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert!(v["paths"].is_object());
}

// ── Public listing surface ──────────────────────────────────────────

#[tokio::test]
async fn empty_listing_search_returns_empty_page_not_error() {
    let app = test_app();
    let resp = app
        .oneshot(get("/v1/properties?city=%C4%B0stanbul&rooms=2%2B1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["items"].as_array().unwrap().len(), 0);
    assert_eq!(v["pagination"]["total"], 0);
    assert_eq!(v["pagination"]["total_pages"], 0);
}

#[tokio::test]
async fn listing_envelope_has_canonical_pagination_shape() {
    let app = test_app();
    let token = login(&app, "agent", "agent-parola-1").await;
    create_listing(&app, &token, "Modern Daire", 1_000_000).await;

    let resp = app.oneshot(get("/v1/properties")).await.unwrap();
    let v = body_json(resp).await;
    let pagination = v["pagination"].as_object().unwrap();
    for key in ["page", "limit", "total", "total_pages", "has_next", "has_prev"] {
        assert!(pagination.contains_key(key), "missing {key}");
    }
    assert_eq!(pagination["limit"], 20, "canonical default limit");
}

#[tokio::test]
async fn nonexistent_id_is_an_explicit_not_found() {
    let app = test_app();
    let resp = app
        .oneshot(get(&format!(
            "/v1/properties/{}",
            uuid::Uuid::new_v4()
        )))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let v = body_json(resp).await;
    assert_eq!(v["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn detail_is_reachable_by_slug() {
    let app = test_app();
    let token = login(&app, "agent", "agent-parola-1").await;
    let id = create_listing(&app, &token, "Lüks Villa Projesi", 5_000_000).await;

    let resp = app.clone().oneshot(get(&format!("/v1/properties/{id}"))).await.unwrap();
    let v = body_json(resp).await;
    let slug = v["slug"].as_str().unwrap();
    assert!(slug.starts_with("luks-villa-projesi-"), "{slug}");

    let resp = app
        .oneshot(get(&format!("/v1/properties/slug/{slug}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["id"].as_str().unwrap(), id);
}

#[tokio::test]
async fn view_endpoint_increments_counter() {
    let app = test_app();
    let token = login(&app, "agent", "agent-parola-1").await;
    let id = create_listing(&app, &token, "Modern Daire", 900_000).await;

    for expected in 1..=3u64 {
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/v1/properties/{id}/view"),
                None,
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v["view_count"], expected);
    }
}

#[tokio::test]
async fn passive_listings_are_hidden_unless_status_requested() {
    let app = test_app();
    let token = login(&app, "agent", "agent-parola-1").await;
    let id = create_listing(&app, &token, "Satılık Daire", 700_000).await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/v1/properties/{id}"),
            Some(&token),
            json!({"status": "passive"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = body_json(app.clone().oneshot(get("/v1/properties")).await.unwrap()).await;
    assert_eq!(v["pagination"]["total"], 0, "default search hides passive");

    let v = body_json(
        app.oneshot(get("/v1/properties?status=passive")).await.unwrap(),
    )
    .await;
    assert_eq!(v["pagination"]["total"], 1);
}

// ── Admin surface: auth required ────────────────────────────────────

#[tokio::test]
async fn mutations_require_a_session() {
    let app = test_app();
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/properties",
            None,
            sample_listing("X", 1),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/v1/properties",
            Some("not-a-real-token"),
            sample_listing("X", 1),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_validates_and_rejects_bad_bodies() {
    let app = test_app();
    let token = login(&app, "agent", "agent-parola-1").await;

    // Empty title → 422.
    let mut body = sample_listing("", 100);
    body["title"] = json!("");
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/v1/properties", Some(&token), body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let v = body_json(resp).await;
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");

    // Malformed JSON → 400.
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/properties")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_cannot_change_listing_type_and_bumps_updated_at() {
    let app = test_app();
    let token = login(&app, "agent", "agent-parola-1").await;
    let id = create_listing(&app, &token, "Kiralık Daire", 15_000).await;

    let before = body_json(
        app.clone()
            .oneshot(get(&format!("/v1/properties/{id}")))
            .await
            .unwrap(),
    )
    .await;

    // listing_type is not part of the update schema; sending it is ignored.
    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/v1/properties/{id}"),
            Some(&token),
            json!({"price": 18_000, "listing_type": "rent"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let after = body_json(resp).await;

    assert_eq!(after["listing_type"], before["listing_type"]);
    assert_eq!(after["price"], 18_000);
    assert_eq!(after["created_at"], before["created_at"]);
    assert_ne!(after["updated_at"], before["updated_at"]);
}

#[tokio::test]
async fn delete_removes_the_listing() {
    let app = test_app();
    let token = login(&app, "agent", "agent-parola-1").await;
    let id = create_listing(&app, &token, "Silinecek", 1).await;

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

    let resp = app.oneshot(get(&format!("/v1/properties/{id}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Customers ───────────────────────────────────────────────────────

#[tokio::test]
async fn customer_crud_and_interactions() {
    let app = test_app();
    let token = login(&app, "agent", "agent-parola-1").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/customers",
            Some(&token),
            json!({
                "full_name": "Ayşe Yılmaz",
                "phone": "+90 532 000 00 00",
                "customer_type": "buyer"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let customer = body_json(resp).await;
    let id = customer["id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/v1/customers/{id}/interactions"),
            Some(&token),
            json!({"kind": "call", "note": "2+1 arıyor, bütçe 2M"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["interactions"].as_array().unwrap().len(), 1);

    let v = body_json(
        app.clone()
            .oneshot(get_authed("/v1/customers?customer_type=buyer", &token))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(v["pagination"]["total"], 1);

    let v = body_json(
        app.clone()
            .oneshot(get_authed("/v1/customers?customer_type=seller", &token))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(v["pagination"]["total"], 0);

    let resp = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/customers/{id}"))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

// ── Users: admin only ───────────────────────────────────────────────

#[tokio::test]
async fn user_management_requires_admin_role() {
    let app = test_app();
    let agent_token = login(&app, "agent", "agent-parola-1").await;
    let resp = app
        .clone()
        .oneshot(get_authed("/v1/users", &agent_token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let v = body_json(resp).await;
    assert_eq!(v["error"]["code"], "FORBIDDEN");

    let admin_token = login(&app, "admin", "admin-parola-1").await;
    let resp = app
        .oneshot(get_authed("/v1/users", &admin_token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = test_app();
    let admin_token = login(&app, "admin", "admin-parola-1").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/users",
            Some(&admin_token),
            json!({
                "username": "agent",
                "display_name": "Dupe",
                "role": "agent",
                "password": "gizli-parola"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn user_responses_never_contain_password_material() {
    let app = test_app();
    let admin_token = login(&app, "admin", "admin-parola-1").await;
    let resp = app
        .oneshot(get_authed("/v1/users", &admin_token))
        .await
        .unwrap();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let raw = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(!raw.contains("password"));
    assert!(!raw.contains("parola-1"));
}

// ── Sessions ────────────────────────────────────────────────────────

#[tokio::test]
async fn wrong_credentials_are_rejected_uniformly() {
    let app = test_app();
    for body in [
        json!({"username": "admin", "password": "wrong"}),
        json!({"username": "no-such-user", "password": "wrong"}),
    ] {
        let resp = app
            .clone()
            .oneshot(json_request("POST", "/v1/auth/login", None, body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let v = body_json(resp).await;
        assert_eq!(v["error"]["message"], "unauthorized: invalid credentials");
    }
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = test_app();
    let token = login(&app, "agent", "agent-parola-1").await;

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/v1/auth/logout", Some(&token), json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .oneshot(get_authed("/v1/auth/session", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_introspection_reports_expiry() {
    let app = test_app();
    let token = login(&app, "agent", "agent-parola-1").await;
    let resp = app
        .oneshot(get_authed("/v1/auth/session", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["username"], "agent");
    assert_eq!(v["role"], "agent");
    assert!(v["expires_at"].is_string());
    assert_eq!(v["remember"], false);
}
