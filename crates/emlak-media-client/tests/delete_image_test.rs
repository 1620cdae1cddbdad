//! Contract tests for the media CDN client against a mock server.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use emlak_media_client::{MediaCdnConfig, MediaClient};

async fn client_for(server: &MockServer) -> MediaClient {
    let config = MediaCdnConfig::local_mock(&server.uri(), "test-key").unwrap();
    MediaClient::new(config).unwrap()
}

#[tokio::test]
async fn delete_image_sends_bearer_and_parses_response() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/assets/prop/abc123"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "deleted": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let deleted = client.delete_image("prop/abc123").await.unwrap();
    assert!(deleted);
}

#[tokio::test]
async fn delete_image_treats_404_as_already_gone() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let deleted = client.delete_image("prop/missing").await.unwrap();
    assert!(!deleted);
}

#[tokio::test]
async fn delete_image_surfaces_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.delete_image("prop/abc").await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("delete_image"), "{msg}");
    assert!(msg.contains("500"), "{msg}");
}

#[tokio::test]
async fn delete_images_continues_past_failures() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/assets/ok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "deleted": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/assets/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/assets/ok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "deleted": true
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let ids = vec![
        "ok-1".to_string(),
        "broken".to_string(),
        "ok-2".to_string(),
    ];
    assert_eq!(client.delete_images(&ids).await, 2);
}

#[tokio::test]
async fn health_check_round_trips() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.health_check().await.unwrap();
}
