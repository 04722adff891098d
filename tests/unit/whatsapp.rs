use wiremock::matchers::{basic_auth, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use whatsapp_router::config::WhatsappConfig;
use whatsapp_router::whatsapp::{AuthTokenHolder, HttpWhatsappClient, WhatsappClient};

fn client_for(server: &MockServer, token: &str) -> HttpWhatsappClient {
    let config = WhatsappConfig {
        base_url: server.uri(),
        username: "router".to_string(),
        password: "secret".to_string(),
        token_refresh_seconds: 0,
    };
    HttpWhatsappClient::new(reqwest::Client::new(), config, AuthTokenHolder::new(token))
}

#[tokio::test]
async fn test_send_message_posts_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("Authorization", "Bearer wa-token"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "wa-token");
    client
        .send_message(br#"{"to":"1","type":"text","text":{"body":"hi"}}"#)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_send_message_401_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server, "stale-token");
    let err = client.send_message(b"{}").await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_send_message_uses_current_holder_value() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("Authorization", "Bearer rotated"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let holder = AuthTokenHolder::new("initial");
    let config = WhatsappConfig {
        base_url: server.uri(),
        username: String::new(),
        password: String::new(),
        token_refresh_seconds: 0,
    };
    let client = HttpWhatsappClient::new(reqwest::Client::new(), config, holder.clone());

    holder.set("rotated");
    client.send_message(b"{}").await.unwrap();
}

#[tokio::test]
async fn test_login_uses_basic_auth_and_parses_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/users/login"))
        .and(basic_auth("router", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "users": [{"token": "fresh-token", "expires_after": "2026-09-01 00:00:00+00:00"}],
            "meta": {"version": "v2.41", "api_status": "stable"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, "");
    let login = client.login().await.unwrap();
    assert_eq!(login.users[0].token, "fresh-token");
}

#[tokio::test]
async fn test_login_failure_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/users/login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server, "");
    assert!(client.login().await.is_err());
}

#[tokio::test]
async fn test_health_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server, "wa-token");
    assert_eq!(client.health().await.unwrap(), 200);
}
