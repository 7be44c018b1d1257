//! Integration tests for AppContext lifecycle
//!
//! Tests build the full dependency graph against a wiremock server and a
//! temporary data directory, then drive the session through it.

use civicreport_common::testing::jwt_for;
use civicreport_core::RestoreOutcome;
use civicreport_domain::{ApiConfig, Config, LoggingConfig, Role, SessionStatus, StorageConfig};
use civicreport_lib::context::AppContext;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer, data_dir: &TempDir) -> Config {
    Config {
        api: ApiConfig::new(server.uri()),
        storage: StorageConfig::new(data_dir.path()),
        logging: LoggingConfig::default(),
    }
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": token,
            "refreshToken": "r1",
            "user": { "id": "7", "name": "Anna" }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_context_creation_succeeds() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();

    let context = AppContext::new_with_config(test_config(&server, &data_dir)).unwrap();
    assert_eq!(context.session.snapshot().status, SessionStatus::Loading);
    assert!(!context.tokens.is_authenticated().await);

    // Nothing touches the network or the disk until start
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(!data_dir.path().join("storage.json").exists());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    let mut config = test_config(&server, &data_dir);
    config.api.timeout_seconds = 0;

    assert!(AppContext::new_with_config(config).is_err());
}

#[tokio::test]
async fn test_start_without_stored_session() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    let context = AppContext::new_with_config(test_config(&server, &data_dir)).unwrap();

    assert_eq!(context.start().await, RestoreOutcome::NoSession);
    assert_eq!(context.session.snapshot().status, SessionStatus::Anonymous);
    context.shutdown().await;
}

#[tokio::test]
async fn test_session_survives_restart_through_file_store() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    let token = jwt_for("7", "anna@x.com", json!("manager"), Some("rome"));
    mount_login(&server, &token).await;
    Mock::given(method("GET"))
        .and(path("/user/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 7, "name": "Anna" })))
        .mount(&server)
        .await;

    {
        let context = AppContext::new_with_config(test_config(&server, &data_dir)).unwrap();
        context.start().await;
        let user = context.session.login("anna@x.com", "secret").await.unwrap();
        assert_eq!(user.role, Role::Manager);
        context.shutdown().await;
    }

    let stored: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(data_dir.path().join("storage.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(stored["accessToken"], token.as_str());
    assert_eq!(stored["refreshToken"], "r1");
    assert!(stored["user"].as_str().unwrap().contains("Anna"));

    let context = AppContext::new_with_config(test_config(&server, &data_dir)).unwrap();
    assert_eq!(context.start().await, RestoreOutcome::Restored);
    let snapshot = context.session.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Authenticated);
    assert_eq!(snapshot.tenant_id(), Some("rome"));
    assert_eq!(snapshot.user.unwrap().name.as_deref(), Some("Anna"));
    context.shutdown().await;
}

#[tokio::test]
async fn test_logout_clears_file_store() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    let token = jwt_for("7", "anna@x.com", json!(3), None);
    mount_login(&server, &token).await;

    let context = AppContext::new_with_config(test_config(&server, &data_dir)).unwrap();
    context.start().await;
    context.session.login("anna@x.com", "secret").await.unwrap();
    context.session.logout().await;

    let stored: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(data_dir.path().join("storage.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(stored, json!({}));
    assert_eq!(context.session.snapshot().status, SessionStatus::Anonymous);

    let restarted = AppContext::new_with_config(test_config(&server, &data_dir)).unwrap();
    assert_eq!(restarted.start().await, RestoreOutcome::NoSession);
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    let context = AppContext::new_with_config(test_config(&server, &data_dir)).unwrap();

    context.start().await;
    context.shutdown().await;
    context.shutdown().await;
}
