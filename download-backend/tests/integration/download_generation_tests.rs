// tests/integration/download_generation_tests.rs
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use crate::common::app_helper::setup_test_app;
use crate::common::request::{body_json, json_request};

const GENERATE_URI: &str = "/api/download/generate";

fn generate_body(resource_id: &str, transaction_id: &str) -> serde_json::Value {
    json!({
        "resourceId": resource_id,
        "ownerEmail": "buyer@example.com",
        "transactionId": transaction_id,
    })
}

#[tokio::test]
async fn test_generate_returns_redemption_url() {
    let app = setup_test_app();
    app.catalog
        .add("game-1", "https://cdn.example.com/files/game-1.zip", true);

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", GENERATE_URI, &generate_body("game-1", "TXN1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["maxDownloads"], 3);
    assert_eq!(body["remainingDownloads"], 3);
    assert_eq!(body["reused"], false);

    let download_url = body["downloadUrl"].as_str().unwrap();
    assert!(download_url.starts_with("http://localhost:3000/api/download/access/"));
    // 元のURLはレスポンスに含めない
    assert!(!body.to_string().contains("cdn.example.com"));

    let tokens = app.store.all();
    assert_eq!(tokens.len(), 1);
    let token = &tokens[0];
    assert!(download_url.ends_with(&token.id));
    assert_eq!(token.id.len(), 64);
    assert_eq!(token.current_downloads, 0);
    assert_eq!(token.transaction_id, "TXN1");
    assert_eq!(token.owner_email, "buyer@example.com");
    assert!(token.expires_at > token.created_at);
}

#[tokio::test]
async fn test_generate_is_idempotent_per_transaction() {
    let app = setup_test_app();
    app.catalog
        .add("game-1", "https://cdn.example.com/files/game-1.zip", true);

    let first = app
        .service
        .generate("game-1", "buyer@example.com", "TXN-retry")
        .await
        .unwrap();
    let second = app
        .service
        .generate("game-1", "buyer@example.com", "TXN-retry")
        .await
        .unwrap();

    assert_eq!(first.token_id, second.token_id);
    assert!(!first.reused);
    assert!(second.reused);
    assert_eq!(app.store.len(), 1);

    let other = app
        .service
        .generate("game-1", "buyer@example.com", "TXN-other")
        .await
        .unwrap();
    assert_ne!(first.token_id, other.token_id);
    assert_eq!(app.store.len(), 2);
}

#[tokio::test]
async fn test_generate_reuses_token_when_lookup_misses_concurrent_insert() {
    let app = setup_test_app();
    app.catalog
        .add("game-1", "https://cdn.example.com/files/game-1.zip", true);
    // 同時発行で2件目の検索が1件目の保存より先に走った状態
    app.store.stale_lookups();

    let first = app
        .service
        .generate("game-1", "buyer@example.com", "TXN-race")
        .await
        .unwrap();
    let second = app
        .service
        .generate("game-1", "buyer@example.com", "TXN-race")
        .await
        .unwrap();

    assert_eq!(first.token_id, second.token_id);
    assert!(!first.reused);
    assert!(second.reused);
    assert_eq!(second.remaining_downloads, 3);
    assert_eq!(app.store.len(), 1);
}

#[tokio::test]
async fn test_generate_stores_normalized_drive_link() {
    let app = setup_test_app();
    app.catalog.add(
        "game-drive",
        "https://drive.google.com/file/d/1ABC123xyz/view?usp=sharing",
        true,
    );

    let generated = app
        .service
        .generate("game-drive", "buyer@example.com", "TXN-drive")
        .await
        .unwrap();

    let token = app.store.get(&generated.token_id).unwrap();
    assert_eq!(
        token.original_url,
        "https://drive.google.com/uc?export=download&id=1ABC123xyz"
    );
}

#[tokio::test]
async fn test_generate_missing_fields_is_bad_request() {
    let app = setup_test_app();

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", GENERATE_URI, &json!({ "resourceId": "game-1" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error_type"], "validation_errors");
    assert_eq!(app.store.len(), 0);
}

#[tokio::test]
async fn test_generate_unknown_resource_is_not_found() {
    let app = setup_test_app();

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", GENERATE_URI, &generate_body("missing", "TXN2")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.store.len(), 0);
}

#[tokio::test]
async fn test_generate_empty_link_fails_without_token() {
    let app = setup_test_app();
    app.catalog.add("game-empty", "", true);

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", GENERATE_URI, &generate_body("game-empty", "TXN3")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("not available"));
    assert_eq!(app.store.len(), 0);
}

#[tokio::test]
async fn test_generate_inactive_resource_fails_regardless_of_link() {
    let app = setup_test_app();
    app.catalog
        .add("game-valid", "https://cdn.example.com/files/game.zip", false);
    app.catalog
        .add("game-broken", "https://drive.google.com/drive/folders", false);

    for resource_id in ["game-valid", "game-broken"] {
        let err = app
            .service
            .generate(resource_id, "buyer@example.com", resource_id)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            download_backend::domain::download_error::GenerationError::ResourceInactive
        );
    }
    assert_eq!(app.store.len(), 0);
}

#[tokio::test]
async fn test_generate_unconvertible_link_is_bad_request() {
    let app = setup_test_app();
    app.catalog
        .add("game-folder", "https://drive.google.com/drive/folders", true);
    app.catalog.add("game-ftp", "ftp://files.example.com/game.zip", true);

    for (resource_id, tx) in [("game-folder", "TXN4"), ("game-ftp", "TXN5")] {
        let response = app
            .router
            .clone()
            .oneshot(json_request("POST", GENERATE_URI, &generate_body(resource_id, tx)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", resource_id);
    }
    assert_eq!(app.store.len(), 0);
}

#[tokio::test]
async fn test_generate_store_failure_is_internal_error() {
    let app = setup_test_app();
    app.catalog
        .add("game-1", "https://cdn.example.com/files/game-1.zip", true);
    app.store.fail_writes();

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", GENERATE_URI, &generate_body("game-1", "TXN6")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(!body.to_string().contains("store unavailable"));
}
