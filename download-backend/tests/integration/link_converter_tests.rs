// tests/integration/link_converter_tests.rs
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use crate::common::app_helper::setup_test_app;
use crate::common::request::{body_json, get_request, json_request};

#[tokio::test]
async fn test_convert_dropbox_link() {
    let app = setup_test_app();

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/link-converter/test",
            &json!({ "url": "https://www.dropbox.com/s/abc123/My%20Game.zip?dl=0" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["result"]["provider"], "dropbox");
    assert_eq!(body["result"]["isValid"], true);
    assert_eq!(body["result"]["fileName"], "My Game.zip");
    assert_eq!(
        body["result"]["directUrl"],
        "https://dl.dropboxusercontent.com/s/abc123/My%20Game.zip"
    );
}

#[tokio::test]
async fn test_convert_requires_url() {
    let app = setup_test_app();

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/link-converter/test", &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sample_conversions() {
    let app = setup_test_app();

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/link-converter/test"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 5);
    assert_eq!(results[0]["provider"], "google-drive");
    assert_eq!(
        results[0]["directUrl"],
        "https://drive.google.com/uc?export=download&id=1ABC123xyz"
    );
    assert_eq!(results[4]["provider"], "unknown");
}
