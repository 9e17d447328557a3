// tests/integration/payment_tests.rs
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use crate::common::app_helper::setup_test_app;
use crate::common::request::{body_json, get_request, json_request};

#[tokio::test]
async fn test_initiate_payment_in_development_mode() {
    let app = setup_test_app();

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/payment/initiate",
            &json!({
                "amount": 25000,
                "customerEmail": "buyer@example.com",
                "customerName": "Sara",
                "resourceId": "game-1",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["currency"], "IQD");
    assert_eq!(body["amount"], 25000.0);
    let transaction_id = body["transactionId"].as_str().unwrap();
    assert!(transaction_id.starts_with("TXN"));
    assert!(body["redirectUrl"].as_str().unwrap().contains(transaction_id));
}

#[tokio::test]
async fn test_initiate_payment_validates_input() {
    let app = setup_test_app();

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/payment/initiate",
            &json!({ "amount": 0, "customerEmail": "buyer@example.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_type"], "validation_errors");
}

#[tokio::test]
async fn test_payment_callback_post_and_get() {
    let app = setup_test_app();

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/payment/callback",
            &json!({
                "merchantTransactionId": "TXN123",
                "status": "FAILED",
                "amount": 25000,
                "errorCode": "2003",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["received"], true);
    assert_eq!(body["transactionId"], "TXN123");

    let response = app
        .router
        .clone()
        .oneshot(get_request(
            "/api/payment/callback?status=SUCCESS&merchantTransactionId=TXN456&amount=25000",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["transactionId"], "TXN456");
}
