// src/api/handlers/payment_handler.rs
use crate::api::dto::payment_dto::{
    InitiatePaymentRequest, InitiatePaymentResponse, PaymentCallback, PaymentCallbackAck,
};
use crate::api::AppState;
use crate::error::AppResult;
use crate::utils::error_helper::convert_validation_errors;
use axum::{
    extract::{Json, Query, State},
    routing::post,
    Router,
};
use validator::Validate;

/// 決済を開始し、ゲートウェイの決済ページURLを返す
pub async fn initiate_payment_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<InitiatePaymentRequest>,
) -> AppResult<Json<InitiatePaymentResponse>> {
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "payment_handler::initiate"))?;

    let response = app_state.payment_service.initiate(payload).await?;
    Ok(Json(response))
}

/// ゲートウェイからの通知（JSON本文）
pub async fn payment_callback_handler(
    State(app_state): State<AppState>,
    Json(callback): Json<PaymentCallback>,
) -> Json<PaymentCallbackAck> {
    Json(app_state.payment_service.record_callback(&callback))
}

/// ゲートウェイからの通知（クエリ文字列）
pub async fn payment_callback_query_handler(
    State(app_state): State<AppState>,
    Query(callback): Query<PaymentCallback>,
) -> Json<PaymentCallbackAck> {
    Json(app_state.payment_service.record_callback(&callback))
}

pub fn payment_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/payment/initiate", post(initiate_payment_handler))
        .route(
            "/api/payment/callback",
            post(payment_callback_handler).get(payment_callback_query_handler),
        )
        .with_state(app_state)
}
