// src/api/dto/payment_dto.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Deserialize, Serialize, Debug, Default, Clone, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct InitiatePaymentRequest {
    #[validate(range(min = 0.01, message = "amount must be greater than zero"))]
    pub amount: f64,

    #[validate(email(message = "customerEmail must be a valid email address"))]
    pub customer_email: String,

    #[validate(length(min = 1, message = "customerName is required"))]
    pub customer_name: String,

    pub customer_address: Option<String>,
    pub customer_phone: Option<String>,
    pub resource_id: Option<String>,
    pub resource_title: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentResponse {
    pub success: bool,
    pub redirect_url: String,
    pub transaction_id: String,
    pub amount: f64,
    pub currency: String,
}

/// ゲートウェイへ送る取引作成リクエスト
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GatewayDebitRequest {
    pub merchant_transaction_id: String,
    pub amount: String,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub error_url: String,
    pub callback_url: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayDebitResponse {
    pub return_type: Option<String>,
    pub redirect_url: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CallbackCustomer {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// ゲートウェイからの決済結果通知（POST本文・GETクエリ共用）
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentCallback {
    pub merchant_transaction_id: Option<String>,
    pub transaction_id: Option<String>,
    pub status: Option<String>,
    /// 数値・文字列のどちらでも届く
    pub amount: Option<serde_json::Value>,
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CallbackCustomer>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCallbackAck {
    pub received: bool,
    pub timestamp: DateTime<Utc>,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Success,
    Failed,
    Cancelled,
    Unknown,
}

impl PaymentStatus {
    pub fn parse(status: Option<&str>) -> Self {
        match status.map(str::to_ascii_uppercase).as_deref() {
            Some("SUCCESS") => Self::Success,
            Some("FAILED") => Self::Failed,
            Some("CANCELLED") => Self::Cancelled,
            _ => Self::Unknown,
        }
    }
}
