// src/service/payment_service.rs

//! 決済ゲートウェイとの連携
//!
//! 取引を作成してリダイレクト先URLを受け取るだけで、
//! ゲートウェイ固有のプロトコルはここに閉じ込める。

use crate::api::dto::payment_dto::{
    GatewayDebitRequest, GatewayDebitResponse, InitiatePaymentRequest, InitiatePaymentResponse,
    PaymentCallback, PaymentCallbackAck, PaymentStatus,
};
use crate::config::PaymentGatewayConfig;
use crate::error::{AppError, AppResult};
use crate::utils::error_helper::{external_service_error, internal_server_error};
use axum::http::StatusCode;
use chrono::Utc;
use std::time::Duration;
use tracing::{error, info, warn};

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

/// 取引ID（`TXN` + UNIXミリ秒）を生成
pub fn generate_transaction_id() -> String {
    format!("TXN{}", Utc::now().timestamp_millis())
}

#[derive(Clone)]
pub struct PaymentService {
    client: reqwest::Client,
    config: PaymentGatewayConfig,
    public_base_url: String,
}

impl PaymentService {
    pub fn new(config: PaymentGatewayConfig, public_base_url: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .map_err(|e| {
                internal_server_error(e, "payment_service::new", "Failed to build HTTP client")
            })?;

        Ok(Self {
            client,
            config,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// 取引を作成し、決済ページのURLを返す
    pub async fn initiate(
        &self,
        request: InitiatePaymentRequest,
    ) -> AppResult<InitiatePaymentResponse> {
        let transaction_id = generate_transaction_id();

        info!(
            transaction_id = %transaction_id,
            amount = request.amount,
            currency = %self.config.currency,
            resource_id = ?request.resource_id,
            resource_title = ?request.resource_title,
            has_address = request.customer_address.is_some(),
            has_phone = request.customer_phone.is_some(),
            "Initiating payment"
        );

        // 開発モードの場合はモックURLを返す
        if self.config.development_mode {
            info!("Development mode: returning mock payment URL");
            return Ok(InitiatePaymentResponse {
                success: true,
                redirect_url: self.success_url(&transaction_id, &request),
                transaction_id,
                amount: request.amount,
                currency: self.config.currency.clone(),
            });
        }

        let debit = GatewayDebitRequest {
            merchant_transaction_id: transaction_id.clone(),
            amount: request.amount.to_string(),
            currency: self.config.currency.clone(),
            success_url: self.success_url(&transaction_id, &request),
            cancel_url: format!(
                "{}/payment/cancel?transactionId={}",
                self.public_base_url, transaction_id
            ),
            error_url: format!(
                "{}/payment/error?transactionId={}",
                self.public_base_url, transaction_id
            ),
            callback_url: format!("{}/api/payment/callback", self.public_base_url),
        };

        let response = self
            .client
            .post(self.config.debit_url())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(&debit)
            .send()
            .await
            .map_err(|e| {
                external_service_error(
                    e,
                    "payment_service::initiate",
                    "Failed to connect to the payment gateway",
                )
            })?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);

        if !status.is_success() {
            error!(
                transaction_id = %transaction_id,
                status = %status,
                body = %body,
                "Payment gateway rejected the request"
            );
            return Err(AppError::UpstreamRejected {
                status: StatusCode::from_u16(status.as_u16())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                message: "Payment gateway rejected the request".to_string(),
                details: Some(body),
            });
        }

        let parsed: GatewayDebitResponse =
            serde_json::from_value(body.clone()).unwrap_or_default();
        match (parsed.return_type.as_deref(), parsed.redirect_url) {
            (Some("REDIRECT"), Some(redirect_url)) if !redirect_url.is_empty() => {
                info!(transaction_id = %transaction_id, "Payment transaction created");
                Ok(InitiatePaymentResponse {
                    success: true,
                    redirect_url,
                    transaction_id,
                    amount: request.amount,
                    currency: self.config.currency.clone(),
                })
            }
            _ => {
                warn!(
                    transaction_id = %transaction_id,
                    body = %body,
                    "Unexpected payment gateway response"
                );
                Err(AppError::UpstreamRejected {
                    status: StatusCode::BAD_REQUEST,
                    message: "Unexpected response from the payment gateway".to_string(),
                    details: Some(body),
                })
            }
        }
    }

    /// ゲートウェイからの通知を記録して受領応答を返す
    pub fn record_callback(&self, callback: &PaymentCallback) -> PaymentCallbackAck {
        let merchant_transaction_id = callback.merchant_transaction_id.clone();
        let transaction = merchant_transaction_id.as_deref().unwrap_or("unknown");

        match PaymentStatus::parse(callback.status.as_deref()) {
            PaymentStatus::Success => {
                info!(transaction_id = %transaction, amount = ?callback.amount, "Payment succeeded")
            }
            PaymentStatus::Failed => warn!(
                transaction_id = %transaction,
                error_code = ?callback.error_code,
                error_message = ?callback.error_message,
                "Payment failed"
            ),
            PaymentStatus::Cancelled => info!(transaction_id = %transaction, "Payment cancelled"),
            PaymentStatus::Unknown => warn!(
                transaction_id = %transaction,
                status = ?callback.status,
                "Payment callback with unrecognized status"
            ),
        }

        PaymentCallbackAck {
            received: true,
            timestamp: Utc::now(),
            transaction_id: merchant_transaction_id,
        }
    }

    fn success_url(&self, transaction_id: &str, request: &InitiatePaymentRequest) -> String {
        format!(
            "{}/payment/success?transactionId={}&amount={}&currency={}&customerEmail={}&customerName={}",
            self.public_base_url,
            transaction_id,
            request.amount,
            self.config.currency,
            urlencoding::encode(&request.customer_email),
            urlencoding::encode(&request.customer_name)
        )
    }
}
