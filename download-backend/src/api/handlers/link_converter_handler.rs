// src/api/handlers/link_converter_handler.rs
use crate::api::dto::download_dto::{ConvertLinkResponse, SampleConversionsResponse, UrlRequest};
use crate::api::AppState;
use crate::error::AppResult;
use crate::utils::error_helper::convert_validation_errors;
use crate::utils::link_converter::{convert_to_direct_link, sample_conversions};
use axum::{extract::Json, routing::get, Router};
use tracing::info;
use validator::Validate;

/// 共有リンクを直接ダウンロードURLへ変換して返す
pub async fn convert_link_handler(
    Json(payload): Json<UrlRequest>,
) -> AppResult<Json<ConvertLinkResponse>> {
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "link_converter_handler::convert"))?;

    let result = convert_to_direct_link(&payload.url);
    info!(
        provider = result.provider.as_str(),
        is_valid = result.is_valid,
        "Link converted"
    );

    Ok(Json(ConvertLinkResponse {
        success: true,
        result,
    }))
}

/// 組み込みのサンプルリンクを変換して返す
pub async fn sample_conversions_handler() -> Json<SampleConversionsResponse> {
    Json(SampleConversionsResponse {
        success: true,
        results: sample_conversions(),
    })
}

pub fn link_converter_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/link-converter/test",
            get(sample_conversions_handler).post(convert_link_handler),
        )
        .with_state(app_state)
}
