// src/api/handlers/download_handler.rs
use crate::api::dto::download_dto::{
    FileInfoResponse, GenerateDownloadRequest, GenerateDownloadResponse, ProbeLinkResponse,
    UrlRequest,
};
use crate::api::AppState;
use crate::error::AppResult;
use crate::service::download_proxy_service::DownloadPayload;
use crate::utils::content_inspect::sanitize_header_filename;
use crate::utils::error_helper::convert_validation_errors;
use crate::utils::token::token_prefix;
use axum::{
    body::Body,
    extract::{Json, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use tracing::info;
use validator::Validate;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// 購入後のダウンロードトークン発行
pub async fn generate_download_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<GenerateDownloadRequest>,
) -> AppResult<Json<GenerateDownloadResponse>> {
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "download_handler::generate"))?;

    info!(
        resource_id = %payload.resource_id,
        transaction_id = %payload.transaction_id,
        "Generating download token"
    );

    let generated = app_state
        .download_token_service
        .generate(
            &payload.resource_id,
            &payload.owner_email,
            &payload.transaction_id,
        )
        .await?;

    Ok(Json(generated.into()))
}

/// トークンを引き換えてファイルを配信する。失敗はエラーページへリダイレクト
pub async fn access_download_handler(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
) -> Response {
    match app_state.download_token_service.redeem(&token).await {
        Ok(payload) => {
            info!(
                token = %token_prefix(&token),
                file_name = %payload.file_name,
                "Starting file delivery"
            );
            file_response(payload)
        }
        Err(err) => {
            let location = app_state
                .config
                .download_error_url(err.redirect_type().as_str(), &err.user_message());
            info!(
                token = %token_prefix(&token),
                redirect_type = err.redirect_type().as_str(),
                "Download redemption failed, redirecting to error page"
            );
            Redirect::temporary(&location).into_response()
        }
    }
}

/// ダウンロードURLの事前チェック
pub async fn validate_link_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<UrlRequest>,
) -> AppResult<Json<ProbeLinkResponse>> {
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "download_handler::validate"))?;

    let result = app_state.link_probe_service.probe(payload.url.trim()).await;

    Ok(Json(ProbeLinkResponse {
        success: true,
        result,
    }))
}

/// URLのファイル名・拡張子
pub async fn file_info_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<UrlRequest>,
) -> AppResult<Json<FileInfoResponse>> {
    payload
        .validate()
        .map_err(|e| convert_validation_errors(e, "download_handler::file_info"))?;

    let info = app_state
        .link_probe_service
        .file_info(payload.url.trim())
        .await;

    Ok(Json(FileInfoResponse {
        success: true,
        info,
    }))
}

/// 上流の本文をそのまま流すレスポンスを組み立てる
fn file_response(payload: DownloadPayload) -> Response {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&payload.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE)),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(&payload.file_name),
    );
    if let Some(length) = payload.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));

    (StatusCode::OK, headers, Body::from_stream(payload.body)).into_response()
}

/// `attachment; filename="..."`。非ASCII名は filename* を併記する
pub fn content_disposition(file_name: &str) -> HeaderValue {
    let name = sanitize_header_filename(file_name);
    let value = if name.is_ascii() {
        format!("attachment; filename=\"{}\"", name)
    } else {
        let fallback: String = name
            .chars()
            .map(|c| if c.is_ascii() { c } else { '_' })
            .collect();
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(&name)
        )
    };
    HeaderValue::from_str(&value)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"download\""))
}

pub fn download_router(app_state: AppState) -> Router {
    let access_route = format!(
        "{}/{{token}}",
        app_state.config.download.access_path.trim_end_matches('/')
    );

    Router::new()
        .route("/api/download/generate", post(generate_download_handler))
        .route(&access_route, get(access_download_handler))
        .route("/api/download/validate", post(validate_link_handler))
        .route("/api/download/file-info", post(file_info_handler))
        .with_state(app_state)
}
