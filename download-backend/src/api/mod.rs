// src/api/mod.rs
use crate::config::AppConfig;
use crate::logging::{inject_request_context, logging_middleware, request_log_path};
use crate::service::{
    download_token_service::DownloadTokenService, link_probe_service::LinkProbeService,
    payment_service::PaymentService,
};
use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod dto;
pub mod handlers;

/// 統一されたアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub download_token_service: Arc<DownloadTokenService>,
    pub link_probe_service: Arc<LinkProbeService>,
    pub payment_service: Arc<PaymentService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        download_token_service: Arc<DownloadTokenService>,
        link_probe_service: Arc<LinkProbeService>,
        payment_service: Arc<PaymentService>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            download_token_service,
            link_probe_service,
            payment_service,
            config,
        }
    }
}

/// 全ルーターを統合し、共通ミドルウェアを適用する
pub fn create_app(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config);

    Router::new()
        .merge(handlers::download_handler::download_router(app_state.clone()))
        .merge(handlers::link_converter_handler::link_converter_router(
            app_state.clone(),
        ))
        .merge(handlers::payment_handler::payment_router(app_state.clone()))
        .merge(handlers::system_handler::system_router(app_state))
        .layer(axum::middleware::from_fn(logging_middleware))
        .layer(axum::middleware::from_fn(inject_request_context))
        .layer(
            // URIにはトークンが含まれるため、スパンにはログ用のパスだけを載せる
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::debug_span!(
                    "request",
                    method = %req.method(),
                    path = %request_log_path(req),
                    version = ?req.version(),
                )
            }),
        )
        .layer(cors)
}

/// CORS ミドルウェア設定
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        // ブラウザ側でファイル名を読めるようにする
        .expose_headers([header::CONTENT_DISPOSITION, header::CONTENT_LENGTH])
        .max_age(Duration::from_secs(3600))
}
