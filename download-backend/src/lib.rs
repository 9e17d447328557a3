// src/lib.rs
pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod repository;
pub mod service;
pub mod utils;

use crate::api::AppState;
use crate::config::{AppConfig, PaymentGatewayConfig};
use crate::error::AppResult;
use crate::repository::{
    download_token_repository::DownloadTokenRepository, resource_repository::ResourceRepository,
};
use crate::service::{
    download_proxy_service::DownloadProxyService, download_token_service::DownloadTokenService,
    http_fetcher::ReqwestFetcher, link_probe_service::LinkProbeService,
    payment_service::PaymentService,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// DB接続と設定から本番用のアプリケーション状態を組み立てる
pub fn build_app_state(
    db: DatabaseConnection,
    config: AppConfig,
    payment_config: PaymentGatewayConfig,
) -> AppResult<AppState> {
    let config = Arc::new(config);
    let fetcher = Arc::new(ReqwestFetcher::new()?);

    let proxy = Arc::new(DownloadProxyService::new(
        fetcher.clone(),
        config.download.transfer_timeout,
    ));
    let download_token_service = Arc::new(DownloadTokenService::new(
        Arc::new(DownloadTokenRepository::new(db.clone())),
        Arc::new(ResourceRepository::new(db)),
        proxy,
        config.clone(),
    ));
    let link_probe_service = Arc::new(LinkProbeService::new(fetcher, &config.download));
    let payment_service = Arc::new(PaymentService::new(
        payment_config,
        config.public_base_url.clone(),
    )?);

    Ok(AppState::new(
        download_token_service,
        link_probe_service,
        payment_service,
        config,
    ))
}
