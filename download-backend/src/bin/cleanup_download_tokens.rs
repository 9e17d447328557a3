// src/bin/cleanup_download_tokens.rs

//! 有効期限切れのダウンロードトークンを一括削除する
//!
//! cron などから定期的に実行する想定。

use download_backend::config::AppConfig;
use download_backend::db::create_db_pool;
use download_backend::repository::{
    download_token_repository::DownloadTokenRepository, resource_repository::ResourceRepository,
};
use download_backend::service::{
    download_proxy_service::DownloadProxyService, download_token_service::DownloadTokenService,
    http_fetcher::ReqwestFetcher,
};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "download_backend=info".into()),
        )
        .with(fmt::layer())
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    let db = create_db_pool(&config).await?;

    let proxy = Arc::new(DownloadProxyService::new(
        Arc::new(ReqwestFetcher::new()?),
        config.download.transfer_timeout,
    ));
    let service = DownloadTokenService::new(
        Arc::new(DownloadTokenRepository::new(db.clone())),
        Arc::new(ResourceRepository::new(db)),
        proxy,
        config,
    );

    let deleted = service.cleanup_expired().await?;
    println!("Deleted {} expired download token(s)", deleted);

    Ok(())
}
