// src/main.rs
use download_backend::api::create_app;
use download_backend::config::{AppConfig, PaymentGatewayConfig};
use download_backend::db::create_db_pool;
use migration::{Migrator, MigratorTrait};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // トレーシングの設定
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "download_backend=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("Starting download backend server...");

    // 設定を読み込む
    let app_config = AppConfig::from_env().expect("Failed to load configuration");
    let payment_config =
        PaymentGatewayConfig::from_env().expect("Failed to load payment gateway configuration");
    tracing::info!(
        environment = %app_config.environment,
        public_base_url = %app_config.public_base_url,
        max_downloads = app_config.download.max_downloads,
        failed_transfer_policy = ?app_config.download.failed_transfer_policy,
        payment = ?payment_config,
        "Configuration loaded"
    );

    // データベース接続を作成
    let db_pool = create_db_pool(&app_config)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created successfully.");

    Migrator::up(&db_pool, None).await?;
    tracing::info!("Database migrations applied.");

    let server_addr = app_config.server_addr();
    let app_state = download_backend::build_app_state(db_pool, app_config, payment_config)?;
    let app_router = create_app(app_state);

    // サーバーの起動
    tracing::info!("Router configured. Server listening on {}", server_addr);

    let listener = TcpListener::bind(&server_addr).await?;
    axum::serve(listener, app_router.into_make_service()).await?;

    Ok(())
}
