// src/config/mod.rs
pub mod app;
pub mod payment;

pub use app::{AppConfig, Config, DownloadConfig, FailedTransferPolicy};
pub use payment::PaymentGatewayConfig;
