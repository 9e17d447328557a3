// src/service/mod.rs
pub mod download_proxy_service;
pub mod download_token_service;
pub mod http_fetcher;
pub mod link_probe_service;
pub mod payment_service;
