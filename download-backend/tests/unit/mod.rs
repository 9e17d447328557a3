// tests/unit/mod.rs
pub mod download_proxy_tests;
pub mod repository_tests;
