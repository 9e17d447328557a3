// src/api/handlers/mod.rs
pub mod download_handler;
pub mod link_converter_handler;
pub mod payment_handler;
pub mod system_handler;
