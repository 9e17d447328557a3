// src/domain/mod.rs
pub mod converted_link;
pub mod download_error;
pub mod download_token_model;
pub mod resource_model;
pub mod validation_result;
