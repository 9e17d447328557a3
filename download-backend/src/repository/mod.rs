// src/repository/mod.rs
pub mod download_token_repository;
pub mod resource_repository;
