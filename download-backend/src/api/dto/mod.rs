// src/api/dto/mod.rs
pub mod download_dto;
pub mod payment_dto;
