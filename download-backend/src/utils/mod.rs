// src/utils/mod.rs
pub mod content_inspect;
pub mod error_helper;
pub mod link_converter;
pub mod token;
