// src/api/dto/download_dto.rs
use crate::domain::converted_link::ConvertedLink;
use crate::domain::validation_result::{FileInfo, ValidationResult};
use crate::service::download_token_service::GeneratedDownload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// --- Request DTOs ---

/// 欠けたフィールドも400として返せるように既定値で受ける
#[derive(Deserialize, Serialize, Debug, Default, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateDownloadRequest {
    #[validate(length(min = 1, message = "resourceId is required"))]
    pub resource_id: String,

    #[validate(email(message = "ownerEmail must be a valid email address"))]
    pub owner_email: String,

    #[validate(length(min = 1, message = "transactionId is required"))]
    pub transaction_id: String,
}

/// URLを1つ受け取るリクエスト（検査・変換・ファイル情報で共用）
#[derive(Deserialize, Serialize, Debug, Default, Validate)]
#[serde(default)]
pub struct UrlRequest {
    #[validate(length(min = 1, message = "url is required"))]
    pub url: String,
}

// --- Response DTOs ---

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDownloadResponse {
    pub success: bool,
    pub download_url: String,
    pub max_downloads: i32,
    pub remaining_downloads: i32,
    pub expires_at: DateTime<Utc>,
    pub reused: bool,
}

impl From<GeneratedDownload> for GenerateDownloadResponse {
    fn from(generated: GeneratedDownload) -> Self {
        Self {
            success: true,
            download_url: generated.download_url,
            max_downloads: generated.max_downloads,
            remaining_downloads: generated.remaining_downloads,
            expires_at: generated.expires_at,
            reused: generated.reused,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProbeLinkResponse {
    pub success: bool,
    pub result: ValidationResult,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FileInfoResponse {
    pub success: bool,
    #[serde(flatten)]
    pub info: FileInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConvertLinkResponse {
    pub success: bool,
    pub result: ConvertedLink,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SampleConversionsResponse {
    pub success: bool,
    pub results: Vec<ConvertedLink>,
}
