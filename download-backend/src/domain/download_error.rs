// src/domain/download_error.rs

//! ダウンロード配信パイプラインの失敗分類
//!
//! 発行時の失敗（`GenerationError`）は同期的に呼び出し元へ返し、
//! 引き換え時の失敗（`RedemptionError`）は種類付きのエラーページへ
//! リダイレクトする。

use serde::Serialize;
use thiserror::Error;

/// トークン発行時の失敗
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Download link is not available for this resource")]
    LinkUnavailable,

    #[error("Resource is not available for download at the moment")]
    ResourceInactive,

    #[error("Download link is invalid or unsupported")]
    InvalidLink,

    #[error("Token store error: {0}")]
    Store(String),
}

/// 上流からの転送失敗の細分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferFailureReason {
    NotFound,
    Forbidden,
    Timeout,
    Connect,
    Unknown,
}

impl TransferFailureReason {
    /// HTTP ステータスから分類
    pub fn from_status(status: u16) -> Self {
        match status {
            404 | 410 => Self::NotFound,
            401 | 403 => Self::Forbidden,
            408 | 504 => Self::Timeout,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFailure {
    pub reason: TransferFailureReason,
    pub detail: String,
}

impl TransferFailure {
    pub fn new(reason: TransferFailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }

    /// 利用者向けメッセージ
    pub fn user_message(&self) -> String {
        match self.reason {
            TransferFailureReason::NotFound => "The file was not found".to_string(),
            TransferFailureReason::Forbidden => "Access to the file is not allowed".to_string(),
            TransferFailureReason::Timeout => {
                "The download timed out - the file may be too large".to_string()
            }
            TransferFailureReason::Connect => "Could not connect to the file host".to_string(),
            TransferFailureReason::Unknown => format!("Failed to download the file: {}", self.detail),
        }
    }
}

impl std::fmt::Display for TransferFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.detail, self.reason.as_str())
    }
}

/// トークン引き換え時の失敗
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RedemptionError {
    #[error("Download link is invalid or has expired")]
    InvalidToken,

    #[error("The allowed number of downloads has been used up")]
    QuotaExhausted,

    #[error("Transfer failed: {0}")]
    TransferFailed(TransferFailure),

    #[error("The server returned an HTML page instead of the requested file")]
    UnexpectedHtmlResponse,

    #[error("The file is empty or invalid")]
    EmptyFile,

    #[error("Token store error: {0}")]
    Store(String),
}

/// エラーページへのリダイレクト種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectType {
    Invalid,
    MaxDownloads,
    DownloadFailed,
}

impl RedirectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::MaxDownloads => "max_downloads",
            Self::DownloadFailed => "download_failed",
        }
    }
}

impl RedemptionError {
    pub fn redirect_type(&self) -> RedirectType {
        match self {
            Self::InvalidToken => RedirectType::Invalid,
            Self::QuotaExhausted => RedirectType::MaxDownloads,
            Self::TransferFailed(_)
            | Self::UnexpectedHtmlResponse
            | Self::EmptyFile
            | Self::Store(_) => RedirectType::DownloadFailed,
        }
    }

    /// エラーページに表示するメッセージ
    pub fn user_message(&self) -> String {
        match self {
            Self::TransferFailed(failure) => failure.user_message(),
            Self::Store(_) => "Failed to download the file".to_string(),
            other => other.to_string(),
        }
    }

    /// 1バイトも送出する前に検出された転送失敗か
    pub fn is_pre_stream_transfer_failure(&self) -> bool {
        matches!(
            self,
            Self::TransferFailed(_) | Self::UnexpectedHtmlResponse | Self::EmptyFile
        )
    }
}
