// src/domain/converted_link.rs

use serde::{Deserialize, Serialize};

/// 共有リンクの提供元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkProvider {
    GoogleDrive,
    Dropbox,
    Unknown,
}

impl LinkProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoogleDrive => "google-drive",
            Self::Dropbox => "dropbox",
            Self::Unknown => "unknown",
        }
    }
}

/// 共有リンクを直接ダウンロードURLへ変換した結果（永続化しない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedLink {
    pub original_url: String,
    pub direct_url: String,
    pub provider: LinkProvider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub is_valid: bool,
}

impl ConvertedLink {
    /// 変換できなかった場合の結果。入力をそのまま返す
    pub fn unconverted(url: &str, provider: LinkProvider) -> Self {
        Self {
            original_url: url.to_string(),
            direct_url: url.to_string(),
            provider,
            file_name: None,
            is_valid: false,
        }
    }
}
