// src/domain/validation_result.rs

use serde::{Deserialize, Serialize};

/// リンク事前チェックの結果
///
/// プローブは例外を投げず、失敗はすべて `issues` に積まれる。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub is_downloadable: bool,
    pub content_type: String,
    pub file_size: u64,
    pub file_name: String,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl ValidationResult {
    pub fn add_issue(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }

    pub fn recommend(&mut self, recommendation: impl Into<String>) {
        self.recommendations.push(recommendation.into());
    }

    /// ダウンロード可能と判定
    pub fn mark_downloadable(&mut self) {
        self.is_downloadable = true;
        self.is_valid = true;
    }
}

/// ファイル名と拡張子
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub file_name: String,
    pub file_extension: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}
