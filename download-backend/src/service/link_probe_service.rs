// src/service/link_probe_service.rs

//! ダウンロードURLの事前チェック
//!
//! HEAD（必要に応じてGET）でリモートの応答を調べ、配信できるファイルかを判定する。
//! ネットワーク障害を含むすべての失敗は `ValidationResult.issues` に積み、
//! エラーとしては返さない。

use crate::config::DownloadConfig;
use crate::domain::validation_result::{FileInfo, ValidationResult};
use crate::service::http_fetcher::{FetchError, FetchRequest, FetchResponse, HttpFetcher};
use crate::utils::content_inspect::{
    contains_error_markers, extract_html_title, file_info_from_name, filename_from_disposition,
    filename_from_url, is_downloadable_content_type, is_html_content_type,
};
use crate::utils::link_converter::{convert_to_direct_link, is_valid_url};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// HTMLページ診断のために読む本文の上限
const HTML_DIAGNOSTIC_LIMIT: usize = 64 * 1024;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub struct LinkProbeService {
    fetcher: Arc<dyn HttpFetcher>,
    timeout: Duration,
    large_file_threshold: u64,
}

impl LinkProbeService {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, config: &DownloadConfig) -> Self {
        Self {
            fetcher,
            timeout: config.probe_timeout,
            large_file_threshold: config.large_file_threshold,
        }
    }

    /// URLを検査して結果を返す。失敗しても必ず結果を返す
    pub async fn probe(&self, url: &str) -> ValidationResult {
        let mut result = ValidationResult::default();

        if !is_valid_url(url) {
            result.add_issue("Invalid URL format");
            result.recommend("Provide a complete http:// or https:// link");
            return result;
        }

        let response = match self.fetcher.fetch(FetchRequest::head(url, self.timeout)).await {
            Ok(response) => response,
            Err(err) => {
                warn!(url = %url, error = %err, "Link probe request failed");
                record_network_failure(&mut result, &err);
                return result;
            }
        };

        debug!(url = %url, status = response.status, "Link probe HEAD response");

        if !response.is_success() {
            record_status_failure(&mut result, response.status);
            return result;
        }

        let content_type = response.content_type().unwrap_or_default().to_string();
        result.content_type = content_type.clone();
        result.file_size = response.content_length().unwrap_or(0);
        result.file_name = response
            .content_disposition()
            .and_then(filename_from_disposition)
            .or_else(|| filename_from_url(&response.final_url))
            .or_else(|| filename_from_url(url))
            .unwrap_or_default();

        let is_html = is_html_content_type(&content_type);
        if is_html {
            result.add_issue("The server returns an HTML page instead of the file");
            result.recommend("Verify that the link is correct");
            result.recommend("Make sure the file does not require authentication");
            result.recommend("Try opening the link in a browser first");
        } else if is_downloadable_content_type(&content_type) {
            result.mark_downloadable();
        } else {
            result.add_issue(format!("Unsupported content type: {}", content_type));
            result.recommend("Make sure the link points to a downloadable file");
        }

        if self.large_file_threshold > 0 && result.file_size > self.large_file_threshold {
            let size_mb = result.file_size as f64 / BYTES_PER_MB;
            result.add_issue(format!("The file is very large ({:.2} MB)", size_mb));
            result.recommend("Consider splitting the file or using another hosting service");
        }

        if response.redirected {
            result.add_issue("The link was redirected");
            result.recommend(format!(
                "Use the final URL directly: {}",
                response.final_url
            ));
        }

        if is_html {
            self.diagnose_html_page(url, &mut result).await;
        }

        info!(
            url = %url,
            is_valid = result.is_valid,
            is_downloadable = result.is_downloadable,
            issue_count = result.issues.len(),
            "Link probe completed"
        );

        result
    }

    /// URLのファイル名と拡張子を取得
    pub async fn file_info(&self, url: &str) -> FileInfo {
        let converted = convert_to_direct_link(url);
        let mut disposition_name = None;
        let mut file_size = None;

        if is_valid_url(&converted.direct_url) {
            match self
                .fetcher
                .fetch(FetchRequest::head(&converted.direct_url, self.timeout))
                .await
            {
                Ok(response) if response.is_success() => {
                    disposition_name = response
                        .content_disposition()
                        .and_then(filename_from_disposition);
                    file_size = response.content_length().filter(|size| *size > 0);
                }
                Ok(response) => {
                    debug!(url = %url, status = response.status, "File info HEAD was not successful");
                }
                Err(err) => {
                    warn!(url = %url, error = %err, "File info request failed");
                }
            }
        }

        let name = disposition_name.or(converted.file_name);
        let mut info = file_info_from_name(name.as_deref());
        info.file_size = file_size;
        info
    }

    /// HTMLが返ってきた場合に本文を読んで診断を補う（失敗は無視）
    async fn diagnose_html_page(&self, url: &str, result: &mut ValidationResult) {
        let response = match self.fetcher.fetch(FetchRequest::get(url, self.timeout)).await {
            Ok(response) if response.is_success() => response,
            Ok(_) => return,
            Err(err) => {
                debug!(url = %url, error = %err, "HTML diagnostic request failed");
                return;
            }
        };

        let text = match read_diagnostic_text(response).await {
            Some(text) => text,
            None => return,
        };

        if contains_error_markers(&text) {
            result.add_issue("Error messages were detected in the page");
        }
        if let Some(title) = extract_html_title(&text) {
            result.add_issue(format!("HTML page title: {}", title));
        }
    }
}

async fn read_diagnostic_text(response: FetchResponse) -> Option<String> {
    match response.read_text(HTML_DIAGNOSTIC_LIMIT).await {
        Ok(text) => Some(text),
        Err(err) => {
            debug!(error = %err, "Failed to read HTML diagnostic body");
            None
        }
    }
}

fn record_status_failure(result: &mut ValidationResult, status: u16) {
    let issue = match status {
        404 => format!("Server error: HTTP {} (file not found)", status),
        401 | 403 => format!("Server error: HTTP {} (requires authentication)", status),
        _ => format!("Server error: HTTP {}", status),
    };
    result.add_issue(issue);
    match status {
        404 => result.recommend("The file was not found - check the link"),
        403 => result.recommend("Access denied - the file may require authentication"),
        401 => result.recommend("Authentication required - use a public link"),
        _ => {}
    }
}

fn record_network_failure(result: &mut ValidationResult, err: &FetchError) {
    match err {
        FetchError::Timeout => {
            result.add_issue("The request timed out");
            result.recommend("Check the connection speed or the file size");
        }
        FetchError::Connect(_) => {
            result.add_issue("Failed to connect to the server");
            result.recommend("Verify that the link is correct");
            result.recommend("Make sure the server is reachable");
        }
        FetchError::Other(message) => {
            result.add_issue(format!("Connection error: {}", message));
        }
    }
}
