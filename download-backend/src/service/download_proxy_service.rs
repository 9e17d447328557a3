// src/service/download_proxy_service.rs

//! 上流ファイルの取得と配信
//!
//! 本文の先頭だけを読んでHTMLエラーページや空ファイルを弾き、
//! 残りはバッファせずにそのまま流す。

use crate::domain::download_error::{RedemptionError, TransferFailure, TransferFailureReason};
use crate::service::http_fetcher::{ByteStream, FetchError, FetchRequest, HttpFetcher};
use crate::utils::content_inspect::{
    filename_from_disposition, filename_from_url, is_html_content_type, is_text_content_type,
    looks_like_markup, DEFAULT_DOWNLOAD_NAME,
};
use axum::body::Bytes;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Content-Type がHTML/テキストの場合に確認する先頭バイト数
pub const MARKUP_CHECK_PREFIX: usize = 512;

/// それ以外の応答でも念のため確認する先頭バイト数
pub const SNIFF_PREFIX: usize = 100;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// 配信可能と判定された上流レスポンス
pub struct DownloadPayload {
    pub file_name: String,
    pub content_type: String,
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

impl std::fmt::Debug for DownloadPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadPayload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

pub struct DownloadProxyService {
    fetcher: Arc<dyn HttpFetcher>,
    timeout: Duration,
}

impl DownloadProxyService {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    /// 上流からファイルを取得し、配信前の検査を通ったものを返す
    pub async fn fetch(&self, url: &str) -> Result<DownloadPayload, RedemptionError> {
        let response = self
            .fetcher
            .fetch(FetchRequest::get(url, self.timeout))
            .await
            .map_err(transfer_failure)?;

        info!(
            status = response.status,
            final_url = %response.final_url,
            "Upstream file response received"
        );

        if !response.is_success() {
            return Err(RedemptionError::TransferFailed(TransferFailure::new(
                TransferFailureReason::from_status(response.status),
                format!("Upstream responded with HTTP {}", response.status),
            )));
        }

        let content_length = response.content_length();
        if content_length == Some(0) {
            return Err(RedemptionError::EmptyFile);
        }

        let content_type = response
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let file_name = response
            .content_disposition()
            .and_then(filename_from_disposition)
            .or_else(|| filename_from_url(&response.final_url))
            .or_else(|| filename_from_url(url))
            .unwrap_or_else(|| DEFAULT_DOWNLOAD_NAME.to_string());

        let declared_html = is_html_content_type(&content_type);
        let declared_text = is_text_content_type(&content_type);
        let limit = if declared_html || declared_text {
            MARKUP_CHECK_PREFIX
        } else {
            SNIFF_PREFIX
        };

        let mut body = response.body;
        let mut head: Vec<Bytes> = Vec::new();
        let mut head_len = 0usize;
        while head_len < limit {
            match body.next().await {
                Some(Ok(chunk)) => {
                    head_len += chunk.len();
                    if !chunk.is_empty() {
                        head.push(chunk);
                    }
                }
                Some(Err(err)) => return Err(transfer_failure(err)),
                None => break,
            }
        }

        if head_len == 0 {
            return Err(RedemptionError::EmptyFile);
        }

        let prefix: Vec<u8> = head
            .iter()
            .flat_map(|chunk| chunk.iter().copied())
            .take(limit)
            .collect();
        let is_markup = looks_like_markup(&prefix);

        if declared_html || is_markup {
            warn!(
                content_type = %content_type,
                prefix = %String::from_utf8_lossy(&prefix),
                "Upstream returned an HTML page instead of a file"
            );
            return Err(RedemptionError::UnexpectedHtmlResponse);
        }

        info!(
            file_name = %file_name,
            content_type = %content_type,
            content_length = ?content_length,
            "Streaming upstream file"
        );

        let body = stream::iter(head.into_iter().map(Ok::<Bytes, FetchError>))
            .chain(body)
            .inspect_err(|err| error!(error = %err, "Upstream stream failed mid-transfer"))
            .boxed();

        Ok(DownloadPayload {
            file_name,
            content_type,
            content_length,
            body,
        })
    }
}

fn transfer_failure(err: FetchError) -> RedemptionError {
    let reason = match &err {
        FetchError::Timeout => TransferFailureReason::Timeout,
        FetchError::Connect(_) => TransferFailureReason::Connect,
        FetchError::Other(_) => TransferFailureReason::Unknown,
    };
    RedemptionError::TransferFailed(TransferFailure::new(reason, err.to_string()))
}
