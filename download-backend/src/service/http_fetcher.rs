// src/service/http_fetcher.rs

//! 外部ファイルホストへのHTTPアクセス
//!
//! サービス層はこのトレイト越しにだけ外部へ出るため、テストでは
//! 任意の応答を返す実装に差し替えられる。

use crate::error::AppResult;
use crate::utils::error_helper::internal_server_error;
use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue};
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// ブラウザ以外のUser-Agentを拒否するホストがあるため実ブラウザを名乗る
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const MAX_REDIRECTS: usize = 10;

pub type ByteStream = BoxStream<'static, Result<Bytes, FetchError>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else {
            FetchError::Other(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    Head,
    Get,
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: FetchMethod,
    pub url: String,
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn head(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: FetchMethod::Head,
            url: url.into(),
            timeout,
        }
    }

    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: FetchMethod::Get,
            url: url.into(),
            timeout,
        }
    }
}

pub struct FetchResponse {
    pub status: u16,
    /// リダイレクト追従後のURL
    pub final_url: String,
    pub redirected: bool,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE)
    }

    pub fn content_length(&self) -> Option<u64> {
        self.header(header::CONTENT_LENGTH)
            .and_then(|v| v.trim().parse().ok())
    }

    pub fn content_disposition(&self) -> Option<&str> {
        self.header(header::CONTENT_DISPOSITION)
    }

    /// 本文を最大 `limit` バイトまで読み、文字列として返す
    pub async fn read_text(self, limit: usize) -> Result<String, FetchError> {
        let mut body = self.body;
        let mut buf: Vec<u8> = Vec::new();
        while buf.len() < limit {
            match body.next().await {
                Some(chunk) => buf.extend_from_slice(&chunk?),
                None => break,
            }
        }
        buf.truncate(limit);
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// reqwest による実装
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> AppResult<Self> {
        Self::from_builder(Self::client_builder())
    }

    /// ブラウザ相当のヘッダーとリダイレクト上限を設定したビルダー
    pub fn client_builder() -> reqwest::ClientBuilder {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9,ar;q=0.8"),
        );

        reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
    }

    pub fn from_builder(builder: reqwest::ClientBuilder) -> AppResult<Self> {
        let client = builder.build().map_err(|e| {
            internal_server_error(e, "http_fetcher::new", "Failed to build HTTP client")
        })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let builder = match request.method {
            FetchMethod::Head => self.client.head(&request.url),
            FetchMethod::Get => self.client.get(&request.url),
        };

        let response = builder.timeout(request.timeout).send().await?;

        let final_url = response.url().to_string();
        let redirected = Url::parse(&request.url)
            .map(|requested| &requested != response.url())
            .unwrap_or(false);
        let status = response.status().as_u16();
        let headers = response.headers().clone();

        let body: ByteStream = match request.method {
            FetchMethod::Head => stream::empty().boxed(),
            FetchMethod::Get => response
                .bytes_stream()
                .map(|chunk| chunk.map_err(FetchError::from))
                .boxed(),
        };

        Ok(FetchResponse {
            status,
            final_url,
            redirected,
            headers,
            body,
        })
    }
}
