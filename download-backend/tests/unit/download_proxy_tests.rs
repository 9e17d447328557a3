// tests/unit/download_proxy_tests.rs
use axum::http::header;
use download_backend::domain::download_error::{RedemptionError, TransferFailureReason};
use download_backend::service::download_proxy_service::DownloadProxyService;
use download_backend::service::http_fetcher::FetchError;
use futures_util::TryStreamExt;
use std::sync::Arc;
use std::time::Duration;

use crate::common::mock_fetcher::ScriptedFetcher;

const FILE_URL: &str = "https://files.example.com/builds/game.zip";

fn proxy(fetcher: &ScriptedFetcher) -> DownloadProxyService {
    DownloadProxyService::new(Arc::new(fetcher.clone()), Duration::from_secs(5))
}

async fn collect(body: download_backend::service::http_fetcher::ByteStream) -> Vec<u8> {
    body.try_fold(Vec::new(), |mut acc, chunk| async move {
        acc.extend_from_slice(&chunk);
        Ok(acc)
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_prefix_chunks_are_replayed_in_order() {
    // 先頭判定に使ったチャンクも欠けずに配信される
    let fetcher = ScriptedFetcher::ok(
        "application/zip",
        &[b"PK\x03\x04", &[1u8; 60], &[2u8; 60], &[3u8; 500]],
    );

    let payload = proxy(&fetcher).fetch(FILE_URL).await.unwrap();
    assert_eq!(payload.file_name, "game.zip");
    assert_eq!(payload.content_type, "application/zip");

    let bytes = collect(payload.body).await;
    let mut expected = b"PK\x03\x04".to_vec();
    expected.extend([1u8; 60]);
    expected.extend([2u8; 60]);
    expected.extend([3u8; 500]);
    assert_eq!(bytes, expected);
}

#[tokio::test]
async fn test_markup_split_across_chunks_is_detected() {
    let fetcher = ScriptedFetcher::ok(
        "application/octet-stream",
        &[b"  <!DOC", b"TYPE html><html>", b"<body>Quota exceeded</body></html>"],
    );

    let err = proxy(&fetcher).fetch(FILE_URL).await.unwrap_err();
    assert_eq!(err, RedemptionError::UnexpectedHtmlResponse);
}

#[tokio::test]
async fn test_plain_text_file_is_delivered() {
    let fetcher = ScriptedFetcher::ok("text/plain", &[b"Installation notes"]);

    let payload = proxy(&fetcher).fetch("https://files.example.com/readme.txt").await.unwrap();
    assert_eq!(payload.file_name, "readme.txt");
    assert_eq!(collect(payload.body).await, b"Installation notes".to_vec());
}

#[tokio::test]
async fn test_declared_html_is_rejected_even_without_markup() {
    let fetcher = ScriptedFetcher::ok("text/html; charset=utf-8", &[b"just words"]);

    let err = proxy(&fetcher).fetch(FILE_URL).await.unwrap_err();
    assert_eq!(err, RedemptionError::UnexpectedHtmlResponse);
}

#[tokio::test]
async fn test_empty_bodies_are_rejected() {
    let declared_empty = ScriptedFetcher::ok("application/zip", &[b"PK"])
        .with_header(header::CONTENT_LENGTH, "0");
    assert_eq!(
        proxy(&declared_empty).fetch(FILE_URL).await.unwrap_err(),
        RedemptionError::EmptyFile
    );

    let no_bytes = ScriptedFetcher::ok("application/zip", &[b"", b""]);
    assert_eq!(
        proxy(&no_bytes).fetch(FILE_URL).await.unwrap_err(),
        RedemptionError::EmptyFile
    );
}

#[tokio::test]
async fn test_stream_error_inside_prefix_is_a_transfer_failure() {
    let fetcher = ScriptedFetcher::ok("application/zip", &[b"PK"])
        .with_stream_error(FetchError::Timeout);

    match proxy(&fetcher).fetch(FILE_URL).await.unwrap_err() {
        RedemptionError::TransferFailed(failure) => {
            assert_eq!(failure.reason, TransferFailureReason::Timeout)
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_errors_are_classified() {
    let refused = ScriptedFetcher::failing(FetchError::Connect("connection refused".to_string()));
    let err = proxy(&refused).fetch(FILE_URL).await.unwrap_err();
    assert!(err.is_pre_stream_transfer_failure());
    match err {
        RedemptionError::TransferFailed(failure) => {
            assert_eq!(failure.reason, TransferFailureReason::Connect)
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let gone = ScriptedFetcher::status(410);
    match proxy(&gone).fetch(FILE_URL).await.unwrap_err() {
        RedemptionError::TransferFailed(failure) => {
            assert_eq!(failure.reason, TransferFailureReason::NotFound);
            assert_eq!(failure.user_message(), "The file was not found");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_disposition_name_wins_over_url() {
    let fetcher = ScriptedFetcher::ok("application/x-rar-compressed", &[b"Rar!\x1a\x07"])
        .with_header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"fallback.rar\"; filename*=UTF-8''%E3%82%B2%E3%83%BC%E3%83%A0.rar",
        );

    let payload = proxy(&fetcher).fetch(FILE_URL).await.unwrap();
    assert_eq!(payload.file_name, "ゲーム.rar");
    assert_eq!(fetcher.calls(), 1);
}
