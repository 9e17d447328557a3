// src/utils/content_inspect.rs

//! レスポンスヘッダー・本文の先頭から配信可否を判定するヘルパー

use crate::domain::validation_result::FileInfo;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// ファイル名が分からない場合の既定値（ファイル情報API用）
pub const DEFAULT_FILE_NAME: &str = "game-download";

/// 配信時にファイル名が分からない場合の既定値
pub const DEFAULT_DOWNLOAD_NAME: &str = "download";

/// ダウンロード可能とみなす Content-Type（部分一致）
const DOWNLOADABLE_CONTENT_TYPES: &[&str] = &[
    // 実行ファイル・インストーラ
    "application/x-executable",
    "application/x-msdownload",
    "application/x-msi",
    "application/x-msdos-program",
    "application/octet-stream",
    // アーカイブ
    "application/zip",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
    "application/x-gzip",
    "application/x-bzip2",
    "application/x-tar",
    // メディア
    "video/",
    "audio/",
    "image/",
    // ドキュメント
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    // モバイルアプリ
    "application/vnd.android.package-archive",
    "application/x-ipad-app",
];

static HTML_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>([^<]*)</title>").expect("Invalid title regex"));

pub fn is_downloadable_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    DOWNLOADABLE_CONTENT_TYPES
        .iter()
        .any(|allowed| content_type.contains(allowed))
}

pub fn is_html_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("text/html")
}

pub fn is_text_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("text/plain")
}

/// 先頭バイトがHTML文書に見えるか
pub fn looks_like_markup(prefix: &[u8]) -> bool {
    let text = String::from_utf8_lossy(prefix).to_ascii_lowercase();
    text.contains("<!doctype") || text.contains("<html")
}

/// Content-Disposition からファイル名を取り出す。`filename*` を優先
pub fn filename_from_disposition(disposition: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in disposition.split(';').map(str::trim) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        if key == "filename*" {
            // RFC 5987: charset'lang'percent-encoded
            let encoded = value.rsplit('\'').next().unwrap_or(value);
            extended = urlencoding::decode(encoded.trim_matches('"'))
                .ok()
                .map(|decoded| decoded.into_owned());
        } else if key == "filename" {
            plain = Some(value.replace(['"', '\''], ""));
        }
    }

    extended.or(plain).filter(|name| !name.trim().is_empty())
}

/// URLの最終パスセグメントがファイル名らしければ返す
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    if last.is_empty() || !last.contains('.') {
        return None;
    }
    Some(
        urlencoding::decode(last)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| last.to_string()),
    )
}

/// HTMLの <title> を取り出す
pub fn extract_html_title(html: &str) -> Option<String> {
    HTML_TITLE
        .captures(html)
        .map(|caps| caps[1].trim().to_string())
        .filter(|title| !title.is_empty())
}

/// ページ本文にエラーらしい文言が含まれるか
pub fn contains_error_markers(text: &str) -> bool {
    let lower = text.to_lowercase();
    ["error", "not found", "404"]
        .iter()
        .any(|marker| lower.contains(marker))
}

/// ファイル名を名前と拡張子に分割（先頭のドットは拡張子とみなさない）
pub fn file_info_from_name(name: Option<&str>) -> FileInfo {
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    match name {
        Some(name) => match name.rfind('.') {
            Some(idx) if idx > 0 => FileInfo {
                file_name: name[..idx].to_string(),
                file_extension: name[idx + 1..].to_string(),
                file_size: None,
            },
            _ => FileInfo {
                file_name: name.to_string(),
                file_extension: String::new(),
                file_size: None,
            },
        },
        None => FileInfo {
            file_name: DEFAULT_FILE_NAME.to_string(),
            file_extension: String::new(),
            file_size: None,
        },
    }
}

/// Content-Disposition ヘッダーに埋め込めるようにファイル名を整える
pub fn sanitize_header_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        DEFAULT_DOWNLOAD_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}
