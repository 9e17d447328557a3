// src/utils/link_converter.rs

//! 共有リンク（Google Drive / Dropbox）を直接ダウンロードURLへ変換する
//!
//! どの入力に対してもパニックせず、必ず `ConvertedLink` を返す。
//! 既知の提供元以外のURLはそのまま直接リンクとして扱う。

use crate::domain::converted_link::{ConvertedLink, LinkProvider};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

const GOOGLE_DRIVE_HOST: &str = "drive.google.com";
const DROPBOX_HOST: &str = "dropbox.com";
const DROPBOX_DIRECT_BASE: &str = "https://dl.dropboxusercontent.com/s/";

static DRIVE_UC_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/uc\?id=([^&#]+)").expect("valid drive uc regex"));
static DROPBOX_SH_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/sh/(.+)").expect("valid dropbox sh regex"));
static DROPBOX_S_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/s/(.+)").expect("valid dropbox s regex"));

/// 共有リンクを直接ダウンロードURLへ変換
pub fn convert_to_direct_link(raw_url: &str) -> ConvertedLink {
    let url = raw_url.trim();
    if url.is_empty() {
        return ConvertedLink::unconverted(raw_url, LinkProvider::Unknown);
    }

    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => {
            let mut link = ConvertedLink::unconverted(url, guess_provider(url));
            link.original_url = raw_url.to_string();
            return link;
        }
    };

    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    let mut link = if host.ends_with(GOOGLE_DRIVE_HOST) {
        convert_google_drive(url, &parsed)
    } else if host == DROPBOX_HOST || host.ends_with(".dropbox.com") {
        convert_dropbox(url, &parsed)
    } else {
        ConvertedLink {
            original_url: url.to_string(),
            direct_url: url.to_string(),
            provider: LinkProvider::Unknown,
            file_name: None,
            is_valid: true,
        }
    };
    link.original_url = raw_url.to_string();
    link
}

/// http/https の絶対URLか
pub fn is_valid_url(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some())
        .unwrap_or(false)
}

/// 動作確認用のサンプル変換
pub fn sample_conversions() -> Vec<ConvertedLink> {
    [
        "https://drive.google.com/file/d/1ABC123xyz/view?usp=sharing",
        "https://drive.google.com/open?id=1ABC123xyz",
        "https://www.dropbox.com/s/abc123/game.zip?dl=0",
        "https://www.dropbox.com/sh/xyz789/folder/game.rar?dl=0",
        "https://example.com/files/game.zip",
    ]
    .iter()
    .map(|url| convert_to_direct_link(url))
    .collect()
}

fn guess_provider(url: &str) -> LinkProvider {
    let lower = url.to_ascii_lowercase();
    if lower.contains(GOOGLE_DRIVE_HOST) {
        LinkProvider::GoogleDrive
    } else if lower.contains(DROPBOX_HOST) {
        LinkProvider::Dropbox
    } else {
        LinkProvider::Unknown
    }
}

fn convert_google_drive(url: &str, parsed: &Url) -> ConvertedLink {
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    // /file/d/{id}/... の形式
    let from_path = segments
        .windows(3)
        .find(|w| w[0] == "file" && w[1] == "d")
        .map(|w| w[2].to_string());

    let file_id = from_path
        .or_else(|| {
            parsed
                .query_pairs()
                .find(|(key, value)| key == "id" && !value.is_empty())
                .map(|(_, value)| value.into_owned())
        })
        .or_else(|| DRIVE_UC_ID.captures(url).map(|caps| caps[1].to_string()));

    let Some(file_id) = file_id else {
        return ConvertedLink::unconverted(url, LinkProvider::GoogleDrive);
    };

    let file_name = segments
        .iter()
        .position(|s| *s == "d")
        .and_then(|idx| segments.get(idx + 2))
        .filter(|s| !matches!(**s, "view" | "edit" | "preview"))
        .map(|s| decode_segment(s));

    ConvertedLink {
        original_url: url.to_string(),
        direct_url: format!(
            "https://{}/uc?export=download&id={}",
            GOOGLE_DRIVE_HOST, file_id
        ),
        provider: LinkProvider::GoogleDrive,
        file_name,
        is_valid: true,
    }
}

fn convert_dropbox(url: &str, parsed: &Url) -> ConvertedLink {
    let path = parsed.path();
    let rest = DROPBOX_SH_PATH
        .captures(path)
        .or_else(|| DROPBOX_S_PATH.captures(path))
        .map(|caps| caps[1].to_string());

    let Some(rest) = rest else {
        return ConvertedLink::unconverted(url, LinkProvider::Dropbox);
    };

    let file_name = rest
        .rsplit('/')
        .find(|s| !s.is_empty())
        .map(decode_segment);

    ConvertedLink {
        original_url: url.to_string(),
        direct_url: format!("{}{}", DROPBOX_DIRECT_BASE, rest),
        provider: LinkProvider::Dropbox,
        file_name,
        is_valid: true,
    }
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}
