// src/utils/token.rs

use rand::RngCore;

/// ダウンロードトークンのバイト長（256bit）
pub const DOWNLOAD_TOKEN_BYTES: usize = 32;

/// 暗号学的に安全な乱数からダウンロードトークンを生成（16進64文字）
pub fn generate_download_token() -> String {
    let mut bytes = [0u8; DOWNLOAD_TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// ログ出力用にトークンの先頭だけを返す
pub fn token_prefix(token: &str) -> &str {
    match token.char_indices().nth(8) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}
