//! Content types and data URLs.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Content type for a file name or URL path, by extension.
pub fn content_type(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "js" | "mjs" | "cjs" => "application/javascript",
        "json" | "map" => "application/json",
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "txt" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}

/// `data:` URL embedding `bytes`.
pub fn data_url(path: &str, bytes: &[u8]) -> String {
    let mime = content_type(path);
    let mime = mime.split(';').next().unwrap_or(mime);
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
