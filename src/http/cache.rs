//! HTTP cache validation module
//!
//! Provides `ETag` generation and conditional request handling.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// `Cache-Control` value for everything this server returns.
/// Clients always revalidate, so edits to the board or its assets show up on reload.
pub const NO_CACHE: &str = "no-cache";

/// Generate `ETag` using fast hashing
///
/// # Returns
/// Quoted `ETag` string, e.g., `"abc123def"`
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports a single tag, a comma-separated list, weak tags (`W/"..."`) and `*`.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').map(str::trim).any(|e| {
            e == "*" || e == etag || e.strip_prefix("W/").is_some_and(|weak| weak == etag)
        })
    })
}
