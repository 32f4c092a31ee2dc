//! Static file serving module
//!
//! Resolves request paths against the serving root and returns file bytes.
//! Directories serve their index file; there is no directory listing.

use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Outcome of resolving a request path against the serving root
#[derive(Debug, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    /// Directory requested without trailing slash
    Redirect(String),
    NotFound,
}

/// Serve a file from the serving root
pub async fn serve(
    ctx: &RequestContext<'_>,
    root: &str,
    index_files: &[String],
) -> Response<Full<Bytes>> {
    let file_path = match resolve(root, ctx.path, index_files).await {
        Resolved::File(p) => p,
        Resolved::Redirect(target) => {
            let location = match ctx.query {
                Some(q) => format!("{target}?{q}"),
                None => target,
            };
            return http::build_redirect_response(&location);
        }
        Resolved::NotFound => return http::build_404_response(),
    };

    let content = match fs::read(&file_path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_path.display()
            ));
            return http::build_404_response();
        }
    };

    let etag = cache::generate_etag(&content);
    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag);
    }

    http::response::build_file_response(
        Bytes::from(content),
        mime::content_type_for(&file_path),
        &etag,
        ctx.is_head,
    )
}

/// Map a URL path to a file under `root`
///
/// The path is percent-decoded and canonicalized; anything that ends up
/// outside the canonical root is refused.
pub async fn resolve(root: &str, path: &str, index_files: &[String]) -> Resolved {
    let Some(decoded) = percent_decode(path) else {
        return Resolved::NotFound;
    };
    let relative = decoded.trim_start_matches('/');

    let root_canonical = match fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Serving root not found or inaccessible '{root}': {e}"
            ));
            return Resolved::NotFound;
        }
    };

    // File not found is common (404), no need to log at warning level
    let Ok(canonical) = fs::canonicalize(root_canonical.join(relative)).await else {
        return Resolved::NotFound;
    };
    if !canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {path} -> {}",
            canonical.display()
        ));
        return Resolved::NotFound;
    }

    let Ok(metadata) = fs::metadata(&canonical).await else {
        return Resolved::NotFound;
    };
    if !metadata.is_dir() {
        return Resolved::File(canonical);
    }

    if !path.ends_with('/') {
        return Resolved::Redirect(format!("{path}/"));
    }

    match find_index_file(&canonical, index_files).await {
        Some(index) => Resolved::File(index),
        None => Resolved::NotFound,
    }
}

/// Whether the serving root holds a page to answer `/` with
pub async fn has_index_page(root: &str, index_files: &[String]) -> bool {
    find_index_file(Path::new(root), index_files).await.is_some()
}

async fn find_index_file(dir: &Path, index_files: &[String]) -> Option<PathBuf> {
    for name in index_files {
        let candidate = dir.join(name);
        if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
            return Some(candidate);
        }
    }
    None
}

/// Decode `%XX` escapes; `None` for malformed escapes or non-UTF-8 results
fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).ok()
}
