//! HTTP response building module
//!
//! Builders for every response the server sends. All of them carry the
//! permissive `Access-Control-Allow-Origin` header so the board page can be
//! opened from any origin on the network.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ETAG, LOCATION,
};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};

use super::cache::NO_CACHE;

/// Body type of every response
pub type ResponseBody = Full<Bytes>;

/// Methods advertised by preflight responses
pub const CORS_ALLOW_METHODS: &str = "GET, POST, OPTIONS";
/// Request headers advertised by preflight responses
pub const CORS_ALLOW_HEADERS: &str = "Content-Type";
/// Methods the server understands at all
pub const ALLOWED_METHODS: &str = "GET, HEAD, POST, OPTIONS";

const INTERNAL_ERROR_BODY: &str = r#"{"success":false,"error":"Internal Server Error"}"#;

fn builder(status: StatusCode) -> Builder {
    Response::builder()
        .status(status)
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
}

/// Finish a builder, falling back to a bare response if a header was invalid
fn finish(builder: Builder, body: Bytes, label: &str) -> Response<ResponseBody> {
    let fallback = body.clone();
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error(label, &e);
        Response::new(Full::new(fallback))
    })
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str) -> Response<ResponseBody> {
    finish(
        builder(StatusCode::NOT_MODIFIED)
            .header(ETAG, etag)
            .header(CACHE_CONTROL, NO_CACHE),
        Bytes::new(),
        "304",
    )
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    finish(
        builder(StatusCode::NOT_FOUND).header(CONTENT_TYPE, "text/plain"),
        Bytes::from_static(b"404 Not Found"),
        "404",
    )
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    finish(
        builder(StatusCode::METHOD_NOT_ALLOWED)
            .header(CONTENT_TYPE, "text/plain")
            .header(ALLOW, ALLOWED_METHODS),
        Bytes::from_static(b"405 Method Not Allowed"),
        "405",
    )
}

/// Build the generic 500 response
///
/// The body never carries error details; those go to the error log.
pub fn build_500_response() -> Response<ResponseBody> {
    finish(
        builder(StatusCode::INTERNAL_SERVER_ERROR).header(CONTENT_TYPE, "application/json"),
        Bytes::from_static(INTERNAL_ERROR_BODY.as_bytes()),
        "500",
    )
}

/// Build CORS preflight response (200, empty body)
pub fn build_preflight_response() -> Response<ResponseBody> {
    finish(
        builder(StatusCode::OK)
            .header(ACCESS_CONTROL_ALLOW_METHODS, CORS_ALLOW_METHODS)
            .header(ACCESS_CONTROL_ALLOW_HEADERS, CORS_ALLOW_HEADERS)
            .header(CONTENT_LENGTH, 0),
        Bytes::new(),
        "OPTIONS",
    )
}

/// Build 301 redirect response
pub fn build_redirect_response(target: &str) -> Response<ResponseBody> {
    finish(
        builder(StatusCode::MOVED_PERMANENTLY)
            .header(LOCATION, target)
            .header(CONTENT_TYPE, "text/plain"),
        Bytes::from_static(b"Redirecting..."),
        "301",
    )
}

/// Build 200 response for a static file
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    is_head: bool,
) -> Response<ResponseBody> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    finish(
        builder(StatusCode::OK)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, content_length)
            .header(ETAG, etag)
            .header(CACHE_CONTROL, NO_CACHE),
        body,
        "200",
    )
}

/// Build JSON response from an already serialized body
pub fn build_json_response(
    status: StatusCode,
    body: Bytes,
    no_cache: bool,
) -> Response<ResponseBody> {
    let mut builder = builder(status).header(CONTENT_TYPE, "application/json");
    if no_cache {
        builder = builder.header(CACHE_CONTROL, NO_CACHE);
    }
    finish(builder, body, status.as_str())
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preflight_headers() {
        let resp = build_preflight_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    }

    #[test]
    fn test_head_file_response_keeps_length() {
        let resp = build_file_response(Bytes::from_static(b"hello"), "text/plain", "\"1\"", true);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "5");
        assert_eq!(resp.headers()[ETAG], "\"1\"");
    }

    #[test]
    fn test_error_responses_allow_any_origin() {
        for resp in [
            build_404_response(),
            build_405_response(),
            build_500_response(),
        ] {
            assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        }
        assert_eq!(build_405_response().headers()[ALLOW], ALLOWED_METHODS);
    }
}
