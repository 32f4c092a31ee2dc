//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method/path dispatch between the
//! document API and the static file responder, body size checks and access
//! logging.

use crate::api;
use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use hyper::body::{Body, Bytes};
use hyper::header::{
    HeaderName, HeaderValue, CONTENT_LENGTH, IF_NONE_MATCH, REFERER, SERVER, USER_AGENT,
};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// The one path owned by the shared document store
pub const API_DATA_PATH: &str = "/api/data";

/// Request context encapsulating information needed for static file serving
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let access_log = state.cached_access_log.load(Ordering::Relaxed);
    let mut entry = access_log.then(|| access_log_entry(&req, remote_addr));

    let mut response = route_request(req, &state).await;

    if let Ok(server_name) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server_name);
    }

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = body_bytes(&response);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Dispatch by method and path
async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<ResponseBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let is_api = req.uri().path() == API_DATA_PATH;

    match (&method, is_api) {
        // Preflight is answered the same way for every path
        (&Method::OPTIONS, _) => http::build_preflight_response(),
        (&Method::GET, true) => api::handle_data_get(state).await,
        (&Method::POST, true) => {
            if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
                return resp;
            }
            api::handle_data_post(req, state).await
        }
        (&Method::GET | &Method::HEAD, _) => {
            let ctx = RequestContext {
                path: req.uri().path(),
                query: req.uri().query(),
                is_head: method == Method::HEAD,
                if_none_match: req
                    .headers()
                    .get(IF_NONE_MATCH)
                    .and_then(|v| v.to_str().ok())
                    .map(ToString::to_string),
            };
            static_files::serve(
                &ctx,
                &state.config.storage.root,
                &state.config.http.index_files,
            )
            .await
        }
        (&Method::POST, false) => http::build_404_response(),
        (other, _) => {
            logger::log_warning(&format!("Method not allowed: {other}"));
            http::build_405_response()
        }
    }
}

/// Reject a declared Content-Length above the limit before reading the body
///
/// Answered like every other failed save: a generic 500.
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<ResponseBody>> {
    let content_length = req.headers().get(CONTENT_LENGTH)?;
    match content_length.to_str().ok()?.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_api_error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_500_response())
        }
        _ => None,
    }
}

/// Size of the response body for the access log
///
/// HEAD responses carry an empty body but keep the file's Content-Length.
fn body_bytes(response: &Response<ResponseBody>) -> usize {
    let from_body = Body::size_hint(response.body())
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    if from_body > 0 {
        return from_body;
    }
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn access_log_entry<B>(req: &Request<B>, remote_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        remote_addr.to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        hyper::Version::HTTP_10 => "1.0".to_string(),
        _ => "1.1".to_string(),
    };
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry
}
