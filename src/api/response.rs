// API response utility functions module

use crate::http::response::build_json_response;
use crate::http::{build_500_response, ResponseBody};
use crate::logger;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Acknowledgement returned after a successful save
#[derive(Debug, Serialize)]
pub struct SaveAck<'a> {
    pub success: bool,
    /// The `serverTimestamp` written into the document
    pub timestamp: &'a str,
}

/// Build JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<ResponseBody> {
    match serde_json::to_vec(body) {
        Ok(json) => build_json_response(status, Bytes::from(json), false),
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            build_500_response()
        }
    }
}
