// API module entry
// Shared project document endpoint: GET and POST /api/data

mod response;

use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_LENGTH;
use hyper::{Request, Response, StatusCode};

use crate::config::AppState;
use crate::http::response::build_json_response;
use crate::http::{build_500_response, ResponseBody};
use crate::logger;

use response::{json_response, SaveAck};

/// Return the stored document, or the sample project if none was saved yet
pub async fn handle_data_get(state: &AppState) -> Response<ResponseBody> {
    match state.store.read().await {
        Ok(snapshot) => {
            if snapshot.is_default() {
                logger::log_debug("No saved project yet, serving the sample project");
            }
            build_json_response(StatusCode::OK, Bytes::from(snapshot.into_bytes()), true)
        }
        Err(e) => {
            logger::log_api_error(&format!("Error serving data: {e}"));
            build_500_response()
        }
    }
}

/// Replace the stored document with the request body
///
/// Every failure (missing length, unreadable body, invalid JSON, storage
/// error) is answered with the same generic 500.
pub async fn handle_data_post<B>(req: Request<B>, state: &AppState) -> Response<ResponseBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if !req.headers().contains_key(CONTENT_LENGTH) {
        logger::log_api_error("Error saving data: missing Content-Length header");
        return build_500_response();
    }

    let limit = usize::try_from(state.config.http.max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            logger::log_api_error(&format!("Error saving data: failed to read body: {e}"));
            return build_500_response();
        }
    };

    match state.store.write(&body).await {
        Ok(timestamp) => {
            logger::log_document_saved(&timestamp);
            json_response(
                StatusCode::OK,
                &SaveAck {
                    success: true,
                    timestamp: &timestamp,
                },
            )
        }
        Err(e) => {
            logger::log_api_error(&format!("Error saving data: {e}"));
            build_500_response()
        }
    }
}
