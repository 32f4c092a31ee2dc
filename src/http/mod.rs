//! HTTP protocol layer module
//!
//! Protocol helpers shared by the static file responder and the document API:
//! content types, `ETag` validation and response builders.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use response::{
    build_304_response, build_404_response, build_405_response,
    build_500_response, build_preflight_response, build_redirect_response, ResponseBody,
};
