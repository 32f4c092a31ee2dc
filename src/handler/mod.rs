//! Request handler module
//!
//! Routes requests to the shared document API or the static file responder.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
