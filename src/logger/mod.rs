//! Logger module
//!
//! Provides logging utilities for the tracker server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use std::path::Path;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
        config.logging.level.eq_ignore_ascii_case("debug"),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, local_url: &str, config: &Config, data_path: &Path) {
    write_info("======================================");
    write_info("Swimlane Project Tracker started");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Local access: {local_url}"));
    write_info(&format!("Serving files from: {}", config.storage.root));
    write_info(&format!("Shared data file: {}", data_path.display()));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("All clients share the same project data; the last save wins");
    write_info("Press Ctrl+C to stop the server");
    write_info("======================================\n");
}

/// Only written when `logging.level` is `debug`
pub fn log_debug(message: &str) {
    if let Some(w) = writer::get() {
        w.write_debug(&format!("[DEBUG] {message}"));
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_api_error(message: &str) {
    write_error(&format!("[API ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_info(message: &str) {
    write_info(&format!("[INFO] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_document_saved(timestamp: &str) {
    write_info(&format!("[API] Project data saved at {timestamp}"));
}

pub fn log_shutdown(signal: &str) {
    write_info(&format!("\n[SIGNAL] {signal} received, server stopped by user"));
}
