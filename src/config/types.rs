// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Open the local URL in a browser once the listener is bound
    pub open_browser: bool,
}

/// Shared document storage configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Serving root for static files; the data file is resolved against it
    pub root: String,
    pub data_file: String,
    /// Write through a temp file and rename instead of truncating in place
    pub atomic_write: bool,
}

impl StorageConfig {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.root).join(&self.data_file)
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Seconds an idle keep-alive connection may wait for its next request;
    /// `0` disables keep-alive
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}
