// Configuration module entry point
// Loads typed configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::Config;

/// Config file looked up when no path is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "tracker";

impl Config {
    /// Load configuration from the given file path (extension optional)
    ///
    /// The file is optional. `TRACKER_*` environment variables override it,
    /// with `__` separating sections, e.g. `TRACKER_SERVER__PORT=9000`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("TRACKER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.open_browser", true)?
            .set_default("storage.root", ".")?
            .set_default("storage.data_file", "shared_project_data.json")?
            .set_default("storage.atomic_write", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "Swimlane-Tracker")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Loopback URL opened in the browser and printed in the banner
    pub fn local_url(&self) -> String {
        format!("http://localhost:{}", self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("does-not-exist/tracker").unwrap();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.storage.data_file, "shared_project_data.json");
        assert!(cfg.storage.atomic_write);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.http.index_files, vec!["index.html", "index.htm"]);
        assert_eq!(cfg.http.max_body_size, 10_485_760);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9100\nopen_browser = false\n\n[storage]\ndata_file = \"board.json\"\n",
        )
        .unwrap();

        let cfg = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert!(!cfg.server.open_browser);
        assert_eq!(cfg.storage.data_path(), std::path::Path::new(".").join("board.json"));
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 9100);
        assert_eq!(cfg.local_url(), "http://localhost:9100");
    }
}
