//! Access log format module
//!
//! Supports multiple log formats:
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)
//! - `json` (one JSON object per line)
//! - Custom patterns with `$variables`

use chrono::Local;
use serde_json::json;

/// Access log entry containing all request/response information
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client address
    pub remote_addr: String,
    /// Request timestamp
    pub time: chrono::DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    /// HTTP version (1.0, 1.1)
    pub http_version: String,
    pub status: u16,
    /// Response body size in bytes
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create a new access log entry with current timestamp
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => format!(
                "{} \"{}\" \"{}\"",
                self.format_common(),
                self.referer.as_deref().unwrap_or("-"),
                self.user_agent.as_deref().unwrap_or("-"),
            ),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    fn time_local(&self) -> String {
        self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string()
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} HTTP/{}\" {} {}",
            self.remote_addr,
            self.time_local(),
            self.method,
            self.request_uri(),
            self.http_version,
            self.status,
            self.body_bytes,
        )
    }

    fn format_json(&self) -> String {
        json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables: `$remote_addr`, `$time_local`, `$time_iso8601`,
    /// `$request`, `$request_method`, `$request_uri`, `$request_time`,
    /// `$status`, `$body_bytes_sent`, `$http_referer`, `$http_user_agent`.
    /// Unknown names are kept literally. Substituted values are never
    /// rescanned, so a `$` in a client-supplied path stays as sent.
    fn format_custom(&self, pattern: &str) -> String {
        let mut out = String::with_capacity(pattern.len() * 2);
        let mut rest = pattern;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos + 1..];
            let name_len = tail
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(tail.len());
            let name = &tail[..name_len];
            match self.variable(name) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            }
            rest = &tail[name_len..];
        }

        out.push_str(rest);
        out
    }

    fn variable(&self, name: &str) -> Option<String> {
        let value = match name {
            "remote_addr" => self.remote_addr.clone(),
            "time_local" => self.time_local(),
            "time_iso8601" => self.time.to_rfc3339(),
            "request" => format!("{} {} HTTP/{}", self.method, self.request_uri(), self.http_version),
            "request_method" => self.method.clone(),
            "request_uri" => self.request_uri(),
            "request_time" => {
                #[allow(clippy::cast_precision_loss)]
                let secs = self.request_time_us as f64 / 1_000_000.0;
                format!("{secs:.3}")
            }
            "status" => self.status.to_string(),
            "body_bytes_sent" => self.body_bytes.to_string(),
            "http_referer" => self.referer.as_deref().unwrap_or("-").to_string(),
            "http_user_agent" => self.user_agent.as_deref().unwrap_or("-").to_string(),
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "192.168.1.20".to_string(),
            "POST".to_string(),
            "/api/data".to_string(),
        );
        entry.query = Some("t=1".to_string());
        entry.status = 200;
        entry.body_bytes = 64;
        entry.referer = Some("http://192.168.1.10:8000/".to_string());
        entry.user_agent = Some("Mozilla/5.0".to_string());
        entry.request_time_us = 1500;
        entry
    }

    #[test]
    fn test_format_combined() {
        let log = create_test_entry().format("combined");
        assert!(log.starts_with("192.168.1.20 - - ["));
        assert!(log.contains("\"POST /api/data?t=1 HTTP/1.1\" 200 64"));
        assert!(log.ends_with("\"http://192.168.1.10:8000/\" \"Mozilla/5.0\""));
    }

    #[test]
    fn test_format_common() {
        let log = create_test_entry().format("common");
        assert!(log.contains("\"POST /api/data?t=1 HTTP/1.1\" 200 64"));
        assert!(!log.contains("Mozilla"));
    }

    #[test]
    fn test_format_json() {
        let log = create_test_entry().format("json");
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["remote_addr"], "192.168.1.20");
        assert_eq!(value["method"], "POST");
        assert_eq!(value["status"], 200);
        assert_eq!(value["body_bytes"], 64);
        assert_eq!(value["query"], "t=1");
    }

    #[test]
    fn test_format_json_missing_headers_are_null() {
        let entry = AccessLogEntry::new("::1".into(), "GET".into(), "/".into());
        let value: serde_json::Value = serde_json::from_str(&entry.format("json")).unwrap();
        assert!(value["referer"].is_null());
        assert!(value["user_agent"].is_null());
    }

    #[test]
    fn test_format_custom() {
        let log = create_test_entry().format("$request_method $request_uri -> $status in $request_time");
        assert_eq!(log, "POST /api/data?t=1 -> 200 in 0.002");
    }

    #[test]
    fn test_format_custom_does_not_expand_client_text() {
        let mut entry = AccessLogEntry::new("::1".into(), "GET".into(), "/x$status".into());
        entry.status = 404;
        entry.body_bytes = 13;

        let log = entry.format("$request_uri $status $body_bytes_sent");
        assert_eq!(log, "/x$status 404 13");

        let log = entry.format("[$request] $unknown $");
        assert_eq!(log, "[GET /x$status HTTP/1.1] $unknown $");
    }
}
