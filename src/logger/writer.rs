//! Log writer module
//!
//! Thread-safe log writing to files or stdout/stderr.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    Stdout,
    Stderr,
    File(Mutex<File>),
}

impl LogTarget {
    fn open(path: Option<&str>, fallback: Self) -> io::Result<Self> {
        match path {
            Some(p) => Ok(Self::File(Mutex::new(open_log_file(p)?))),
            None => Ok(fallback),
        }
    }

    fn write(&self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File(file) => {
                if let Ok(mut f) = file.lock() {
                    let _ = writeln!(f, "{message}");
                }
            }
        }
    }
}

/// Thread-safe log writer
pub struct LogWriter {
    /// Info and access log target
    access: LogTarget,
    /// Error log target
    error: LogTarget,
    /// Whether debug lines are emitted
    debug: bool,
}

impl LogWriter {
    fn new(
        access_log_file: Option<&str>,
        error_log_file: Option<&str>,
        debug: bool,
    ) -> io::Result<Self> {
        Ok(Self {
            access: LogTarget::open(access_log_file, LogTarget::Stdout)?,
            error: LogTarget::open(error_log_file, LogTarget::Stderr)?,
            debug,
        })
    }

    pub fn write_access(&self, message: &str) {
        self.access.write(message);
    }

    pub fn write_info(&self, message: &str) {
        self.access.write(message);
    }

    pub fn write_error(&self, message: &str) {
        self.error.write(message);
    }

    pub fn write_debug(&self, message: &str) {
        if self.debug {
            self.access.write(message);
        }
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global log writer
///
/// Call once at startup. Fails if a log file cannot be opened.
pub fn init(
    access_log_file: Option<&str>,
    error_log_file: Option<&str>,
    debug: bool,
) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, error_log_file, debug)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer, if `init()` has run
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_targets_append() {
        let dir = tempfile::tempdir().unwrap();
        let access = dir.path().join("logs/access.log");
        let error = dir.path().join("logs/error.log");

        let writer =
            LogWriter::new(access.to_str(), error.to_str(), false).unwrap();
        writer.write_access("GET /api/data");
        writer.write_info("started");
        writer.write_error("[ERROR] boom");
        writer.write_debug("hidden");

        let access_text = std::fs::read_to_string(&access).unwrap();
        assert_eq!(access_text, "GET /api/data\nstarted\n");
        assert_eq!(std::fs::read_to_string(&error).unwrap(), "[ERROR] boom\n");
    }
}
