// Store error type

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failure while reading or writing the shared document
#[derive(Debug)]
pub enum StoreError {
    /// Filesystem operation failed
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    /// Request body is not valid JSON
    Parse(serde_json::Error),
    /// Request body is valid JSON but not an object
    NotAnObject,
    /// Document could not be serialized
    Serialize(serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io {
                action,
                path,
                source,
            } => write!(f, "failed to {action} '{}': {source}", path.display()),
            Self::Parse(e) => write!(f, "invalid JSON body: {e}"),
            Self::NotAnObject => write!(f, "document must be a JSON object"),
            Self::Serialize(e) => write!(f, "failed to serialize document: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) | Self::Serialize(e) => Some(e),
            Self::NotAnObject => None,
        }
    }
}
