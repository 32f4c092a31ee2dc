//! Shared document store
//!
//! One JSON file on disk holds the project document for every client.
//! All access goes through [`DocumentStore`], which serializes reads and
//! writes so a request never observes or produces a half-written file.
//!
//! Writes replace the whole document. Concurrent writers are applied one
//! after another and the last one wins: an earlier writer's changes are
//! dropped without notice (lost update).

mod defaults;
mod error;

use chrono::{Local, SecondsFormat};
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub use defaults::default_document;
pub use error::StoreError;

/// Fields stamped onto every saved document
pub const LAST_SAVED_FIELD: &str = "lastSaved";
pub const SERVER_TIMESTAMP_FIELD: &str = "serverTimestamp";

/// Result of a document read
#[derive(Debug)]
pub enum Snapshot {
    /// Raw bytes of the backing file, exactly as stored
    Stored(Vec<u8>),
    /// Sample document generated because nothing has been saved yet
    Default(Vec<u8>),
}

impl Snapshot {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Stored(b) | Self::Default(b) => b,
        }
    }

    pub const fn is_default(&self) -> bool {
        matches!(self, Self::Default(_))
    }
}

/// File-backed store for the shared project document
pub struct DocumentStore {
    path: PathBuf,
    atomic_write: bool,
    /// Held for the whole read or write of the backing file
    lock: Mutex<()>,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>, atomic_write: bool) -> Self {
        Self {
            path: path.into(),
            atomic_write,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current document
    ///
    /// Falls back to the sample project when the file does not exist. The
    /// sample is built fresh on every call and is not persisted.
    pub async fn read(&self) -> Result<Snapshot, StoreError> {
        let _guard = self.lock.lock().await;

        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Snapshot::Stored(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let doc = default_document(&now_timestamp());
                let bytes = serde_json::to_vec_pretty(&doc).map_err(StoreError::Serialize)?;
                Ok(Snapshot::Default(bytes))
            }
            Err(e) => Err(StoreError::io("read", &self.path, e)),
        }
    }

    /// Replace the document with `body`, returning the assigned timestamp
    ///
    /// `body` must be a JSON object. Any previous `lastSaved` and
    /// `serverTimestamp` values are overwritten. On error the stored file is
    /// left untouched.
    pub async fn write(&self, body: &[u8]) -> Result<String, StoreError> {
        let mut doc: Value = serde_json::from_slice(body).map_err(StoreError::Parse)?;
        let timestamp = now_timestamp();

        let fields = doc.as_object_mut().ok_or(StoreError::NotAnObject)?;
        fields.insert(LAST_SAVED_FIELD.to_string(), Value::from(timestamp.clone()));
        fields.insert(SERVER_TIMESTAMP_FIELD.to_string(), Value::from(timestamp.clone()));

        let content = serde_json::to_vec_pretty(&doc).map_err(StoreError::Serialize)?;

        let _guard = self.lock.lock().await;
        if self.atomic_write {
            self.replace_atomically(&content).await?;
        } else {
            fs::write(&self.path, &content)
                .await
                .map_err(|e| StoreError::io("write", &self.path, e))?;
        }

        Ok(timestamp)
    }

    /// Write to a sibling temp file, then rename it over the backing file
    async fn replace_atomically(&self, content: &[u8]) -> Result<(), StoreError> {
        let tmp_path = self.temp_path();

        if let Err(e) = write_synced(&tmp_path, content).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::io("write", tmp_path, e));
        }

        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::io("replace", &self.path, e));
        }

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

async fn write_synced(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(content).await?;
    file.sync_all().await
}

/// Current local time as RFC 3339 with microseconds and UTC offset
pub fn now_timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::json;

    fn store_in(dir: &tempfile::TempDir, atomic_write: bool) -> DocumentStore {
        DocumentStore::new(dir.path().join("shared_project_data.json"), atomic_write)
    }

    fn parse_stored(snapshot: Snapshot) -> Value {
        serde_json::from_slice(&snapshot.into_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_read_missing_returns_default_without_creating_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, true);

        let snapshot = store.read().await.unwrap();
        assert!(snapshot.is_default());

        let doc = parse_stored(snapshot);
        assert_eq!(doc["weeks"], 9);
        assert_eq!(doc["tasks"].as_array().unwrap().len(), 6);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, true);
        let before = Local::now();

        let posted = json!({
            "weeks": 4,
            "swimlanes": [{"id": "ops", "name": "Ops"}],
            "tasks": [],
            "version": "1.0"
        });
        let timestamp = store.write(posted.to_string().as_bytes()).await.unwrap();

        let snapshot = store.read().await.unwrap();
        assert!(!snapshot.is_default());
        let mut stored = parse_stored(snapshot);

        let fields = stored.as_object_mut().unwrap();
        let last_saved = fields.remove(LAST_SAVED_FIELD).unwrap();
        let server_ts = fields.remove(SERVER_TIMESTAMP_FIELD).unwrap();
        assert_eq!(server_ts, timestamp.as_str());
        assert_eq!(last_saved, server_ts);

        let parsed = DateTime::parse_from_rfc3339(&timestamp).unwrap();
        assert!(parsed.timestamp_micros() >= before.timestamp_micros());
        assert_eq!(stored, posted);
    }

    #[tokio::test]
    async fn test_second_write_replaces_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, true);

        store.write(br#"{"weeks": 3, "only_first": true}"#).await.unwrap();
        store.write(br#"{"weeks": 5}"#).await.unwrap();

        let doc = parse_stored(store.read().await.unwrap());
        assert_eq!(doc["weeks"], 5);
        assert!(doc.get("only_first").is_none());
    }

    #[tokio::test]
    async fn test_client_timestamps_are_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, false);

        let timestamp = store
            .write(br#"{"lastSaved": "yesterday", "serverTimestamp": "never"}"#)
            .await
            .unwrap();

        let doc = parse_stored(store.read().await.unwrap());
        assert_eq!(doc[LAST_SAVED_FIELD], timestamp.as_str());
        assert_eq!(doc[SERVER_TIMESTAMP_FIELD], timestamp.as_str());
    }

    #[tokio::test]
    async fn test_malformed_body_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, true);

        store.write(br#"{"weeks": 7}"#).await.unwrap();
        let original = std::fs::read(store.path()).unwrap();

        let err = store.write(b"{not json").await.unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));

        let err = store.write(b"[1, 2, 3]").await.unwrap_err();
        assert!(matches!(err, StoreError::NotAnObject));

        assert_eq!(std::fs::read(store.path()).unwrap(), original);
    }

    #[tokio::test]
    async fn test_pretty_output_keeps_non_ascii_and_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, true);

        store
            .write(r#"{"zeta": 1, "name": "Équipe Ω", "alpha": 2}"#.as_bytes())
            .await
            .unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"name\": \"Équipe Ω\""));
        assert!(text.contains("\n  \"zeta\": 1"));

        let zeta = text.find("\"zeta\"").unwrap();
        let alpha = text.find("\"alpha\"").unwrap();
        assert!(zeta < alpha);
    }

    #[tokio::test]
    async fn test_atomic_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, true);

        store.write(br#"{"weeks": 1}"#).await.unwrap();

        assert!(store.path().exists());
        assert!(!store.temp_path().exists());
        assert_eq!(
            store.temp_path().file_name().unwrap(),
            "shared_project_data.json.tmp"
        );
    }

    #[tokio::test]
    async fn test_concurrent_writes_never_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(store_in(&dir, true));

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let body = json!({"writer": i, "padding": "x".repeat(4096)});
                store.write(body.to_string().as_bytes()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Whichever writer landed last, the file is one complete document
        let doc = parse_stored(store.read().await.unwrap());
        assert!(doc["writer"].as_u64().unwrap() < 8);
        assert_eq!(doc["padding"].as_str().unwrap().len(), 4096);
    }

    #[tokio::test]
    async fn test_read_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the data path cannot be read as a file
        let store = DocumentStore::new(dir.path(), true);

        let err = store.read().await.unwrap_err();
        assert!(matches!(err, StoreError::Io { action: "read", .. }));
    }
}
