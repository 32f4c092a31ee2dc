// Application state module
// Shared by every connection task

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::types::Config;
use crate::store::DocumentStore;

/// Application state
pub struct AppState {
    pub config: Config,

    /// The single shared project document
    pub store: DocumentStore,

    // Cached config values for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let store = DocumentStore::new(config.storage.data_path(), config.storage.atomic_write);

        Self {
            config: config.clone(),
            store,
            cached_access_log: Arc::new(AtomicBool::new(config.logging.access_log)),
        }
    }
}
