#![forbid(unsafe_code)]

//! HTTP transport for the exercise tracker.

pub mod error;
pub mod extract;
pub mod routes;

pub use error::ApiError;
pub use routes::{router, AppState};

use mockable::Clock;
use std::sync::Arc;
use tracker_core::{
    Config, ExerciseLog, JournalStore, MemoryStore, Result, StorageBackend, UserDirectory,
    UserStore,
};

/// Open the store selected by the configuration
pub fn open_store(config: &Config) -> Result<Arc<dyn UserStore>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Journal => Ok(Arc::new(JournalStore::open(
            config.storage.journal_path(),
        )?)),
    }
}

/// Wire the core services around a store
pub fn build_state(store: Arc<dyn UserStore>, clock: Arc<dyn Clock + Send + Sync>) -> AppState {
    let directory = UserDirectory::new(store);
    AppState {
        exercises: ExerciseLog::new(directory.clone(), clock),
        directory,
    }
}
