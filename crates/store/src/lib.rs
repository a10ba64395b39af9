//! Comment store implementations for Spiro.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use spiro_config::StoreConfig;
use spiro_core::error::StoreError;
use spiro_core::store::CommentStore;
use std::sync::Arc;
use tracing::info;

/// Build the store selected by `config.backend`.
pub async fn build_from_config(config: &StoreConfig) -> Result<Arc<dyn CommentStore>, StoreError> {
    match config.backend.as_str() {
        "memory" => {
            info!("Using in-memory comment store");
            Ok(Arc::new(InMemoryStore::new()))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = std::path::Path::new(&config.path);
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).map_err(|e| {
                    StoreError::Storage(format!("Failed to create {}: {e}", dir.display()))
                })?;
            }
            Ok(Arc::new(SqliteStore::new(&config.path).await?))
        }
        other => Err(StoreError::Storage(format!(
            "Unsupported store backend \"{other}\""
        ))),
    }
}
