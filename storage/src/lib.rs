//! Storage crate: session persistence behind a key-value abstraction.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`store`] – KeyValueStore trait and MemoryStore
//! - [`sqlite_store`] – SqliteStore (sqlx)
//! - [`key_locks`] – per-key async locks
//! - [`json_repo`] – JsonRepository: typed records with atomic read-modify-write
//! - [`sqlite_pool`] – SqlitePoolManager

mod error;
mod json_repo;
mod key_locks;
mod sqlite_pool;
mod sqlite_store;
mod store;

use std::sync::Arc;

pub use error::StorageError;
pub use json_repo::JsonRepository;
pub use key_locks::KeyLocks;
pub use sqlite_pool::SqlitePoolManager;
pub use sqlite_store::SqliteStore;
pub use store::{KeyValueStore, MemoryStore};

/// Opens a store from a URL: `memory` for [`MemoryStore`], `sqlite:...`, `file:...` or a `.db`
/// path for [`SqliteStore`].
pub async fn open_store(url: &str) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    let url = url.trim();
    if url.is_empty() || url.eq_ignore_ascii_case("memory") {
        return Ok(Arc::new(MemoryStore::new()));
    }
    if url.starts_with("sqlite:") || url.starts_with("file:") || url.ends_with(".db") {
        return Ok(Arc::new(SqliteStore::new(url).await?));
    }
    Err(StorageError::UnsupportedUrl(url.to_string()))
}
