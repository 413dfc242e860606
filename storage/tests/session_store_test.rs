//! Integration tests for the storage backends and [`storage::JsonRepository`].
//!
//! Covers SQLite persistence across reopen, in-memory SQLite, store URL selection, atomic
//! read-modify-write under concurrency and `try_update` leaving data untouched on error.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{open_store, JsonRepository, KeyValueStore, MemoryStore, SqliteStore, StorageError};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Counter {
    value: u32,
    label: Option<String>,
}

/// **Test: Values written to a SQLite file survive reopening the store.**
#[tokio::test]
async fn test_sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.db");
    let url = path.to_str().unwrap().to_string();

    {
        let store = SqliteStore::new(&url).await.expect("open sqlite store");
        store.set("session:1", r#"{"value":1}"#).await.unwrap();
        store.set("session:1", r#"{"value":2}"#).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    let reopened = SqliteStore::new(&url).await.expect("reopen sqlite store");
    assert_eq!(
        reopened.get("session:1").await.unwrap().as_deref(),
        Some(r#"{"value":2}"#)
    );
    assert!(reopened.delete("session:1").await.unwrap());
    assert!(reopened.get("session:1").await.unwrap().is_none());
}

/// **Test: `sqlite::memory:` keeps data for the lifetime of the pool.**
#[tokio::test]
async fn test_sqlite_in_memory_store() {
    let store = SqliteStore::new("sqlite::memory:").await.unwrap();
    store.set("k", "v").await.unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    assert!(!store.delete("missing").await.unwrap());
}

/// **Test: `open_store` picks the backend from the URL and rejects unknown schemes.**
#[tokio::test]
async fn test_open_store_by_url() {
    let memory = open_store("memory").await.unwrap();
    memory.set("a", "1").await.unwrap();
    assert_eq!(memory.get("a").await.unwrap().as_deref(), Some("1"));

    let sqlite = open_store("sqlite::memory:").await.unwrap();
    sqlite.set("a", "2").await.unwrap();
    assert_eq!(sqlite.get("a").await.unwrap().as_deref(), Some("2"));

    let err = open_store("redis://localhost:6379").await.err().unwrap();
    assert!(matches!(err, StorageError::UnsupportedUrl(_)));
}

/// **Test: Concurrent `update` calls on one key are serialized (no lost increments).**
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_are_serialized() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let repo: JsonRepository<Counter> = JsonRepository::new(store, "counter");

    let mut tasks = Vec::new();
    for _ in 0..50 {
        let repo = repo.clone();
        tasks.push(tokio::spawn(async move {
            repo.update(7, |c| c.value += 1).await.unwrap();
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }

    assert_eq!(repo.load(7).await.unwrap().unwrap().value, 50);
}

/// **Test: `try_update` persists on Ok and leaves the record untouched on Err.**
#[tokio::test]
async fn test_try_update_rolls_back_on_error() {
    #[derive(Debug)]
    enum AppError {
        Rejected,
        Storage(StorageError),
    }
    impl From<StorageError> for AppError {
        fn from(e: StorageError) -> Self {
            AppError::Storage(e)
        }
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let repo: JsonRepository<Counter> = JsonRepository::new(store.clone(), "counter");

    repo.try_update(1, |c| -> Result<(), AppError> {
        c.value = 10;
        c.label = Some("ok".to_string());
        Ok(())
    })
    .await
    .unwrap();

    let result = repo
        .try_update(1, |c| -> Result<(), AppError> {
            c.value = 99;
            Err(AppError::Rejected)
        })
        .await;
    assert!(matches!(result, Err(AppError::Rejected)));

    let stored = repo.load(1).await.unwrap().unwrap();
    assert_eq!(stored.value, 10);
    assert_eq!(stored.label.as_deref(), Some("ok"));
    assert_eq!(repo.key(1), "counter:1");
    assert!(store.get("counter:1").await.unwrap().is_some());
}

/// **Test: Corrupted JSON surfaces as a serialization error.**
#[tokio::test]
async fn test_corrupted_record_is_serialization_error() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    store.set("counter:3", "not json").await.unwrap();
    let repo: JsonRepository<Counter> = JsonRepository::new(store, "counter");

    let err = repo.load(3).await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}
