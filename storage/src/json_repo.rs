//! Typed JSON records over a [`KeyValueStore`], keyed `{collection}:{id}`.
//!
//! `update` / `try_update` hold the per-key lock across load, mutate and save.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use crate::error::StorageError;
use crate::key_locks::KeyLocks;
use crate::store::KeyValueStore;

pub struct JsonRepository<T> {
    store: Arc<dyn KeyValueStore>,
    locks: KeyLocks,
    collection: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            locks: self.locks.clone(),
            collection: self.collection.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> JsonRepository<T>
where
    T: Serialize + DeserializeOwned + Default + Send,
{
    pub fn new(store: Arc<dyn KeyValueStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            locks: KeyLocks::new(),
            collection: collection.into(),
            _marker: PhantomData,
        }
    }

    pub fn key(&self, id: i64) -> String {
        format!("{}:{}", self.collection, id)
    }

    pub async fn load(&self, id: i64) -> Result<Option<T>, StorageError> {
        match self.store.get(&self.key(id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Loads the record or returns `T::default()` without persisting it.
    pub async fn load_or_default(&self, id: i64) -> Result<T, StorageError> {
        Ok(self.load(id).await?.unwrap_or_default())
    }

    pub async fn save(&self, id: i64, value: &T) -> Result<(), StorageError> {
        let _guard = self.locks.lock(&self.key(id)).await;
        self.write(id, value).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        let _guard = self.locks.lock(&self.key(id)).await;
        self.store.delete(&self.key(id)).await
    }

    /// Atomic read-modify-write starting from the stored record or `T::default()`.
    pub async fn update<F, R>(&self, id: i64, f: F) -> Result<R, StorageError>
    where
        F: FnOnce(&mut T) -> R + Send,
    {
        let key = self.key(id);
        let _guard = self.locks.lock(&key).await;
        let mut value = self.load(id).await?.unwrap_or_default();
        let out = f(&mut value);
        self.write(id, &value).await?;
        debug!(key = %key, "step: record updated");
        Ok(out)
    }

    /// Like [`update`](Self::update) but persists only when `f` succeeds; on error the stored
    /// record is untouched.
    pub async fn try_update<F, R, E>(&self, id: i64, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut T) -> Result<R, E> + Send,
        E: From<StorageError>,
    {
        let key = self.key(id);
        let _guard = self.locks.lock(&key).await;
        let mut value = self.load(id).await?.unwrap_or_default();
        let out = f(&mut value)?;
        self.write(id, &value).await?;
        debug!(key = %key, "step: record updated");
        Ok(out)
    }

    async fn write(&self, id: i64, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(&self.key(id), &raw).await
    }
}
