//! At most one background wait task per user.
//!
//! Spawning a task for a user aborts the one already running. A task removes its own entry when
//! it finishes, or earlier via [`TaskRegistry::release`] so the work it triggers can spawn a
//! successor without aborting it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tracing::debug;

struct TaskEntry {
    id: u64,
    handle: AbortHandle,
}

#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<Mutex<HashMap<i64, TaskEntry>>>,
    next_id: Arc<AtomicU64>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `make(task_id)` as the user's task, aborting the previous one. Returns the task id.
    pub async fn spawn<F, Fut>(&self, user_id: i64, make: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let fut = make(id);
        let registry = self.clone();

        let mut tasks = self.tasks.lock().await;
        if let Some(previous) = tasks.remove(&user_id) {
            previous.handle.abort();
            debug!(user_id = user_id, task_id = previous.id, "step: previous task aborted");
        }
        // The lock is held until the entry is in place, so a task that finishes immediately
        // still finds (and removes) its own entry.
        let handle = tokio::spawn(async move {
            fut.await;
            registry.release(user_id, id).await;
        });
        tasks.insert(
            user_id,
            TaskEntry {
                id,
                handle: handle.abort_handle(),
            },
        );
        id
    }

    /// Forgets task `task_id` without aborting it. No-op when a newer task replaced it.
    pub async fn release(&self, user_id: i64, task_id: u64) -> bool {
        let mut tasks = self.tasks.lock().await;
        match tasks.get(&user_id) {
            Some(entry) if entry.id == task_id => {
                tasks.remove(&user_id);
                true
            }
            _ => false,
        }
    }

    /// Aborts the user's task, if any.
    pub async fn abort(&self, user_id: i64) -> bool {
        match self.tasks.lock().await.remove(&user_id) {
            Some(entry) => {
                entry.handle.abort();
                debug!(user_id = user_id, task_id = entry.id, "step: task aborted");
                true
            }
            None => false,
        }
    }

    pub async fn is_running(&self, user_id: i64) -> bool {
        self.tasks.lock().await.contains_key(&user_id)
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
