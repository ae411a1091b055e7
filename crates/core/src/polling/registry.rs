//! Keyed registry of cancellable background tasks
//!
//! Replaces ad hoc interval handles with one owned object per page session:
//! at most one task runs per key, starting a task for a key cancels whatever
//! ran under it before, and dropping the registry stops everything.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct TaskEntry {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Registry of background tasks keyed by `K`
pub struct TaskRegistry<K> {
    tasks: Mutex<HashMap<K, TaskEntry>>,
    root: CancellationToken,
}

impl<K> TaskRegistry<K>
where
    K: Eq + Hash + Clone + fmt::Display + Send + 'static,
{
    pub fn new() -> Self {
        Self { tasks: Mutex::new(HashMap::new()), root: CancellationToken::new() }
    }

    /// Spawn `task` under `key`, cancelling any task previously registered
    /// for the same key.
    ///
    /// The task receives a token it must observe; it is cancelled by
    /// [`stop`](Self::stop), [`stop_all`](Self::stop_all), a replacing
    /// `start`, or drop of the registry.
    pub fn start<F, Fut>(&self, key: K, task: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let previous = self.tasks.lock().remove(&key);
        let replaced = previous.is_some();
        if let Some(previous) = previous {
            previous.token.cancel();
        }

        let token = self.root.child_token();
        let handle = tokio::spawn(task(token.clone()));
        // A concurrent start for the same key may have slipped in meanwhile.
        if let Some(raced) = self.tasks.lock().insert(key.clone(), TaskEntry { token, handle }) {
            raced.token.cancel();
        }

        if replaced {
            debug!(task = %key, "replaced running task");
        } else {
            debug!(task = %key, "started task");
        }
    }

    /// Cancel the task under `key`. Returns whether one was still running.
    pub fn stop(&self, key: &K) -> bool {
        let Some(entry) = self.tasks.lock().remove(key) else {
            return false;
        };
        let was_running = !entry.handle.is_finished();
        entry.token.cancel();
        debug!(task = %key, was_running, "stopped task");
        was_running
    }

    /// Cancel every task. Tasks started afterwards receive an already
    /// cancelled token.
    pub fn stop_all(&self) {
        self.root.cancel();
        let drained: Vec<_> = self.tasks.lock().drain().collect();
        for (key, entry) in drained {
            entry.token.cancel();
            debug!(task = %key, "stopped task");
        }
    }

    pub fn is_active(&self, key: &K) -> bool {
        self.tasks.lock().get(key).is_some_and(|entry| !entry.handle.is_finished())
    }

    pub fn active_count(&self) -> usize {
        self.tasks.lock().values().filter(|entry| !entry.handle.is_finished()).count()
    }

    /// Wait for the task under `key` to finish and forget it.
    pub async fn join(&self, key: &K) -> bool {
        let entry = self.tasks.lock().remove(key);
        match entry {
            Some(entry) => entry.handle.await.is_ok(),
            None => false,
        }
    }
}

impl<K> Default for TaskRegistry<K>
where
    K: Eq + Hash + Clone + fmt::Display + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Drop for TaskRegistry<K> {
    fn drop(&mut self) {
        self.root.cancel();
        for (_, entry) in self.tasks.get_mut().drain() {
            entry.token.cancel();
            entry.handle.abort();
        }
    }
}
