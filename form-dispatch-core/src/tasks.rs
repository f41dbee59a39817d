//! Keyed async task lifecycle
//!
//! Every timer and operation a controller starts is owned by a
//! [`TaskManager`]:
//! - Spawning with a key that is already running aborts the old task
//! - `debounce` delays execution and restarts the delay on each call
//! - Dropping the manager aborts everything it still owns
//!
//! Completed tasks report back by sending an action on the manager's
//! channel. An aborted task sends nothing.
//!
//! ```ignore
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let mut tasks = TaskManager::new(tx);
//!
//! tasks.spawn("action", async move {
//!     match save(values).await {
//!         Ok(()) => SaveAction::DidResolve,
//!         Err(e) => SaveAction::DidReject(Arc::new(e.into())),
//!     }
//! });
//!
//! tasks.debounce("recently-pending", Duration::from_millis(500), async {
//!     SaveAction::RecentlyPendingDidExpire
//! });
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::Action;

/// Identifies a task for cancellation and replacement.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TaskKey(String);

impl TaskKey {
    /// Create a new task key.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the key name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for TaskKey {
    fn from(s: &'static str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Manages async task lifecycle with automatic cancellation.
///
/// # Type Parameters
///
/// - `A`: The action type that tasks produce
pub struct TaskManager<A> {
    tasks: HashMap<TaskKey, AbortHandle>,
    action_tx: mpsc::UnboundedSender<A>,
}

impl<A> TaskManager<A>
where
    A: Action,
{
    /// Create a new task manager reporting to `action_tx`.
    pub fn new(action_tx: mpsc::UnboundedSender<A>) -> Self {
        Self {
            tasks: HashMap::new(),
            action_tx,
        }
    }

    /// Spawn a task, cancelling any existing task with the same key.
    ///
    /// The action the future resolves to is sent on the channel. A task that
    /// is cancelled before completion sends nothing.
    pub fn spawn<F>(&mut self, key: impl Into<TaskKey>, future: F) -> &mut Self
    where
        F: Future<Output = A> + Send + 'static,
    {
        let key = key.into();
        self.cancel(&key);

        let tx = self.action_tx.clone();
        let handle = tokio::spawn(async move {
            let action = future.await;
            let _ = tx.send(action);
        });

        tracing::trace!(task = key.name(), "Spawned task");
        self.tasks.insert(key, handle.abort_handle());
        self
    }

    /// Spawn a task that first waits for `duration`.
    ///
    /// Calling again with the same key before the duration expires cancels
    /// the previous task and restarts the wait.
    pub fn debounce<F>(&mut self, key: impl Into<TaskKey>, duration: Duration, future: F) -> &mut Self
    where
        F: Future<Output = A> + Send + 'static,
    {
        self.spawn(key, async move {
            tokio::time::sleep(duration).await;
            future.await
        })
    }

    /// Cancel a task by key. No-op when the key is unknown.
    pub fn cancel(&mut self, key: &TaskKey) {
        if let Some(handle) = self.tasks.remove(key) {
            handle.abort();
            tracing::trace!(task = key.name(), "Cancelled task");
        }
    }

    /// Forget a task whose completion has already been delivered.
    ///
    /// Unlike [`cancel`](Self::cancel) this does not abort anything; it only
    /// keeps [`is_running`](Self::is_running) accurate.
    pub fn finish(&mut self, key: &TaskKey) {
        self.tasks.remove(key);
    }

    /// Cancel all running tasks.
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }

    /// Check if a task with the given key is currently owned.
    pub fn is_running(&self, key: &TaskKey) -> bool {
        self.tasks.contains_key(key)
    }

    /// Get the number of owned tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if there are no owned tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<A> Drop for TaskManager<A> {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}
