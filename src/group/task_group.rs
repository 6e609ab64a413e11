// src/group/task_group.rs

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::errors::{AppError, Result};

type FirstError = Arc<Mutex<Option<AppError>>>;

/// A set of concurrently running tasks with "cancel siblings on first
/// failure" semantics.
///
/// Dropping a group without calling [`wait`](Self::wait) aborts its tasks.
pub struct TaskGroup {
    token: CancellationToken,
    tasks: JoinSet<()>,
    names: HashMap<Id, String>,
    first_error: FirstError,
}

impl fmt::Debug for TaskGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskGroup")
            .field("tasks", &self.names.values().collect::<Vec<_>>())
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

impl TaskGroup {
    /// Create an empty group whose token is a child of `parent`.
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
            tasks: JoinSet::new(),
            names: HashMap::new(),
            first_error: Arc::new(Mutex::new(None)),
        }
    }

    /// The token shared by every task in the group.
    ///
    /// Cancelled when the parent is, or when any task fails.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Number of tasks spawned and not yet collected by [`wait`](Self::wait).
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// `true` once every spawned task has been collected.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Spawn `task` onto the runtime under `name`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&mut self, name: impl Into<String>, task: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let token = self.token.clone();
        let first_error = Arc::clone(&self.first_error);
        let task_name = name.clone();

        let handle = self.tasks.spawn(async move {
            let unwind_guard = UnwindGuard {
                task: Some(task_name.clone()),
                token: token.clone(),
                first_error: Arc::clone(&first_error),
            };
            let result = task.await;
            unwind_guard.disarm();

            match result {
                Ok(()) => debug!(task = %task_name, "task finished"),
                Err(source) => {
                    warn!(
                        task = %task_name,
                        error = %format!("{source:#}"),
                        "task failed; cancelling group"
                    );
                    record(
                        &first_error,
                        AppError::Task {
                            task: task_name,
                            source,
                        },
                    );
                    token.cancel();
                }
            }
        });

        debug!(task = %name, "task spawned");
        self.names.insert(handle.id(), name);
    }

    /// Wait for every task, then return the first failure (if any).
    pub async fn wait(mut self) -> Result<()> {
        while let Some(joined) = self.tasks.join_next_with_id().await {
            let err = match joined {
                Ok(_) => continue,
                Err(err) => err,
            };

            let task = self
                .names
                .get(&err.id())
                .cloned()
                .unwrap_or_else(|| "<unnamed>".to_string());

            if err.is_panic() {
                error!(task = %task, "task panicked; cancelling group");
                record(&self.first_error, AppError::TaskPanicked { task });
            } else {
                debug!(task = %task, "task was aborted");
            }
            self.token.cancel();
        }

        let first = self
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// First writer wins.
fn record(slot: &FirstError, err: AppError) {
    let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.is_none() {
        *slot = Some(err);
    }
}

/// Reports a panicking task to the group while it unwinds.
///
/// The failure is recorded before the token is cancelled, so a sibling that
/// fails in reaction to the cancellation cannot take the first-error slot.
struct UnwindGuard {
    task: Option<String>,
    token: CancellationToken,
    first_error: FirstError,
}

impl UnwindGuard {
    fn disarm(mut self) {
        self.task = None;
    }
}

impl Drop for UnwindGuard {
    fn drop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        // Dropped without panicking means the task was aborted.
        if std::thread::panicking() {
            record(&self.first_error, AppError::TaskPanicked { task });
        }
        self.token.cancel();
    }
}
