// src/runner/cleanup.rs

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, error, warn};

type Action = Box<dyn FnOnce() + Send>;

/// A teardown action that runs exactly once.
///
/// It runs either when [`run`](Self::run) is called or, failing that, when
/// the value is dropped. Failures inside the action (an `Err` from a
/// [`fallible`](Self::fallible) body, or a panic) are logged and absorbed so
/// they never mask the outcome of the work being cleaned up.
pub struct Cleanup {
    action: Option<Action>,
}

impl Cleanup {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self {
            action: Some(Box::new(f)),
        }
    }

    /// Wrap a cleanup body that can fail; its error is logged at `warn`.
    pub fn fallible(f: impl FnOnce() -> anyhow::Result<()> + Send + 'static) -> Self {
        Self::new(move || {
            if let Err(err) = f() {
                warn!(error = %format!("{err:#}"), "cleanup failed");
            }
        })
    }

    pub fn noop() -> Self {
        Self { action: None }
    }

    /// Run the action now.
    pub fn run(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        let Some(action) = self.action.take() else {
            return;
        };

        debug!("running cleanup");
        if catch_unwind(AssertUnwindSafe(action)).is_err() {
            error!("cleanup panicked");
        }
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        self.fire();
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanup")
            .field("pending", &self.action.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (Cleanup, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let cleanup = Cleanup::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (cleanup, calls)
    }

    #[test]
    fn run_fires_once() {
        let (cleanup, calls) = counting();
        cleanup.run();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_fires_when_never_run() {
        let (cleanup, calls) = counting();
        drop(cleanup);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fallible_error_is_absorbed() {
        let cleanup = Cleanup::fallible(|| Err(anyhow::anyhow!("socket already closed")));
        cleanup.run();
    }

    #[test]
    fn panic_is_absorbed() {
        let cleanup = Cleanup::new(|| panic!("boom"));
        cleanup.run();
    }
}
