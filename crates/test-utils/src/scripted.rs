use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use lifeline::errors::ConstructionError;
use lifeline::runner::{Cleanup, Runner, RunnerFactory, Wiring};
use lifeline::BoxFuture;
use tokio_util::sync::CancellationToken;

/// What a [`ScriptedRunner`] does once started.
#[derive(Debug, Clone)]
pub enum Script {
    /// Return `Ok` after the delay, regardless of cancellation.
    ReturnAfter(Duration),
    /// Return the given error after the delay, regardless of cancellation.
    FailAfter(Duration, String),
    /// Block until the token is cancelled, then return `Ok`.
    UntilCancelled,
    /// Panic immediately.
    Panic,
}

/// Observations about a runner's lifetime.
#[derive(Clone, Default)]
pub struct RunnerProbe {
    started: Arc<AtomicBool>,
    returned: Arc<AtomicBool>,
    saw_cancel: Arc<AtomicBool>,
}

impl RunnerProbe {
    pub fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn returned(&self) -> bool {
        self.returned.load(Ordering::SeqCst)
    }

    pub fn saw_cancel(&self) -> bool {
        self.saw_cancel.load(Ordering::SeqCst)
    }
}

/// A runner that follows a [`Script`].
pub struct ScriptedRunner {
    script: Script,
    probe: RunnerProbe,
}

impl ScriptedRunner {
    pub fn new(script: Script) -> (Self, RunnerProbe) {
        let probe = RunnerProbe::default();
        (
            Self {
                script,
                probe: probe.clone(),
            },
            probe,
        )
    }
}

impl Runner for ScriptedRunner {
    fn run(&mut self, cancel: CancellationToken) -> BoxFuture<'_, anyhow::Result<()>> {
        let script = self.script.clone();
        let probe = self.probe.clone();

        Box::pin(async move {
            probe.started.store(true, Ordering::SeqCst);
            let result = match script {
                Script::ReturnAfter(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(())
                }
                Script::FailAfter(delay, msg) => {
                    tokio::time::sleep(delay).await;
                    Err(anyhow!(msg))
                }
                Script::UntilCancelled => {
                    cancel.cancelled().await;
                    probe.saw_cancel.store(true, Ordering::SeqCst);
                    Ok(())
                }
                Script::Panic => panic!("scripted runner panic"),
            };
            probe.returned.store(true, Ordering::SeqCst);
            result
        })
    }
}

/// Counts cleanup invocations and whether each one happened after
/// cancellation.
#[derive(Clone, Default)]
pub struct CleanupProbe {
    calls: Arc<AtomicUsize>,
    ran_before_cancel: Arc<AtomicBool>,
}

impl CleanupProbe {
    /// A cleanup that reports into this probe, checking `token` when it runs.
    pub fn cleanup(&self, token: CancellationToken) -> Cleanup {
        let probe = self.clone();
        Cleanup::new(move || {
            if !token.is_cancelled() {
                probe.ran_before_cancel.store(true, Ordering::SeqCst);
            }
            probe.calls.fetch_add(1, Ordering::SeqCst);
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn ran_before_cancel(&self) -> bool {
        self.ran_before_cancel.load(Ordering::SeqCst)
    }
}

/// A factory producing a [`ScriptedRunner`] and a probed cleanup, or a
/// construction error.
pub struct ScriptedFactory {
    script: Script,
    fail_with: Option<String>,
    cleanup: CleanupProbe,
    runner: RunnerProbe,
    builds: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            fail_with: None,
            cleanup: CleanupProbe::default(),
            runner: RunnerProbe::default(),
            builds: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A factory whose construction always fails.
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::new(Script::UntilCancelled)
        }
    }

    pub fn cleanup_probe(&self) -> CleanupProbe {
        self.cleanup.clone()
    }

    pub fn runner_probe(&self) -> RunnerProbe {
        self.runner.clone()
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl RunnerFactory for ScriptedFactory {
    fn build<'a>(
        &'a self,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Wiring, ConstructionError>> {
        Box::pin(async move {
            self.builds.fetch_add(1, Ordering::SeqCst);
            if let Some(msg) = &self.fail_with {
                return Err(ConstructionError::MissingConfig(msg.clone()));
            }

            let runner = ScriptedRunner {
                script: self.script.clone(),
                probe: self.runner.clone(),
            };
            Ok(Wiring::new(runner, self.cleanup.cleanup(cancel.clone())))
        })
    }
}
