use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lifeline::signals::{ReleaseHook, SignalListener, TerminationSignal};
use lifeline::BoxFuture;
use tokio::sync::mpsc;

/// A signal listener fed by a [`SignalInjector`] instead of the OS.
pub struct FakeSignals {
    rx: mpsc::UnboundedReceiver<TerminationSignal>,
    released: Arc<AtomicBool>,
}

/// Test-side handle: delivers signals and observes the release hook.
///
/// Keep it alive for the duration of the test; dropping it closes the
/// listener.
#[derive(Clone)]
pub struct SignalInjector {
    tx: mpsc::UnboundedSender<TerminationSignal>,
    released: Arc<AtomicBool>,
}

pub fn fake_signals() -> (FakeSignals, SignalInjector) {
    let (tx, rx) = mpsc::unbounded_channel();
    let released = Arc::new(AtomicBool::new(false));
    (
        FakeSignals {
            rx,
            released: Arc::clone(&released),
        },
        SignalInjector { tx, released },
    )
}

impl SignalInjector {
    /// Deliver a signal. Silently dropped once the listener is gone.
    pub fn send(&self, signal: TerminationSignal) {
        let _ = self.tx.send(signal);
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Poll until the listener has been released.
    pub async fn wait_released(&self) {
        while !self.is_released() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl SignalListener for FakeSignals {
    fn recv(&mut self) -> BoxFuture<'_, Option<TerminationSignal>> {
        Box::pin(self.rx.recv())
    }

    fn release_hook(&self) -> ReleaseHook {
        let released = Arc::clone(&self.released);
        Arc::new(move || released.store(true, Ordering::SeqCst))
    }
}
