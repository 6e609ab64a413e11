// src/signals/source.rs

//! Binding a [`SignalListener`] to a cancellation token.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{ReleaseHook, SignalListener, TerminationSignal};

/// An armed signal interceptor.
///
/// [`token`](Self::token) is cancelled the first time the listener reports a
/// termination signal, or when the source is disarmed. Dropping the source
/// disarms it.
pub struct CancellationSource {
    token: CancellationToken,
    cause: Arc<OnceLock<TerminationSignal>>,
    disarm: Disarm,
}

impl fmt::Debug for CancellationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationSource")
            .field("cancelled", &self.token.is_cancelled())
            .field("cause", &self.cause.get())
            .field("disarmed", &self.disarm.is_disarmed())
            .finish()
    }
}

impl CancellationSource {
    /// Start intercepting signals from `listener`.
    ///
    /// The returned source's token is a child of `parent`. Must be called
    /// from within a tokio runtime; the listener is driven by a spawned task.
    pub fn arm<L: SignalListener>(parent: &CancellationToken, listener: L) -> Self {
        let token = parent.child_token();
        let cause = Arc::new(OnceLock::new());
        let disarm = Disarm::new(token.clone(), listener.release_hook());

        tokio::spawn(intercept(
            listener,
            token.clone(),
            disarm.inner.stopped.clone(),
            Arc::clone(&cause),
        ));
        debug!(signals = ?TerminationSignal::ALL, "signal interception armed");

        Self {
            token,
            cause,
            disarm,
        }
    }

    /// The cancellation token bound to this source.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// The signal that cancelled the token, if a signal did.
    pub fn cancelled_by(&self) -> Option<TerminationSignal> {
        self.cause.get().copied()
    }

    /// A cloneable handle that disarms this source.
    pub fn disarm_handle(&self) -> Disarm {
        self.disarm.clone()
    }

    /// Stop intercepting and release the token. See [`Disarm::disarm`].
    pub fn disarm(&self) -> bool {
        self.disarm.disarm()
    }
}

impl Drop for CancellationSource {
    fn drop(&mut self) {
        self.disarm.disarm();
    }
}

async fn intercept<L: SignalListener>(
    mut listener: L,
    token: CancellationToken,
    stopped: CancellationToken,
    cause: Arc<OnceLock<TerminationSignal>>,
) {
    loop {
        tokio::select! {
            biased;
            _ = stopped.cancelled() => break,
            received = listener.recv() => match received {
                Some(signal) if token.is_cancelled() => {
                    debug!(signal = %signal, "termination signal received while already cancelled");
                }
                Some(signal) => {
                    let _ = cause.set(signal);
                    info!(signal = %signal, "termination signal received; cancelling");
                    token.cancel();
                }
                None => {
                    debug!("signal listener closed");
                    break;
                }
            },
        }
    }

    debug!("signal interception stopped");
}

/// Idempotent "stop intercepting" capability.
///
/// Disarming restores default signal handling before returning, then stops
/// the listener task and cancels the source's token. Only the first call has
/// any effect.
#[derive(Clone)]
pub struct Disarm {
    inner: Arc<DisarmInner>,
}

struct DisarmInner {
    done: AtomicBool,
    release: ReleaseHook,
    stopped: CancellationToken,
    token: CancellationToken,
}

impl fmt::Debug for Disarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disarm")
            .field("disarmed", &self.is_disarmed())
            .finish()
    }
}

impl Disarm {
    fn new(token: CancellationToken, release: ReleaseHook) -> Self {
        Self {
            inner: Arc::new(DisarmInner {
                done: AtomicBool::new(false),
                release,
                stopped: CancellationToken::new(),
                token,
            }),
        }
    }

    /// Returns `true` if this call performed the disarm.
    pub fn disarm(&self) -> bool {
        if self.inner.done.swap(true, Ordering::AcqRel) {
            return false;
        }

        debug!("disarming signal interception");
        (self.inner.release)();
        self.inner.stopped.cancel();
        self.inner.token.cancel();
        true
    }

    pub fn is_disarmed(&self) -> bool {
        self.inner.done.load(Ordering::Acquire)
    }

    /// Disarm when the returned guard goes out of scope.
    pub fn guard(&self) -> DisarmGuard {
        DisarmGuard {
            disarm: self.clone(),
        }
    }
}

/// Disarms on drop, on every exit path including unwinding.
#[derive(Debug)]
pub struct DisarmGuard {
    disarm: Disarm,
}

impl Drop for DisarmGuard {
    fn drop(&mut self) {
        self.disarm.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_hook() -> (ReleaseHook, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let hook: ReleaseHook = Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (hook, calls)
    }

    #[test]
    fn disarm_only_takes_effect_once() {
        let token = CancellationToken::new();
        let (hook, releases) = counting_hook();
        let disarm = Disarm::new(token.clone(), hook);
        let other = disarm.clone();

        assert!(!disarm.is_disarmed());
        assert!(disarm.disarm());
        assert!(!disarm.disarm());
        assert!(!other.disarm());
        assert!(other.is_disarmed());
        assert!(token.is_cancelled());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn release_happens_before_disarm_returns() {
        let token = CancellationToken::new();
        let (hook, releases) = counting_hook();
        let disarm = Disarm::new(token, hook);

        disarm.disarm();
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn guard_disarms_on_drop() {
        let token = CancellationToken::new();
        let (hook, _releases) = counting_hook();
        let disarm = Disarm::new(token.clone(), hook);

        {
            let _guard = disarm.guard();
            assert!(!token.is_cancelled());
        }

        assert!(disarm.is_disarmed());
        assert!(token.is_cancelled());
    }

    #[test]
    fn guard_disarms_while_unwinding() {
        let token = CancellationToken::new();
        let (hook, _releases) = counting_hook();
        let disarm = Disarm::new(token.clone(), hook);
        let guard = disarm.guard();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = guard;
            panic!("primary blew up");
        }));

        assert!(result.is_err());
        assert!(token.is_cancelled());
    }
}
