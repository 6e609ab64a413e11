// src/signals/listener.rs

//! Pluggable signal listener abstraction.
//!
//! [`CancellationSource`](super::CancellationSource) talks to a
//! `SignalListener` instead of raw tokio signal streams, so tests can inject
//! signals without touching the process disposition.

use std::sync::Arc;

use crate::BoxFuture;

use super::TerminationSignal;

/// Stops interception when called. Runs synchronously on the disarming
/// thread, so it must only flip state, never block.
pub type ReleaseHook = Arc<dyn Fn() + Send + Sync>;

/// Source of termination signals.
pub trait SignalListener: Send + 'static {
    /// Wait for the next termination signal.
    ///
    /// `None` means no further signals can be delivered.
    fn recv(&mut self) -> BoxFuture<'_, Option<TerminationSignal>>;

    /// Hook that stops intercepting. Signals delivered after it has run get
    /// the default OS behaviour (normally: terminate the process).
    fn release_hook(&self) -> ReleaseHook;
}

#[cfg(unix)]
mod imp {
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::flag;
    use tokio::signal::unix::{Signal, SignalKind, signal};
    use tracing::debug;

    use super::{ReleaseHook, SignalListener, TerminationSignal};
    use crate::BoxFuture;

    /// Listener for SIGINT and SIGTERM backed by tokio signal streams.
    ///
    /// Tokio never uninstalls its handlers, so on top of the streams a
    /// conditional default action is registered per signal. It stays inert
    /// until the [release hook](SignalListener::release_hook) flips
    /// `restore_default`, after which the next delivery terminates the
    /// process as if no handler had ever been installed.
    pub struct OsSignals {
        interrupt: Signal,
        terminate: Signal,
        restore_default: Arc<AtomicBool>,
    }

    impl OsSignals {
        /// Register handlers. Must be called from within a tokio runtime.
        pub fn new() -> io::Result<Self> {
            let restore_default = Arc::new(AtomicBool::new(false));
            for sig in [SIGINT, SIGTERM] {
                flag::register_conditional_default(sig, Arc::clone(&restore_default))?;
            }

            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
                restore_default,
            })
        }
    }

    impl SignalListener for OsSignals {
        fn recv(&mut self) -> BoxFuture<'_, Option<TerminationSignal>> {
            let Self {
                interrupt,
                terminate,
                ..
            } = self;

            Box::pin(async move {
                tokio::select! {
                    Some(()) = interrupt.recv() => Some(TerminationSignal::Interrupt),
                    Some(()) = terminate.recv() => Some(TerminationSignal::Terminate),
                    else => None,
                }
            })
        }

        fn release_hook(&self) -> ReleaseHook {
            let restore_default = Arc::clone(&self.restore_default);
            Arc::new(move || {
                restore_default.store(true, Ordering::SeqCst);
                debug!("default disposition restored for SIGINT and SIGTERM");
            })
        }
    }
}

#[cfg(not(unix))]
mod imp {
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::{ReleaseHook, SignalListener, TerminationSignal};
    use crate::BoxFuture;

    /// Ctrl-C listener for platforms without unix signals.
    ///
    /// Releasing only stops reporting: the console handler stays installed
    /// until the process exits.
    pub struct OsSignals {
        released: Arc<AtomicBool>,
    }

    impl OsSignals {
        pub fn new() -> io::Result<Self> {
            Ok(Self {
                released: Arc::new(AtomicBool::new(false)),
            })
        }
    }

    impl SignalListener for OsSignals {
        fn recv(&mut self) -> BoxFuture<'_, Option<TerminationSignal>> {
            Box::pin(async move {
                if self.released.load(Ordering::SeqCst) {
                    return None;
                }
                match tokio::signal::ctrl_c().await {
                    Ok(()) => Some(TerminationSignal::Interrupt),
                    Err(_) => None,
                }
            })
        }

        fn release_hook(&self) -> ReleaseHook {
            let released = Arc::clone(&self.released);
            Arc::new(move || released.store(true, Ordering::SeqCst))
        }
    }
}

pub use imp::OsSignals;
