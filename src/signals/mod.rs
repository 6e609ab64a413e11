// src/signals/mod.rs

//! OS termination signals turned into a one-shot cancellation.
//!
//! - [`listener`] defines the [`SignalListener`] seam and the production
//!   [`OsSignals`] implementation.
//! - [`source`] owns the armed state: [`CancellationSource`] binds a listener
//!   to a child `CancellationToken`, and [`Disarm`] stops interception.
//!
//! Only two signals are recognised: interrupt (SIGINT / Ctrl-C) and
//! terminate (SIGTERM). Everything else keeps its default disposition.

use std::fmt;

pub mod listener;
pub mod source;

pub use listener::{OsSignals, ReleaseHook, SignalListener};
pub use source::{CancellationSource, Disarm, DisarmGuard};

/// A termination request delivered by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationSignal {
    /// SIGINT, or Ctrl-C on non-unix platforms.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl TerminationSignal {
    /// The full recognised set, in registration order.
    pub const ALL: [TerminationSignal; 2] =
        [TerminationSignal::Interrupt, TerminationSignal::Terminate];

    pub fn name(self) -> &'static str {
        match self {
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Terminate => "SIGTERM",
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
