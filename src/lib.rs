// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod group;
pub mod logging;
pub mod runner;
pub mod signals;
pub mod tuning;

use std::error::Error as _;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::errors::{AppError, Result};
use crate::group::TaskGroup;
use crate::runner::{RunnerFactory, Wiring};
use crate::signals::{CancellationSource, SignalListener};

/// Boxed, `Send` future used at the crate's trait seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Exit status for a clean shutdown.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status for any failure.
pub const EXIT_FAILURE: i32 = 1;

/// High-level entry point used by `main.rs`.
///
/// Equivalent to [`run_with_parent`] with a parent token nobody else holds,
/// so only signals and the runner itself can end the run.
pub async fn run<F, L>(factory: &F, listener: L) -> Result<()>
where
    F: RunnerFactory + ?Sized,
    L: SignalListener,
{
    run_with_parent(factory, listener, &CancellationToken::new()).await
}

/// Arm signal interception, build the runner, and drive it to completion.
///
/// The run is a [`TaskGroup`] of two tasks sharing one token:
/// - `primary` runs the runner and disarms signal interception when it
///   returns, which also cancels the token;
/// - `janitor` waits for the token and then runs the cleanup.
///
/// Any of a termination signal, the primary returning, the primary failing,
/// or `parent` being cancelled cancels the token, so cleanup runs exactly
/// once on every path. A construction failure returns before the group
/// exists; there is nothing to clean up then.
pub async fn run_with_parent<F, L>(
    factory: &F,
    listener: L,
    parent: &CancellationToken,
) -> Result<()>
where
    F: RunnerFactory + ?Sized,
    L: SignalListener,
{
    // Disarms on drop, covering every return below.
    let source = CancellationSource::arm(parent, listener);
    let token = source.token();

    let Wiring {
        mut runner,
        cleanup,
    } = factory.build(&token).await?;
    debug!("runner constructed");

    let mut group = TaskGroup::new(&token);
    let ctx = group.token();

    let disarm = source.disarm_handle();
    let primary_ctx = ctx.clone();
    group.spawn("primary", async move {
        let _disarm = disarm.guard();
        runner.run(primary_ctx).await
    });

    group.spawn("janitor", async move {
        ctx.cancelled().await;
        debug!("shutdown triggered; running cleanup");
        cleanup.run();
        Ok(())
    });

    let outcome = group.wait().await;

    if let Some(signal) = source.cancelled_by() {
        info!(signal = %signal, "shutdown was requested by signal");
    }
    outcome
}

/// Map an outcome to a process exit status.
pub fn exit_status(outcome: &Result<()>) -> i32 {
    match outcome {
        Ok(()) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}

/// Emit the single terminal log record and return the exit status.
pub fn report(outcome: &Result<()>) -> i32 {
    match outcome {
        Ok(()) => info!("application exited"),
        Err(err) => error!(error = %describe(err), "application exited with error"),
    }
    exit_status(outcome)
}

/// Render an error with its whole source chain.
fn describe(err: &AppError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}
