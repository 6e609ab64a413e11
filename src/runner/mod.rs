// src/runner/mod.rs

//! The service seam.
//!
//! A [`Runner`] is whatever the process exists to do. It is built, together
//! with its [`Cleanup`], by a [`RunnerFactory`]. The lifecycle code never
//! looks inside either; it only drives `run` and guarantees cleanup.
//!
//! - [`cleanup`] holds the run-once cleanup action.
//! - [`unwired`] is the factory used until real wiring exists.

use std::fmt;
use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::BoxFuture;
use crate::errors::ConstructionError;

pub mod cleanup;
pub mod unwired;

pub use cleanup::Cleanup;
pub use unwired::Unwired;

/// A long-running operation that stops when `cancel` fires or when it fails.
///
/// Implementations must return promptly once the token is cancelled:
/// `Ok(())` for a voluntary stop, `Err` for a failure. The return value is
/// the only result channel.
pub trait Runner: Send {
    fn run(&mut self, cancel: CancellationToken) -> BoxFuture<'_, anyhow::Result<()>>;
}

impl<R: Runner + ?Sized> Runner for Box<R> {
    fn run(&mut self, cancel: CancellationToken) -> BoxFuture<'_, anyhow::Result<()>> {
        (**self).run(cancel)
    }
}

/// Everything a successful factory hands back.
pub struct Wiring {
    pub runner: Box<dyn Runner>,
    pub cleanup: Cleanup,
}

impl Wiring {
    pub fn new(runner: impl Runner + 'static, cleanup: Cleanup) -> Self {
        Self {
            runner: Box::new(runner),
            cleanup,
        }
    }
}

impl fmt::Debug for Wiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wiring")
            .field("cleanup", &self.cleanup)
            .finish_non_exhaustive()
    }
}

/// Builds a [`Runner`] and its cleanup.
///
/// A factory that fails returns no cleanup: anything it acquired before
/// failing is its own business to release.
pub trait RunnerFactory: Send + Sync {
    fn build<'a>(
        &'a self,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Wiring, ConstructionError>>;
}

/// Adapts a closure into a [`Runner`].
pub struct RunnerFn<F> {
    f: F,
}

impl<F, Fut> RunnerFn<F>
where
    F: FnMut(CancellationToken) -> Fut + Send,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, Fut> Runner for RunnerFn<F>
where
    F: FnMut(CancellationToken) -> Fut + Send,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn run(&mut self, cancel: CancellationToken) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin((self.f)(cancel))
    }
}
