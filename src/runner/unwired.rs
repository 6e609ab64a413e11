// src/runner/unwired.rs

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::BoxFuture;
use crate::errors::ConstructionError;

use super::{RunnerFactory, Wiring};

/// Placeholder factory: no service has been wired into this binary yet.
///
/// Always fails with [`ConstructionError::NotWired`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Unwired;

impl RunnerFactory for Unwired {
    fn build<'a>(
        &'a self,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Wiring, ConstructionError>> {
        Box::pin(async {
            warn!("no runner has been wired into this binary");
            Err(ConstructionError::NotWired)
        })
    }
}
