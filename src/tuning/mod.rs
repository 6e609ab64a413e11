// src/tuning/mod.rs

//! Runtime sizing from the container's CPU quota.
//!
//! Decides how many tokio worker threads to start:
//! 1. an explicit `worker_threads` (CLI or `[runtime]`) wins;
//! 2. otherwise, with `respect_cpu_quota`, the cgroup quota rounded down
//!    (at least 1, at most the available parallelism);
//! 3. otherwise the available parallelism.
//!
//! There is no global to restore afterwards: the sizing lives in the
//! runtime built by [`build_runtime`], and dropping that runtime releases it.

use std::fmt;
use std::path::Path;

use tokio::runtime::{Builder, Runtime};
use tracing::info;

use crate::config::RuntimeSection;
use crate::errors::EnvironmentSetupError;

pub mod cgroup;

pub use cgroup::{DEFAULT_CGROUP_ROOT, read_cpu_quota};

/// Where a worker count came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerSource {
    Configured,
    CpuQuota,
    Available,
}

impl fmt::Display for WorkerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerSource::Configured => "configured",
            WorkerSource::CpuQuota => "cpu quota",
            WorkerSource::Available => "available parallelism",
        };
        f.write_str(s)
    }
}

/// Resolved runtime sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerThreads {
    pub count: usize,
    pub source: WorkerSource,
}

/// Pure sizing decision; see the module docs for the precedence.
pub fn resolve_worker_threads(
    configured: Option<usize>,
    respect_cpu_quota: bool,
    quota: Option<f64>,
    available: usize,
) -> WorkerThreads {
    let available = available.max(1);

    if let Some(count) = configured {
        return WorkerThreads {
            count,
            source: WorkerSource::Configured,
        };
    }

    match quota {
        Some(cpus) if respect_cpu_quota => WorkerThreads {
            count: (cpus.floor() as usize).clamp(1, available),
            source: WorkerSource::CpuQuota,
        },
        _ => WorkerThreads {
            count: available,
            source: WorkerSource::Available,
        },
    }
}

/// Read the quota under `cgroup_root` (when it matters) and size the runtime.
pub fn tune(
    runtime: &RuntimeSection,
    cgroup_root: &Path,
) -> Result<WorkerThreads, EnvironmentSetupError> {
    let quota = if runtime.worker_threads.is_none() && runtime.respect_cpu_quota {
        read_cpu_quota(cgroup_root)?
    } else {
        None
    };
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    let workers = resolve_worker_threads(
        runtime.worker_threads,
        runtime.respect_cpu_quota,
        quota,
        available,
    );
    info!(
        worker_threads = workers.count,
        source = %workers.source,
        ?quota,
        available,
        "runtime sized"
    );
    Ok(workers)
}

/// Build the multi-threaded runtime the lifecycle runs on.
pub fn build_runtime(workers: WorkerThreads) -> Result<Runtime, EnvironmentSetupError> {
    Builder::new_multi_thread()
        .worker_threads(workers.count)
        .thread_name("lifeline-worker")
        .enable_all()
        .build()
        .map_err(EnvironmentSetupError::Runtime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_count_wins() {
        let w = resolve_worker_threads(Some(3), true, Some(1.0), 8);
        assert_eq!(w.count, 3);
        assert_eq!(w.source, WorkerSource::Configured);
    }

    #[test]
    fn fractional_quota_rounds_down_to_at_least_one() {
        assert_eq!(resolve_worker_threads(None, true, Some(2.7), 8).count, 2);
        assert_eq!(resolve_worker_threads(None, true, Some(0.5), 8).count, 1);
    }

    #[test]
    fn quota_is_capped_by_available_cpus() {
        let w = resolve_worker_threads(None, true, Some(64.0), 4);
        assert_eq!(w.count, 4);
        assert_eq!(w.source, WorkerSource::CpuQuota);
    }

    #[test]
    fn quota_ignored_when_not_respected() {
        let w = resolve_worker_threads(None, false, Some(2.0), 6);
        assert_eq!(w.count, 6);
        assert_eq!(w.source, WorkerSource::Available);
    }

    #[test]
    fn explicit_count_skips_cgroup_files() {
        // The directory does not exist; an explicit count must not read it.
        let runtime = RuntimeSection {
            worker_threads: Some(2),
            respect_cpu_quota: true,
        };
        let w = tune(&runtime, Path::new("/nonexistent/cgroup/root")).unwrap();
        assert_eq!(w.count, 2);
    }
}
