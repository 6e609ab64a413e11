use proptest::prelude::*;

use lifeline::tuning::{resolve_worker_threads, WorkerSource};

proptest! {
    #[test]
    fn quota_sizing_stays_within_bounds(
        quota in 0.01f64..512.0,
        available in 1usize..256,
    ) {
        let workers = resolve_worker_threads(None, true, Some(quota), available);
        prop_assert_eq!(workers.source, WorkerSource::CpuQuota);
        prop_assert!(workers.count >= 1);
        prop_assert!(workers.count <= available);
        prop_assert!(workers.count as f64 <= quota.max(1.0));
    }

    #[test]
    fn explicit_count_is_never_adjusted(
        configured in 1usize..4096,
        quota in proptest::option::of(0.01f64..512.0),
        respect in any::<bool>(),
        available in 0usize..256,
    ) {
        let workers = resolve_worker_threads(Some(configured), respect, quota, available);
        prop_assert_eq!(workers.count, configured);
        prop_assert_eq!(workers.source, WorkerSource::Configured);
    }

    #[test]
    fn without_quota_uses_available_parallelism(
        respect in any::<bool>(),
        available in 0usize..256,
    ) {
        let workers = resolve_worker_threads(None, respect, None, available);
        prop_assert_eq!(workers.count, available.max(1));
        prop_assert_eq!(workers.source, WorkerSource::Available);
    }
}
