//! Metrics collection for task monitoring.

use hdrhistogram::Histogram;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Per-task metrics collector.
#[derive(Debug)]
pub struct Metrics {
    activations: AtomicU64,
    threads_spawned: AtomicU64,
    svc_panics: AtomicU64,
    blocks_discarded: AtomicU64,

    // per-worker svc wall time, in nanoseconds
    svc_runtime: RwLock<Histogram<u64>>,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        // 3 significant figures, values up to one hour in nanoseconds
        let histogram =
            Histogram::new_with_max(3_600_000_000_000, 3).expect("failed to create histogram");

        Self {
            activations: AtomicU64::new(0),
            threads_spawned: AtomicU64::new(0),
            svc_panics: AtomicU64::new(0),
            blocks_discarded: AtomicU64::new(0),
            svc_runtime: RwLock::new(histogram),
            start_time: Instant::now(),
        }
    }

    pub fn record_activation(&self) {
        self.activations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_thread_spawned(&self) {
        self.threads_spawned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_svc_panic(&self) {
        self.svc_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_svc_runtime(&self, nanos: u64) {
        if let Some(mut histogram) = self.svc_runtime.try_write() {
            let _ = histogram.record(nanos);
        }
    }

    pub fn record_blocks_discarded(&self, count: u64) {
        self.blocks_discarded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let histogram = self.svc_runtime.read();

        MetricsSnapshot {
            uptime: self.start_time.elapsed(),
            activations: self.activations.load(Ordering::Relaxed),
            threads_spawned: self.threads_spawned.load(Ordering::Relaxed),
            svc_panics: self.svc_panics.load(Ordering::Relaxed),
            blocks_discarded: self.blocks_discarded.load(Ordering::Relaxed),
            avg_svc_ns: histogram.mean() as u64,
            p50_svc_ns: histogram.value_at_quantile(0.5),
            p99_svc_ns: histogram.value_at_quantile(0.99),
            max_svc_ns: histogram.max(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of a task's counters.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub activations: u64,
    pub threads_spawned: u64,
    pub svc_panics: u64,
    pub blocks_discarded: u64,
    pub avg_svc_ns: u64,
    pub p50_svc_ns: u64,
    pub p99_svc_ns: u64,
    pub max_svc_ns: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = Metrics::new();
        metrics.record_activation();
        metrics.record_thread_spawned();
        metrics.record_thread_spawned();
        metrics.record_svc_panic();
        metrics.record_blocks_discarded(7);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.activations, 1);
        assert_eq!(snapshot.threads_spawned, 2);
        assert_eq!(snapshot.svc_panics, 1);
        assert_eq!(snapshot.blocks_discarded, 7);
    }

    #[test]
    fn test_svc_runtime_histogram() {
        let metrics = Metrics::new();
        metrics.record_svc_runtime(1_000);
        metrics.record_svc_runtime(2_000);
        metrics.record_svc_runtime(3_000);

        let snapshot = metrics.snapshot();
        assert!(snapshot.max_svc_ns >= 2_900);
        assert!(snapshot.avg_svc_ns > 0);
    }
}
