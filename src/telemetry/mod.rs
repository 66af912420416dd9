//! Optional runtime counters for task activity.
//!
//! Enabled by the `telemetry` cargo feature; without it the collector is a
//! zero-cost stub with the same surface.

#[cfg(feature = "telemetry")]
pub mod metrics;

#[cfg(feature = "telemetry")]
pub use metrics::{Metrics, MetricsSnapshot};

// Stub implementations when telemetry is disabled
#[cfg(not(feature = "telemetry"))]
pub mod metrics {
    use std::time::Duration;

    #[derive(Debug, Clone, Default)]
    pub struct Metrics;

    impl Metrics {
        pub fn new() -> Self {
            Self
        }
        pub fn record_activation(&self) {}
        pub fn record_thread_spawned(&self) {}
        pub fn record_svc_panic(&self) {}
        pub fn record_svc_runtime(&self, _nanos: u64) {}
        pub fn record_blocks_discarded(&self, _count: u64) {}
        pub fn snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot::default()
        }
    }

    #[derive(Debug, Clone, Default)]
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
}

#[cfg(not(feature = "telemetry"))]
pub use metrics::{Metrics, MetricsSnapshot};
