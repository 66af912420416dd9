//! Message queue backends feeding a task's worker threads.
//!
//! Two strategies are provided: [`SingleQueue`] (one shared FIFO, workers
//! contend) and [`PartitionedQueue`] (one FIFO per worker, pushes routed by
//! hash key, pops routed by the calling worker's processor id).

pub mod blocking;
pub mod partitioned;
pub mod single;

pub use blocking::BlockingQueue;
pub use partitioned::PartitionedQueue;
pub use single::SingleQueue;

use std::sync::Arc;

/// Resolves the calling thread's processor id, `None` when the thread has no
/// assigned slot. Bound once per activation by the task harness.
pub type ProcessorIdFn = Arc<dyn Fn() -> Option<usize> + Send + Sync>;

/// What the task harness needs from a queue backend, independent of how
/// pushes and pops are addressed.
pub trait QueueStrategy: Default + Send + Sync + 'static {
    /// Build (or rebuild) the backing queues for a pool of `thread_count`
    /// workers. Called by the harness on every activation.
    fn init(&self, thread_count: usize, processor_id: ProcessorIdFn);

    /// Blocks currently queued across all backing queues.
    fn total_len(&self) -> usize;

    /// Drain and release every queued block; returns the count discarded.
    fn clear(&self) -> usize;
}
