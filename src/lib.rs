//! STRAND - Serialized Task Routing AND Dispatch
//!
//! A worker-thread task harness with pluggable message-queue backends, the
//! execution substrate for services that process owned byte buffers on a
//! pool of OS threads.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use strand_rs::prelude::*;
//!
//! struct Echo;
//!
//! impl Service<SingleQueue> for Echo {
//!     fn svc(&self, ctx: &WorkerContext<'_, SingleQueue>) {
//!         loop {
//!             match ctx.queue().timed_pop(Duration::from_millis(20)) {
//!                 Some(block) => println!("got {} bytes", block.readable_size()),
//!                 None if ctx.should_exit() => break,
//!                 None => continue,
//!             }
//!         }
//!     }
//!
//!     fn cleanup(&self, _queue: &SingleQueue) {}
//! }
//!
//! fn main() -> strand_rs::Result<()> {
//!     let task = SingleQueueTask::new(Echo);
//!     task.activate(4)?;
//!
//!     task.push(MessageBlock::from_slice(b"hello"));
//!
//!     task.wait()
//! }
//! ```
//!
//! # Features
//!
//! - **Lifecycle barriers**: every worker observes the pool fully started
//!   before entering `svc`; the last worker out runs `cleanup` exactly once
//! - **Single shared queue**: FIFO fan-out across the pool
//! - **Partitioned queues**: hash-key routing with per-key ordering and
//!   processor-affine consumption
//! - **Blocking, timed, and non-blocking pops**: timeouts are values, not
//!   errors, so polling loops stay cheap
//! - **Pool-aware buffers**: released blocks hand their storage back to
//!   their pool instead of freeing it
//! - **Telemetry**: activity counters and svc latency histogram (optional)

// Lint configuration
#![warn(missing_debug_implementations)]

pub mod block;
pub mod config;
pub mod error;
pub mod pool;
pub mod prelude;
pub mod queue;
pub mod task;
pub mod telemetry;
pub mod thread_mgr;
pub mod util;

// Re-export key types at crate root
pub use block::MessageBlock;
pub use config::{TaskConfig, TaskConfigBuilder};
pub use error::{Error, Result};
pub use queue::{BlockingQueue, PartitionedQueue, QueueStrategy, SingleQueue};
pub use task::{PartitionedTask, Service, SingleQueueTask, Task, TaskState, WorkerContext};
pub use thread_mgr::{GroupHandle, ThreadMgr, ThreadPriority};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct Drain {
        seen: Arc<AtomicUsize>,
    }

    impl Service<SingleQueue> for Drain {
        fn svc(&self, ctx: &WorkerContext<'_, SingleQueue>) {
            loop {
                match ctx.queue().timed_pop(Duration::from_millis(5)) {
                    Some(_) => {
                        self.seen.fetch_add(1, Ordering::SeqCst);
                    }
                    None if ctx.should_exit() => break,
                    None => continue,
                }
            }
        }

        fn cleanup(&self, _queue: &SingleQueue) {}
    }

    #[test]
    fn test_basic_roundtrip() {
        let seen = Arc::new(AtomicUsize::new(0));
        let task = SingleQueueTask::new(Drain {
            seen: Arc::clone(&seen),
        });

        task.activate(2).unwrap();
        for _ in 0..64 {
            task.push(MessageBlock::from_slice(b"payload"));
        }
        task.wait().unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 64);
        assert_eq!(task.task_state(), TaskState::NotActivated);
    }
}
