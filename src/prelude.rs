pub use crate::block::MessageBlock;
pub use crate::config::{TaskConfig, TaskConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::pool::{BlockPool, BufferPool};
pub use crate::queue::{BlockingQueue, PartitionedQueue, QueueStrategy, SingleQueue};
pub use crate::task::{PartitionedTask, Service, SingleQueueTask, Task, TaskState, WorkerContext};
pub use crate::thread_mgr::{GroupHandle, ThreadMgr, ThreadPriority};

#[cfg(feature = "telemetry")]
pub use crate::telemetry::{Metrics, MetricsSnapshot};
