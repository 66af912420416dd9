//! Task lifecycle harness.
//!
//! This module provides the worker-pool state machine, the service
//! capability trait, and the per-activation processor-id registry.

mod registry;

pub mod harness;
pub mod service;
pub mod state;

pub use harness::{PartitionedTask, SingleQueueTask, Task, WorkerContext};
pub use service::Service;
pub use state::TaskState;
