use super::harness::WorkerContext;
use crate::queue::QueueStrategy;

/// User-supplied behavior run by a task's worker pool.
///
/// Every worker thread executes its own invocation of [`svc`]; the harness
/// does not serialize them. `svc` is expected to self-terminate, typically
/// by polling with a timed pop and checking [`WorkerContext::should_exit`]
/// or an application sentinel.
///
/// [`svc`]: Service::svc
pub trait Service<Q: QueueStrategy>: Send + Sync + 'static {
    /// Per-thread service loop.
    fn svc(&self, ctx: &WorkerContext<'_, Q>);

    /// Invoked exactly once per activation, by the last worker to return
    /// from [`svc`](Service::svc), before `wait` unblocks.
    fn cleanup(&self, queue: &Q);
}
