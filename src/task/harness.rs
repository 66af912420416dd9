use super::registry::ProcessorRegistry;
use super::service::Service;
use super::state::TaskState;
use crate::block::MessageBlock;
use crate::config::TaskConfig;
use crate::error::{Error, Result};
use crate::queue::{PartitionedQueue, ProcessorIdFn, QueueStrategy, SingleQueue};
use crate::telemetry::{Metrics, MetricsSnapshot};
use crate::thread_mgr::{GroupHandle, ThreadMgr};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::ThreadId;
use std::time::Instant;

/// Worker-thread pool harness, generic over its queue backend.
///
/// A task owns its queue strategy by composition and a user [`Service`] for
/// the per-thread behavior. `activate` requests workers from the
/// [`ThreadMgr`] and returns without blocking for start-up; `wait` blocks a
/// controller thread until every worker has finished and the task is back in
/// `NotActivated`, ready for re-activation.
///
/// Call `wait` from a controller thread, never from inside `svc`. Dropping a
/// task that has not been waited on is a programming error and panics.
pub struct Task<Q: QueueStrategy, S: Service<Q>> {
    inner: Arc<TaskInner<Q, S>>,
}

/// Task fed by one shared FIFO.
pub type SingleQueueTask<S> = Task<SingleQueue, S>;

/// Task fed by per-worker partitions routed by hash key.
pub type PartitionedTask<S> = Task<PartitionedQueue, S>;

struct TaskInner<Q: QueueStrategy, S: Service<Q>> {
    service: S,
    queue: Q,
    control: Control,
    registry: Arc<ProcessorRegistry>,
    thread_mgr: Arc<ThreadMgr>,
    metrics: Metrics,
}

pub(crate) struct Control {
    lifecycle: Mutex<Lifecycle>,
    cond: Condvar,
}

impl Control {
    pub(crate) fn state(&self) -> TaskState {
        self.lifecycle.lock().state
    }
}

#[derive(Debug)]
struct Lifecycle {
    state: TaskState,
    thread_count: usize,
    starting: usize,
    in_svc: usize,
    finished: usize,
    next_processor_id: usize,
    aborted: bool,
    waiting: bool,
    cleanup_done: bool,
    group: Option<GroupHandle>,
    activator: Option<ThreadId>,
    epoch: u64,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            state: TaskState::NotActivated,
            thread_count: 0,
            starting: 0,
            in_svc: 0,
            finished: 0,
            next_processor_id: 0,
            aborted: false,
            waiting: false,
            cleanup_done: false,
            group: None,
            activator: None,
            epoch: 0,
        }
    }
}

/// Per-worker view handed to [`Service::svc`].
pub struct WorkerContext<'a, Q: QueueStrategy> {
    queue: &'a Q,
    control: &'a Control,
    processor_id: usize,
    thread_count: usize,
}

impl<'a, Q: QueueStrategy> WorkerContext<'a, Q> {
    /// This worker's stable index in `[0, thread_count)`.
    pub fn processor_id(&self) -> usize {
        self.processor_id
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn task_state(&self) -> TaskState {
        self.control.state()
    }

    /// True once a controller has entered `wait`; polling loops should
    /// drain and return.
    pub fn should_exit(&self) -> bool {
        self.task_state() == TaskState::Deactivating
    }

    pub fn queue(&self) -> &'a Q {
        self.queue
    }
}

impl<Q: QueueStrategy> fmt::Debug for WorkerContext<'_, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerContext")
            .field("processor_id", &self.processor_id)
            .field("thread_count", &self.thread_count)
            .finish()
    }
}

impl<Q: QueueStrategy, S: Service<Q>> Task<Q, S> {
    /// Task using the process-wide [`ThreadMgr`].
    pub fn new(service: S) -> Self {
        Self::with_thread_mgr(service, Arc::clone(ThreadMgr::global()))
    }

    pub fn with_thread_mgr(service: S, thread_mgr: Arc<ThreadMgr>) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                service,
                queue: Q::default(),
                control: Control {
                    lifecycle: Mutex::new(Lifecycle::default()),
                    cond: Condvar::new(),
                },
                registry: Arc::new(ProcessorRegistry::default()),
                thread_mgr,
                metrics: Metrics::new(),
            }),
        }
    }

    /// Spin up `threads` workers with default settings.
    pub fn activate(&self, threads: usize) -> Result<()> {
        self.activate_with(TaskConfig {
            threads: Some(threads),
            ..TaskConfig::default()
        })
    }

    /// Spin up a worker pool.
    ///
    /// Valid only in `NotActivated`. Returns as soon as all threads have
    /// been requested; callers needing the pool fully started poll
    /// [`task_state`](Task::task_state) or call [`wait`](Task::wait).
    /// Partial spawn failure rolls the task back to `NotActivated` and
    /// reports how many threads had been created.
    pub fn activate_with(&self, config: TaskConfig) -> Result<()> {
        config.validate()?;
        let threads = config.worker_threads();
        if threads == 0 {
            return Err(Error::config("thread count resolved to zero"));
        }

        let group;
        {
            let mut lc = self.inner.control.lifecycle.lock();
            if lc.state != TaskState::NotActivated {
                return Err(Error::AlreadyActivated);
            }
            lc.state = TaskState::Activating;
            lc.thread_count = threads;
            lc.starting = 0;
            lc.in_svc = 0;
            lc.finished = 0;
            lc.next_processor_id = 0;
            lc.aborted = false;
            lc.cleanup_done = false;
            lc.activator = Some(std::thread::current().id());
            lc.epoch += 1;
            group = self.inner.thread_mgr.create_group();
            lc.group = Some(group);
        }

        let registry = Arc::clone(&self.inner.registry);
        let processor_id: ProcessorIdFn = Arc::new(move || registry.current());
        self.inner.queue.init(threads, processor_id);
        self.inner.metrics.record_activation();

        for i in 0..threads {
            let inner = Arc::clone(&self.inner);
            let spawned = self.inner.thread_mgr.spawn_in_group(
                group,
                format!("{}-{}", config.thread_name_prefix, i),
                config.stack_size,
                config.priority,
                move || inner.run_worker(),
            );

            if spawned.is_err() {
                self.abort_activation(group);
                return Err(Error::ThreadCreationFailed {
                    requested: threads,
                    created: i,
                });
            }
            self.inner.metrics.record_thread_spawned();
        }

        Ok(())
    }

    /// Unwind a partially spawned pool: wake workers parked on the start
    /// barrier, join them, and return to `NotActivated`.
    fn abort_activation(&self, group: GroupHandle) {
        {
            let mut lc = self.inner.control.lifecycle.lock();
            lc.aborted = true;
            self.inner.control.cond.notify_all();
        }
        let _ = self.inner.thread_mgr.join_group(group);
        self.inner.registry.clear();

        let mut lc = self.inner.control.lifecycle.lock();
        lc.state = TaskState::NotActivated;
        lc.group = None;
    }

    /// Block until every worker has finished, then reclaim resources.
    ///
    /// Flips the task to `Deactivating` (the shutdown signal `svc` loops
    /// observe), waits for the last worker to run `cleanup`, joins the
    /// thread group, drains the queues, and returns the task to
    /// `NotActivated`. A no-op success when not activated; a concurrent
    /// `wait` is rejected with [`Error::WaitInProgress`].
    pub fn wait(&self) -> Result<()> {
        let group;
        {
            let mut lc = self.inner.control.lifecycle.lock();
            if lc.state == TaskState::NotActivated {
                return Ok(());
            }
            if lc.waiting {
                return Err(Error::WaitInProgress);
            }
            lc.waiting = true;
            lc.state = TaskState::Deactivating;
            self.inner.control.cond.notify_all();

            while !lc.cleanup_done {
                self.inner.control.cond.wait(&mut lc);
            }
            group = lc.group.take();
        }

        let joined = match group {
            Some(group) => self.inner.thread_mgr.join_group(group),
            None => Ok(()),
        };

        let discarded = self.inner.queue.clear();
        self.inner.metrics.record_blocks_discarded(discarded as u64);
        self.inner.registry.clear();

        {
            let mut lc = self.inner.control.lifecycle.lock();
            lc.state = TaskState::NotActivated;
            lc.waiting = false;
            lc.cleanup_done = false;
        }

        joined
    }

    pub fn is_activated(&self) -> bool {
        self.task_state() == TaskState::Activated
    }

    pub fn task_state(&self) -> TaskState {
        self.inner.control.state()
    }

    /// Handle of the current activation's thread group, if any.
    pub fn thread_group_handle(&self) -> Option<GroupHandle> {
        self.inner.control.lifecycle.lock().group
    }

    /// How many times this task has been activated.
    pub fn activation_epoch(&self) -> u64 {
        self.inner.control.lifecycle.lock().epoch
    }

    pub fn queue(&self) -> &Q {
        &self.inner.queue
    }

    /// Unprocessed blocks across the queue backend.
    pub fn message_size(&self) -> usize {
        self.inner.queue.total_len()
    }

    pub fn thread_mgr(&self) -> &Arc<ThreadMgr> {
        &self.inner.thread_mgr
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }
}

impl<S: Service<SingleQueue>> Task<SingleQueue, S> {
    pub fn push(&self, block: MessageBlock) {
        self.inner.queue.push(block);
    }
}

impl<S: Service<PartitionedQueue>> Task<PartitionedQueue, S> {
    /// Route `block` to the worker owning `hash_key % thread_count`.
    pub fn push(&self, hash_key: u64, block: MessageBlock) -> Result<()> {
        self.inner.queue.push(hash_key, block)
    }
}

impl<Q: QueueStrategy, S: Service<Q>> TaskInner<Q, S> {
    /// Entry routine of every worker thread.
    fn run_worker(&self) {
        let processor_id;
        let thread_count;
        {
            let mut lc = self.control.lifecycle.lock();
            processor_id = lc.next_processor_id;
            lc.next_processor_id += 1;
            thread_count = lc.thread_count;
            self.registry.assign_current(processor_id);

            lc.starting += 1;
            if lc.starting == lc.thread_count && lc.state == TaskState::Activating {
                lc.state = TaskState::Activated;
                self.control.cond.notify_all();
            }

            // hold every worker here until the pool is fully started, so
            // svc never observes Activating
            while lc.state == TaskState::Activating && !lc.aborted {
                self.control.cond.wait(&mut lc);
            }
            if lc.aborted {
                return;
            }
            lc.in_svc += 1;
        }

        let started = Instant::now();
        let ctx = WorkerContext {
            queue: &self.queue,
            control: &self.control,
            processor_id,
            thread_count,
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| self.service.svc(&ctx)));
        self.metrics
            .record_svc_runtime(started.elapsed().as_nanos() as u64);
        if outcome.is_err() {
            self.metrics.record_svc_panic();
            eprintln!("worker {} panicked in svc", processor_id);
        }

        let last_one_standing;
        {
            let mut lc = self.control.lifecycle.lock();
            lc.in_svc -= 1;
            lc.finished += 1;
            last_one_standing = lc.finished == lc.thread_count;
        }

        if last_one_standing {
            let outcome = catch_unwind(AssertUnwindSafe(|| self.service.cleanup(&self.queue)));
            if outcome.is_err() {
                eprintln!("worker {} panicked in cleanup", processor_id);
            }

            let mut lc = self.control.lifecycle.lock();
            lc.cleanup_done = true;
            self.control.cond.notify_all();
        }
    }
}

impl<Q: QueueStrategy, S: Service<Q>> Drop for Task<Q, S> {
    fn drop(&mut self) {
        let state = self.task_state();
        if state != TaskState::NotActivated && !std::thread::panicking() {
            panic!("task dropped while {}; call wait() before dropping", state);
        }
    }
}

impl<Q: QueueStrategy, S: Service<Q>> fmt::Debug for Task<Q, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lc = self.inner.control.lifecycle.lock();
        f.debug_struct("Task")
            .field("state", &lc.state)
            .field("thread_count", &lc.thread_count)
            .field("in_svc", &lc.in_svc)
            .field("epoch", &lc.epoch)
            .field("activator", &lc.activator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingService {
        popped: Arc<AtomicUsize>,
        cleanups: Arc<AtomicUsize>,
    }

    impl Service<SingleQueue> for CountingService {
        fn svc(&self, ctx: &WorkerContext<'_, SingleQueue>) {
            assert_eq!(ctx.task_state(), TaskState::Activated);
            loop {
                match ctx.queue().timed_pop(Duration::from_millis(10)) {
                    Some(_block) => {
                        self.popped.fetch_add(1, Ordering::SeqCst);
                    }
                    None if ctx.should_exit() => break,
                    None => continue,
                }
            }
        }

        fn cleanup(&self, _queue: &SingleQueue) {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting_task() -> (SingleQueueTask<CountingService>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let popped = Arc::new(AtomicUsize::new(0));
        let cleanups = Arc::new(AtomicUsize::new(0));
        let task = Task::new(CountingService {
            popped: Arc::clone(&popped),
            cleanups: Arc::clone(&cleanups),
        });
        (task, popped, cleanups)
    }

    #[test]
    fn test_activate_wait_roundtrip() {
        let (task, popped, cleanups) = counting_task();
        assert_eq!(task.task_state(), TaskState::NotActivated);

        task.activate(2).unwrap();
        for _ in 0..100 {
            task.push(MessageBlock::from_slice(b"x"));
        }
        task.wait().unwrap();

        assert_eq!(task.task_state(), TaskState::NotActivated);
        assert_eq!(popped.load(Ordering::SeqCst), 100);
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
        assert_eq!(task.message_size(), 0);
    }

    #[test]
    fn test_double_activate_rejected() {
        let (task, _popped, _cleanups) = counting_task();
        task.activate(1).unwrap();

        assert!(matches!(task.activate(1), Err(Error::AlreadyActivated)));
        task.wait().unwrap();
    }

    #[test]
    fn test_wait_without_activate_is_noop() {
        let (task, _popped, cleanups) = counting_task();
        task.wait().unwrap();
        assert_eq!(cleanups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reactivation_bumps_epoch() {
        let (task, _popped, cleanups) = counting_task();
        for expected in 1..=3 {
            task.activate(2).unwrap();
            task.wait().unwrap();
            assert_eq!(task.activation_epoch(), expected);
            assert_eq!(cleanups.load(Ordering::SeqCst), expected as usize);
        }
    }

    #[test]
    fn test_group_handle_scoped_to_activation() {
        let (task, _popped, _cleanups) = counting_task();
        assert!(task.thread_group_handle().is_none());

        task.activate(1).unwrap();
        assert!(task.thread_group_handle().is_some());

        task.wait().unwrap();
        assert!(task.thread_group_handle().is_none());
    }

    #[test]
    #[should_panic(expected = "call wait() before dropping")]
    fn test_drop_while_activated_panics() {
        struct Brief;

        impl Service<SingleQueue> for Brief {
            fn svc(&self, _ctx: &WorkerContext<'_, SingleQueue>) {}
            fn cleanup(&self, _queue: &SingleQueue) {}
        }

        let task = SingleQueueTask::new(Brief);
        task.activate(1).unwrap();
        drop(task);
    }
}
