//! Thread creation and group tracking for task worker pools.
//!
//! Tasks never spawn OS threads directly; they request them from a
//! [`ThreadMgr`], which names the thread, applies stack size and priority,
//! and records the join handle under the requesting task's group.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

/// Identifier of a set of threads spawned for one activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadPriority {
    Idle,
    BelowNormal,
    Normal,
    AboveNormal,
    Critical,
}

impl Default for ThreadPriority {
    fn default() -> Self {
        ThreadPriority::Normal
    }
}

#[cfg(target_os = "linux")]
impl ThreadPriority {
    fn nice_value(self) -> i32 {
        match self {
            ThreadPriority::Idle => 19,
            ThreadPriority::BelowNormal => 10,
            ThreadPriority::Normal => 0,
            ThreadPriority::AboveNormal => -5,
            ThreadPriority::Critical => -10,
        }
    }
}

#[cfg(target_os = "linux")]
fn apply_priority(priority: ThreadPriority) {
    let nice = priority.nice_value();
    if nice == 0 {
        return;
    }

    // Raising priority (negative nice) needs CAP_SYS_NICE; best effort.
    let result = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, nice) };
    if result != 0 {
        eprintln!(
            "failed to set priority of thread {} (nice {})",
            thread::current().name().unwrap_or("unknown"),
            nice
        );
    }
}

#[cfg(not(target_os = "linux"))]
fn apply_priority(_priority: ThreadPriority) {}

/// Spawns and joins worker threads, grouped per activation.
#[derive(Debug)]
pub struct ThreadMgr {
    groups: Mutex<HashMap<GroupHandle, Vec<JoinHandle<()>>>>,
    next_group: AtomicU64,
    max_threads: Option<usize>,
}

impl ThreadMgr {
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(HashMap::new()),
            next_group: AtomicU64::new(1),
            max_threads: None,
        }
    }

    /// Manager that refuses to track more than `max_threads` live threads.
    pub fn with_limit(max_threads: usize) -> Self {
        Self {
            max_threads: Some(max_threads),
            ..Self::new()
        }
    }

    /// Process-wide shared instance.
    pub fn global() -> &'static Arc<ThreadMgr> {
        static GLOBAL: OnceLock<Arc<ThreadMgr>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(ThreadMgr::new()))
    }

    pub fn create_group(&self) -> GroupHandle {
        let handle = GroupHandle(self.next_group.fetch_add(1, Ordering::Relaxed));
        self.groups.lock().insert(handle, Vec::new());
        handle
    }

    /// Spawn a thread and record it under `group`.
    pub fn spawn_in_group<F>(
        &self,
        group: GroupHandle,
        name: String,
        stack_size: Option<usize>,
        priority: ThreadPriority,
        f: F,
    ) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let groups = self.groups.lock();
            if !groups.contains_key(&group) {
                return Err(Error::UnknownThreadGroup);
            }
            if let Some(max) = self.max_threads {
                let live: usize = groups.values().map(Vec::len).sum();
                if live >= max {
                    return Err(Error::ThreadLimitReached(max));
                }
            }
        }

        let mut builder = thread::Builder::new().name(name);
        if let Some(size) = stack_size {
            builder = builder.stack_size(size);
        }

        let handle = builder.spawn(move || {
            apply_priority(priority);
            f();
        })?;

        self.groups
            .lock()
            .get_mut(&group)
            .ok_or(Error::UnknownThreadGroup)?
            .push(handle);
        Ok(())
    }

    /// Join every thread in `group` and forget the group.
    pub fn join_group(&self, group: GroupHandle) -> Result<()> {
        let handles = self
            .groups
            .lock()
            .remove(&group)
            .ok_or(Error::UnknownThreadGroup)?;

        for handle in handles {
            // worker panics are already isolated inside the entry routine
            let _ = handle.join();
        }
        Ok(())
    }

    /// Threads currently tracked under `group`.
    pub fn group_size(&self, group: GroupHandle) -> usize {
        self.groups.lock().get(&group).map_or(0, Vec::len)
    }
}

impl Default for ThreadMgr {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_spawn_and_join_group() {
        let mgr = ThreadMgr::new();
        let group = mgr.create_group();
        let counter = Arc::new(AtomicUsize::new(0));

        for i in 0..4 {
            let counter = Arc::clone(&counter);
            mgr.spawn_in_group(
                group,
                format!("test-{}", i),
                None,
                ThreadPriority::Normal,
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                },
            )
            .unwrap();
        }

        assert_eq!(mgr.group_size(group), 4);
        mgr.join_group(group).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert_eq!(mgr.group_size(group), 0);
    }

    #[test]
    fn test_unknown_group_rejected() {
        let mgr = ThreadMgr::new();
        let result = mgr.spawn_in_group(
            GroupHandle(999),
            "orphan".to_string(),
            None,
            ThreadPriority::Normal,
            || {},
        );
        assert!(matches!(result, Err(Error::UnknownThreadGroup)));
        assert!(matches!(
            mgr.join_group(GroupHandle(999)),
            Err(Error::UnknownThreadGroup)
        ));
    }

    #[test]
    fn test_thread_limit() {
        let mgr = ThreadMgr::with_limit(2);
        let group = mgr.create_group();

        for i in 0..2 {
            mgr.spawn_in_group(
                group,
                format!("limited-{}", i),
                None,
                ThreadPriority::Normal,
                || {},
            )
            .unwrap();
        }

        let result = mgr.spawn_in_group(
            group,
            "over-limit".to_string(),
            None,
            ThreadPriority::Normal,
            || {},
        );
        assert!(matches!(result, Err(Error::ThreadLimitReached(2))));

        // joining frees the slots
        mgr.join_group(group).unwrap();
        let group = mgr.create_group();
        mgr.spawn_in_group(
            group,
            "after-join".to_string(),
            None,
            ThreadPriority::Normal,
            || {},
        )
        .unwrap();
        mgr.join_group(group).unwrap();
    }
}
