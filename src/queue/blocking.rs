use crate::block::MessageBlock;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// FIFO of owned message blocks with blocking, non-blocking and timed
/// dequeue.
///
/// One lock/condvar pair guards the sequence; `push_back` wakes at most one
/// blocked consumer. Ownership of a block moves into the queue on push and
/// back out on pop.
#[derive(Debug, Default)]
pub struct BlockingQueue {
    queue: Mutex<VecDeque<MessageBlock>>,
    not_empty: Condvar,
}

impl BlockingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Condvar::new(),
        }
    }

    pub fn push_back(&self, block: MessageBlock) {
        let mut queue = self.queue.lock();
        queue.push_back(block);
        drop(queue);
        self.not_empty.notify_one();
    }

    /// Block until a message is available.
    pub fn pop_front(&self) -> MessageBlock {
        let mut queue = self.queue.lock();
        loop {
            if let Some(block) = queue.pop_front() {
                return block;
            }
            self.not_empty.wait(&mut queue);
        }
    }

    pub fn try_pop_front(&self) -> Option<MessageBlock> {
        self.queue.lock().pop_front()
    }

    /// Block up to `timeout`; `None` on expiry is an ordinary empty result.
    pub fn timed_pop_front(&self, timeout: Duration) -> Option<MessageBlock> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.queue.lock();
        loop {
            if let Some(block) = queue.pop_front() {
                return Some(block);
            }
            if self.not_empty.wait_until(&mut queue, deadline).timed_out() {
                return queue.pop_front();
            }
        }
    }

    /// Atomically drain the current contents in FIFO order.
    pub fn pop_all(&self) -> VecDeque<MessageBlock> {
        std::mem::take(&mut *self.queue.lock())
    }

    /// Advisory size; true at some instant during the call.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Drain and release every remaining block; returns the count discarded.
    /// Pooled blocks hand their storage back to their pool on drop.
    pub fn clear(&self) -> usize {
        self.pop_all().len()
    }
}
