use super::blocking::BlockingQueue;
use super::{ProcessorIdFn, QueueStrategy};
use crate::block::MessageBlock;
use crate::error::{Error, Result};
use crate::util::CachePadded;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// One FIFO per worker thread, fixed at activation.
///
/// Pushes route by `hash_key % N`, so blocks sharing a key land on the same
/// worker and keep their relative order; nothing is guaranteed across keys.
/// Pops take no index: the calling thread's partition is resolved through
/// the processor-id capability bound at `init`, and a thread without an
/// assigned slot is rejected with [`Error::InvalidProcessorId`].
#[derive(Default)]
pub struct PartitionedQueue {
    inner: RwLock<Option<Partitions>>,
}

struct Partitions {
    // padded so neighboring partitions do not share a cache line
    queues: Vec<CachePadded<BlockingQueue>>,
    processor_id: ProcessorIdFn,
}

impl Partitions {
    fn own_queue(&self) -> Result<&BlockingQueue> {
        let id = (self.processor_id)().ok_or(Error::InvalidProcessorId)?;
        self.queues
            .get(id)
            .map(|padded| &**padded)
            .ok_or(Error::InvalidProcessorId)
    }
}

impl PartitionedQueue {
    fn with_partitions<R>(&self, f: impl FnOnce(&Partitions) -> Result<R>) -> Result<R> {
        match &*self.inner.read() {
            Some(partitions) => f(partitions),
            None => Err(Error::NotActivated),
        }
    }

    /// Route `block` to partition `hash_key % N`.
    pub fn push(&self, hash_key: u64, block: MessageBlock) -> Result<()> {
        self.with_partitions(|partitions| {
            let index = (hash_key % partitions.queues.len() as u64) as usize;
            partitions.queues[index].push_back(block);
            Ok(())
        })
    }

    /// Block until a message arrives on the calling worker's partition.
    pub fn pop(&self) -> Result<MessageBlock> {
        // the read guard stays held while parked; init only runs between
        // activations, when no worker can be blocked here
        let guard = self.inner.read();
        let partitions = guard.as_ref().ok_or(Error::NotActivated)?;
        Ok(partitions.own_queue()?.pop_front())
    }

    pub fn try_pop(&self) -> Result<Option<MessageBlock>> {
        self.with_partitions(|partitions| Ok(partitions.own_queue()?.try_pop_front()))
    }

    pub fn timed_pop(&self, timeout: Duration) -> Result<Option<MessageBlock>> {
        self.with_partitions(|partitions| Ok(partitions.own_queue()?.timed_pop_front(timeout)))
    }

    /// Drain the calling worker's partition in FIFO order.
    pub fn pop_all(&self) -> Result<VecDeque<MessageBlock>> {
        self.with_partitions(|partitions| Ok(partitions.own_queue()?.pop_all()))
    }

    /// Blocks queued on the calling worker's partition.
    pub fn len(&self) -> Result<usize> {
        self.with_partitions(|partitions| Ok(partitions.own_queue()?.len()))
    }

    pub fn partition_count(&self) -> usize {
        self.inner
            .read()
            .as_ref()
            .map_or(0, |partitions| partitions.queues.len())
    }
}

impl QueueStrategy for PartitionedQueue {
    fn init(&self, thread_count: usize, processor_id: ProcessorIdFn) {
        let queues = (0..thread_count)
            .map(|_| CachePadded::new(BlockingQueue::new()))
            .collect();
        *self.inner.write() = Some(Partitions {
            queues,
            processor_id,
        });
    }

    fn total_len(&self) -> usize {
        self.inner.read().as_ref().map_or(0, |partitions| {
            partitions.queues.iter().map(|queue| queue.len()).sum()
        })
    }

    fn clear(&self) -> usize {
        self.inner.read().as_ref().map_or(0, |partitions| {
            partitions.queues.iter().map(|queue| queue.clear()).sum()
        })
    }
}

impl fmt::Debug for PartitionedQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionedQueue")
            .field("partitions", &self.partition_count())
            .field("total_len", &self.total_len())
            .finish()
    }
}
