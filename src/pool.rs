//! Release protocol for pool-backed message blocks.

use crate::block::MessageBlock;
use parking_lot::Mutex;
use std::sync::Arc;

/// Capability a pool exposes so released blocks can hand their storage back.
pub trait BlockPool: Send + Sync {
    fn recycle(&self, buf: Vec<u8>);
}

/// Freelist of reusable block storage.
///
/// Allocation policy is deliberately minimal: acquire pops a free buffer or
/// allocates a fresh one, release pushes it back cleared.
#[derive(Debug, Default)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Take a block whose storage returns here when the block is dropped.
    pub fn acquire(self: &Arc<Self>) -> MessageBlock {
        let buf = self.free.lock().pop().unwrap_or_default();
        let mut block = MessageBlock::from_vec(buf);
        let pool: Arc<dyn BlockPool> = Arc::clone(self) as Arc<dyn BlockPool>;
        block.mark_pooled(&pool);
        block
    }

    pub fn free_count(&self) -> usize {
        self.free.lock().len()
    }
}

impl BlockPool for BufferPool {
    fn recycle(&self, mut buf: Vec<u8>) {
        buf.clear();
        self.free.lock().push(buf);
    }
}
