//! Owned byte buffers passed between producers and workers.
//!
//! A [`MessageBlock`] has exactly one owner at any instant; pushing it into a
//! queue moves ownership to the queue, popping moves it to the consumer. A
//! block acquired from a pool returns its backing storage to that pool when
//! dropped instead of freeing it.

use crate::pool::BlockPool;
use std::fmt;
use std::sync::{Arc, Weak};

/// Heap-owned byte buffer with a read cursor.
pub struct MessageBlock {
    buf: Vec<u8>,
    read_pos: usize,
    pool: Option<Weak<dyn BlockPool>>,
}

impl MessageBlock {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_vec(Vec::with_capacity(capacity))
    }

    /// Wrap an existing buffer; its full contents are readable.
    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self {
            buf,
            read_pos: 0,
            pool: None,
        }
    }

    pub fn from_slice(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }

    /// Append bytes after the current write position.
    pub fn write(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Unread portion of the buffer.
    pub fn data(&self) -> &[u8] {
        &self.buf[self.read_pos..]
    }

    pub fn readable_size(&self) -> usize {
        self.buf.len() - self.read_pos
    }

    /// Consume up to `n` readable bytes, saturating at the write position.
    pub fn advance(&mut self, n: usize) {
        self.read_pos += n.min(self.readable_size());
    }

    /// Reset both cursors, keeping the allocation.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.read_pos = 0;
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Route this block's storage back to `pool` on drop.
    pub fn mark_pooled(&mut self, pool: &Arc<dyn BlockPool>) {
        self.pool = Some(Arc::downgrade(pool));
    }

    pub fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }
}

impl Default for MessageBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MessageBlock {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take().and_then(|weak| weak.upgrade()) {
            pool.recycle(std::mem::take(&mut self.buf));
        }
    }
}

impl fmt::Debug for MessageBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBlock")
            .field("len", &self.buf.len())
            .field("read_pos", &self.read_pos)
            .field("pooled", &self.is_pooled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let mut block = MessageBlock::new();
        block.write(b"hello ");
        block.write(b"world");

        assert_eq!(block.readable_size(), 11);
        assert_eq!(block.data(), b"hello world");
    }

    #[test]
    fn test_advance_consumes() {
        let mut block = MessageBlock::from_slice(b"abcdef");
        block.advance(2);
        assert_eq!(block.data(), b"cdef");

        // saturates at the end
        block.advance(100);
        assert_eq!(block.readable_size(), 0);
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let mut block = MessageBlock::with_capacity(256);
        block.write(&[0u8; 128]);
        let capacity = block.capacity();

        block.reset();
        assert_eq!(block.readable_size(), 0);
        assert_eq!(block.capacity(), capacity);
    }

    #[test]
    fn test_unpooled_by_default() {
        assert!(!MessageBlock::new().is_pooled());
    }
}
