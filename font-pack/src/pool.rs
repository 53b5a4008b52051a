//! A fixed set of reusable merge buffers.

use std::{
    ops::{Deref, DerefMut},
    sync::{Condvar, Mutex, MutexGuard},
};

const INITIAL_CAPACITY: usize = 4096;

/// Hands out at most `size` byte buffers at a time.
///
/// Merged collections are large; bounding the number of buffers bounds the
/// memory held by concurrent package tasks. Buffers keep the capacity they
/// grew to, so later packages rarely reallocate.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
    available: Condvar,
    size: usize,
}

/// A buffer borrowed from a [`BufferPool`].
///
/// The buffer is cleared and returned to the pool when the guard is dropped,
/// including while unwinding.
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buffer: Vec<u8>,
}

impl BufferPool {
    /// Create a pool of `size` buffers.
    ///
    /// A size of zero is treated as one.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        BufferPool {
            free: Mutex::new(
                (0..size)
                    .map(|_| Vec::with_capacity(INITIAL_CAPACITY))
                    .collect(),
            ),
            available: Condvar::new(),
            size,
        }
    }

    /// The total number of buffers.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The number of buffers not currently handed out.
    pub fn available(&self) -> usize {
        self.lock().len()
    }

    /// Take a buffer, waiting until one is free.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let free = self.lock();
        let mut free = self
            .available
            .wait_while(free, |free| free.is_empty())
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // wait_while only returns once the list is non-empty
        let buffer = free.pop().unwrap_or_default();
        PooledBuffer { pool: self, buffer }
    }

    // the list is valid even if a holder of the lock panicked
    fn lock(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        self.free
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn release(&self, mut buffer: Vec<u8>) {
        buffer.clear();
        self.lock().push(buffer);
        self.available.notify_one();
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buffer));
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}
