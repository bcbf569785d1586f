//! Response Pool
//!
//! A process-wide free list of [`Response`] values. Handlers `acquire` a
//! response, populate exactly one slot and hand it to their caller; the
//! delivery path `release`s it once the response has been encoded.
//!
//! ## Contract
//!
//! - `acquire` always returns a response with no populated slot.
//! - `release` resets the response before it becomes visible to anyone else.
//! - A response is owned by exactly one holder at a time; the pool only ever
//!   sees responses that were moved back into it.
//! - Acquire and release are safe to call from many cells concurrently.

use super::Response;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Default number of idle responses kept for reuse.
pub const DEFAULT_POOL_CAPACITY: usize = 1024;

/// Counters describing pool usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total responses handed out
    pub acquired: u64,
    /// Responses handed out that came from the free list
    pub reused: u64,
    /// Responses returned to the pool
    pub released: u64,
    /// Responses currently idle in the free list
    pub idle: usize,
}

/// A thread-safe recycling pool of responses.
#[derive(Debug)]
pub struct ResponsePool {
    free: Mutex<Vec<Response>>,
    capacity: usize,
    acquired: AtomicU64,
    reused: AtomicU64,
    released: AtomicU64,
}

impl Default for ResponsePool {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }
}

impl ResponsePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool that keeps at most `capacity` idle responses.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(capacity.min(DEFAULT_POOL_CAPACITY))),
            capacity,
            acquired: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            released: AtomicU64::new(0),
        }
    }

    /// Hands out a fresh, unset response.
    pub fn acquire(&self) -> Response {
        self.acquired.fetch_add(1, Ordering::Relaxed);

        let recycled = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();

        match recycled {
            Some(rsp) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                rsp
            }
            None => Response::new(),
        }
    }

    /// Takes a response back. It is reset before being stored; responses
    /// beyond the pool capacity are dropped.
    pub fn release(&self, mut rsp: Response) {
        rsp.reset();
        self.released.fetch_add(1, Ordering::Relaxed);

        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.capacity {
            free.push(rsp);
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            idle: self.free.lock().unwrap_or_else(PoisonError::into_inner).len(),
        }
    }
}
