use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Process-wide cap on concurrently running commands, across all jobs.
#[derive(Debug, Clone)]
pub struct ExecutionPool {
    semaphore: Option<Arc<Semaphore>>,
    capacity: usize,
}

/// A held execution slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct SlotPermit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl ExecutionPool {
    /// Pool with `capacity` slots; `0` means unlimited.
    pub fn new(capacity: usize) -> Self {
        let semaphore = (capacity > 0).then(|| Arc::new(Semaphore::new(capacity)));
        Self {
            semaphore,
            capacity,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Configured capacity, `None` when unlimited.
    pub fn capacity(&self) -> Option<usize> {
        self.semaphore.as_ref().map(|_| self.capacity)
    }

    /// Free slots right now, `None` when unlimited.
    pub fn available(&self) -> Option<usize> {
        self.semaphore.as_ref().map(|s| s.available_permits())
    }

    /// Wait until a slot is free and take it.
    pub async fn acquire_slot(&self) -> SlotPermit {
        let permit = match &self.semaphore {
            // Never closed.
            Some(semaphore) => Arc::clone(semaphore).acquire_owned().await.ok(),
            None => None,
        };
        SlotPermit { _permit: permit }
    }
}

impl SlotPermit {
    /// Give the slot back before the permit goes out of scope.
    pub fn release(self) {}
}
