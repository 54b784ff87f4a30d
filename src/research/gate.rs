//! The concurrency gate shared by every branch of one research tree.

use std::sync::Arc;
use tokio::sync::{AcquireError, Semaphore, SemaphorePermit};

/// Counting semaphore bounding how many branches are doing network work at
/// once, across all recursion levels.
///
/// Cloning the gate shares the same slots; it is created once per top-level
/// research call and handed down by reference.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyGate {
    /// A capacity of 0 is bumped to 1 so the gate can always make progress.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot. The slot is released when the permit drops.
    ///
    /// Only fails if the semaphore was closed, which this type never does.
    pub async fn enter(&self) -> Result<SemaphorePermit<'_>, AcquireError> {
        self.semaphore.acquire().await
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_is_bumped_to_one() {
        let gate = ConcurrencyGate::new(0);
        assert_eq!(gate.capacity(), 1);
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_permit_released_on_drop() {
        let gate = ConcurrencyGate::new(2);
        {
            let _a = gate.enter().await.unwrap();
            let _b = gate.enter().await.unwrap();
            assert_eq!(gate.available(), 0);
        }
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn test_clones_share_slots() {
        let gate = ConcurrencyGate::new(1);
        let other = gate.clone();

        let permit = gate.enter().await.unwrap();
        assert_eq!(other.available(), 0);

        let blocked = tokio::time::timeout(Duration::from_millis(20), other.enter()).await;
        assert!(blocked.is_err(), "second holder must wait for the first");

        drop(permit);
        assert!(other.enter().await.is_ok());
    }
}
