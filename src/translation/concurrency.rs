/*!
 * Process-wide concurrency limiting for provider calls.
 *
 * One `ConcurrencyLimiter` is built at startup and cloned into every
 * translation; clones share the same pool of permits, so chunks of
 * different documents compete for the same slots.
 */

use std::sync::Arc;
use tokio::sync::{AcquireError, Semaphore, SemaphorePermit};

use crate::app_config::TranslationCommonConfig;

/// Counting gate bounding in-flight provider work
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyLimiter {
    /// Create a limiter with `capacity` permits (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn from_config(common: &TranslationCommonConfig) -> Self {
        Self::new(common.max_concurrent_translations)
    }

    /// Wait for a slot; the slot is released when the permit is dropped
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, AcquireError> {
        self.semaphore.acquire().await
    }

    /// Permits currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently held
    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.available())
    }
}

impl Default for ConcurrencyLimiter {
    fn default() -> Self {
        Self::from_config(&TranslationCommonConfig::default())
    }
}
