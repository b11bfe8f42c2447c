//! Per-slot lock arena
//!
//! Maps a slot id to an async mutex. A caller holds the slot's critical
//! section through a [`SlotGuard`]; dropping the guard releases it on every
//! exit path. Acquisition is bounded by a timeout and fails with `Busy`
//! instead of queueing indefinitely.
//!
//! This serializes callers inside one process only. Cross-replica safety
//! comes from the versioned commit in the booking repository.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::domain::DomainResult;
use crate::shared::errors::DomainError;

pub struct SlotLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
    timeout: Duration,
}

/// Exclusive access to one slot; released on drop
#[derive(Debug)]
pub struct SlotGuard {
    slot_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl SlotGuard {
    pub fn slot_id(&self) -> &str {
        &self.slot_id
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        debug!(slot_id = %self.slot_id, "Slot section released");
    }
}

impl SlotLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    pub async fn acquire(&self, slot_id: &str) -> DomainResult<SlotGuard> {
        let mutex = self
            .locks
            .entry(slot_id.to_string())
            .or_default()
            .value()
            .clone();

        let started = Instant::now();
        let guard = match tokio::time::timeout(self.timeout, mutex.lock_owned()).await {
            Ok(guard) => guard,
            Err(_) => {
                metrics::counter!("reservation_lock_busy_total").increment(1);
                warn!(
                    slot_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Timed out waiting for slot section"
                );
                return Err(DomainError::Busy(slot_id.to_string()));
            }
        };
        metrics::histogram!("reservation_lock_wait_seconds").record(started.elapsed().as_secs_f64());
        debug!(slot_id, "Slot section acquired");

        Ok(SlotGuard {
            slot_id: slot_id.to_string(),
            _guard: guard,
        })
    }

    /// Number of slots whose section is currently held
    pub fn held(&self) -> usize {
        self.locks
            .iter()
            .filter(|entry| entry.value().try_lock().is_err())
            .count()
    }

    /// Number of slots with an allocated lock
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Drop locks nobody holds or waits on. A lock in use is referenced by its
    /// guard or waiter, so its strong count is above one.
    pub fn prune(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }
}
