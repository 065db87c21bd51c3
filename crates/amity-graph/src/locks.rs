//! Per-pair write serialization.
//!
//! Relationship writes are read-then-decide-then-write. Holding the guard for
//! the unordered account pair across that sequence means two racing writers
//! on the same pair cannot both pass the guard check.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::account::AccountId;

/// Idle entries are pruned once the map grows past this many pairs.
const PRUNE_THRESHOLD: usize = 1024;

type PairKey = (AccountId, AccountId);

struct LockTable {
    slots: HashMap<PairKey, Arc<AsyncMutex<()>>>,
    /// Size that triggers the next prune pass. Never below the threshold.
    prune_at: usize,
    threshold: usize,
}

impl LockTable {
    fn new(threshold: usize) -> Self {
        Self {
            slots: HashMap::new(),
            prune_at: threshold,
            threshold,
        }
    }

    fn prune_if_needed(&mut self) {
        if self.slots.len() <= self.prune_at {
            return;
        }
        let before = self.slots.len();
        self.slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        debug!("pruned {} idle pair locks", before - self.slots.len());
        // Pairs still held stay; wait for the table to double before scanning again.
        self.prune_at = self.threshold.max(self.slots.len() * 2);
    }
}

fn pair_key(a: &AccountId, b: &AccountId) -> PairKey {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Lock table keyed by unordered account pair.
pub struct PairLocks {
    table: Mutex<LockTable>,
}

impl Default for PairLocks {
    fn default() -> Self {
        Self::with_threshold(PRUNE_THRESHOLD)
    }
}

impl PairLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_threshold(threshold: usize) -> Self {
        Self {
            table: Mutex::new(LockTable::new(threshold)),
        }
    }

    /// Wait for exclusive access to the `{a, b}` pair.
    ///
    /// `(a, b)` and `(b, a)` share one guard.
    pub async fn acquire(&self, a: &AccountId, b: &AccountId) -> OwnedMutexGuard<()> {
        let slot = {
            let mut table = self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            table.prune_if_needed();
            table.slots.entry(pair_key(a, b)).or_default().clone()
        };
        slot.lock_owned().await
    }

    /// Number of pairs currently tracked.
    pub fn tracked_pairs(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .slots
            .len()
    }
}
