use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Identity of a ledger row that a read-modify-write must hold exclusively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LockKey {
    Payment(Uuid),
    Card(String),
    Merchant(u32),
}

/// Keyed async mutexes serializing work on the same payment, card or merchant.
///
/// Callers take payment, then card, then merchant locks. Work on unrelated
/// entities never contends.
#[derive(Default, Clone)]
pub struct EntityLocks {
    slots: Arc<Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>>,
}

/// Held lock; released on drop.
pub struct EntityGuard {
    _guard: OwnedMutexGuard<()>,
}

const PRUNE_THRESHOLD: usize = 1024;

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: LockKey) -> EntityGuard {
        let slot = {
            // poisoning cannot leave the map half-updated
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            if slots.len() > PRUNE_THRESHOLD {
                slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            }
            slots.entry(key).or_default().clone()
        };
        EntityGuard {
            _guard: slot.lock_owned().await,
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or_default()
    }
}
