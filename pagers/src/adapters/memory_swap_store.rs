//! In-memory swap store.

use crate::domain::error::StoreError;
use crate::domain::ports::SwapStore;
use crate::domain::value_objects::SwapSlot;
use async_lock::Mutex;
use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::collections::HashMap;

/// Slot store kept in a map.
///
/// Failures can be injected with [`fail_next`](Self::fail_next) to exercise
/// error paths.
#[derive(Default)]
pub struct MemorySwapStore {
    slots: Mutex<HashMap<SwapSlot, Vec<u8>>>,
    failures: AtomicUsize,
}

impl MemorySwapStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` store operations fail.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    fn injected(&self, operation: &'static str, slot: SwapSlot) -> Result<(), StoreError> {
        let armed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if armed {
            return Err(StoreError::Injected { operation, slot });
        }
        Ok(())
    }

    /// Overwrite a slot's raw bytes, bypassing the failure hook.
    pub fn poke(&self, slot: SwapSlot, data: Vec<u8>) {
        self.slots.lock_blocking().insert(slot, data);
    }

    /// Raw bytes of a slot, bypassing the failure hook.
    pub fn peek(&self, slot: SwapSlot) -> Option<Vec<u8>> {
        self.slots.lock_blocking().get(&slot).cloned()
    }
}

impl SwapStore for MemorySwapStore {
    fn read_slot(&self, slot: SwapSlot) -> Result<Option<Vec<u8>>, StoreError> {
        self.injected("read", slot)?;
        Ok(self.slots.lock_blocking().get(&slot).cloned())
    }

    fn write_slot(&self, slot: SwapSlot, data: Vec<u8>) -> Result<(), StoreError> {
        self.injected("write", slot)?;
        self.slots.lock_blocking().insert(slot, data);
        Ok(())
    }

    fn release_slot(&self, slot: SwapSlot) -> Result<(), StoreError> {
        self.injected("release", slot)?;
        self.slots.lock_blocking().remove(&slot);
        Ok(())
    }

    fn slot_count(&self) -> usize {
        self.slots.lock_blocking().len()
    }
}

impl fmt::Debug for MemorySwapStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySwapStore")
            .field("slots", &self.slot_count())
            .field("failures", &self.failures.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_release() {
        let store = MemorySwapStore::new();
        let slot = SwapSlot::new(2);
        assert_eq!(store.read_slot(slot).unwrap(), None);

        store.write_slot(slot, vec![1, 2, 3]).unwrap();
        assert_eq!(store.read_slot(slot).unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(store.slot_count(), 1);

        store.release_slot(slot).unwrap();
        store.release_slot(slot).unwrap();
        assert_eq!(store.slot_count(), 0);
    }

    #[test]
    fn test_fail_next() {
        let store = MemorySwapStore::new();
        store.fail_next(2);
        assert!(matches!(
            store.write_slot(SwapSlot::new(0), vec![]),
            Err(StoreError::Injected { operation: "write", .. })
        ));
        assert!(store.read_slot(SwapSlot::new(0)).is_err());
        assert!(store.read_slot(SwapSlot::new(0)).is_ok());
    }
}
