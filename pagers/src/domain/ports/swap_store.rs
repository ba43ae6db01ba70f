//! SwapStore port - slot storage behind a swapped-out tier.

use crate::domain::error::StoreError;
use crate::domain::value_objects::SwapSlot;

/// Slot-addressed byte storage.
///
/// Stores use interior mutability so that many pages can share one.
pub trait SwapStore: Send + Sync {
    /// Contents of `slot`, `None` if it was never written.
    fn read_slot(&self, slot: SwapSlot) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the contents of `slot`.
    fn write_slot(&self, slot: SwapSlot, data: Vec<u8>) -> Result<(), StoreError>;

    /// Forget `slot`. Releasing an unwritten slot is not an error.
    fn release_slot(&self, slot: SwapSlot) -> Result<(), StoreError>;

    /// Number of slots currently holding data.
    fn slot_count(&self) -> usize;
}
