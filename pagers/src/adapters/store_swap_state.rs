//! A swapped-out tier backed by a [`SwapStore`].

use super::page_codec;
use crate::domain::entities::{Field, Page, SwapHandle};
use crate::domain::error::SwapError;
use crate::domain::ports::{SwapState, SwapStore, Swapper};
use crate::domain::value_objects::{
    Credentials, Position, Region, Size, Space, SwapSlot, TierConfig, TierId,
};
use core::fmt;
use std::sync::Arc;

/// Configuration payload for a [`StoreSwapState`].
///
/// Pages of the tier map to consecutive slots of `store` starting at
/// `base_slot`.
#[derive(Clone)]
pub struct StoreConfig {
    /// Store holding the tier's pages.
    pub store: Arc<dyn SwapStore>,
    /// Slot of the page starting at the origin.
    pub base_slot: u64,
}

impl StoreConfig {
    /// Map pages to slots of `store` starting at `base_slot`.
    pub fn new(store: Arc<dyn SwapStore>, base_slot: u64) -> Self {
        Self { store, base_slot }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_slot", &self.base_slot)
            .finish_non_exhaustive()
    }
}

/// A tier whose pages live in slots of a swap store.
///
/// Each area configures its own store and slot range through a
/// [`StoreConfig`] in its swap configuration.
#[derive(Debug, Clone)]
pub struct StoreSwapState {
    id: TierId,
    space: Space,
    page_size: Size,
}

impl StoreSwapState {
    /// Create a store tier with pages of `page_size` fields.
    pub fn new(id: TierId, space: Space, page_size: u64) -> Self {
        Self {
            id,
            space,
            page_size: Size::new(page_size),
        }
    }

    fn config<'c>(&self, configuration: Option<&'c TierConfig>) -> Result<&'c StoreConfig, SwapError> {
        configuration
            .ok_or(SwapError::MissingConfiguration(self.id))?
            .downcast_ref::<StoreConfig>()
            .ok_or(SwapError::InvalidConfiguration(self.id))
    }

    fn slot(&self, config: &StoreConfig, start: Position) -> Result<SwapSlot, SwapError> {
        if !start.is_aligned(self.page_size) {
            return Err(SwapError::Misaligned {
                tier: self.id,
                position: start,
            });
        }
        config
            .base_slot
            .checked_add(start.index() / self.page_size.count())
            .map(SwapSlot::new)
            .ok_or(SwapError::SlotOverflow {
                tier: self.id,
                position: start,
            })
    }
}

impl SwapState for StoreSwapState {
    fn id(&self) -> TierId {
        self.id
    }

    fn space(&self) -> Space {
        self.space
    }

    fn page_size(&self) -> Size {
        self.page_size
    }

    fn holds_fields(&self) -> bool {
        false
    }

    fn keeps_copies(&self) -> bool {
        true
    }

    fn create_page(
        &self,
        _credentials: &Credentials,
        start: Position,
        configuration: Option<&TierConfig>,
    ) -> Result<Page, SwapError> {
        let config = self.config(configuration)?;
        let slot = self.slot(config, start)?;
        let region = self.space.region_of(start, self.page_size)?;
        Ok(Page::swapped(
            self.id,
            region,
            SwapHandle::new(config.store.clone(), slot),
        ))
    }

    fn free_page(&self, page: Page) -> Result<(), SwapError> {
        let handle = page.swap_handle().ok_or(SwapError::WrongContents {
            tier: page.tier(),
            region: page.region(),
        })?;
        trace!("{}: releasing {}", self.id, handle.slot());
        handle.store().release_slot(handle.slot())?;
        Ok(())
    }

    fn discard(&self, start: Position, configuration: Option<&TierConfig>) -> Result<(), SwapError> {
        let config = self.config(configuration)?;
        let slot = self.slot(config, start)?;
        trace!("{}: discarding {}", self.id, slot);
        config.store.release_slot(slot)?;
        Ok(())
    }
}

/// Moves fields between a store tier and the resident tier above it.
///
/// Reading in decodes the whole slot; writing out decodes, patches and
/// re-encodes it. A slot that was never written reads as `Null` fields.
#[derive(Debug, Clone)]
pub struct StoreSwapper {
    out_state: Arc<dyn SwapState>,
    in_state: Arc<dyn SwapState>,
}

impl StoreSwapper {
    /// Link the store tier `out_state` to the resident tier `in_state`.
    pub fn new(out_state: Arc<dyn SwapState>, in_state: Arc<dyn SwapState>) -> Self {
        Self {
            out_state,
            in_state,
        }
    }
}

fn wrong_contents(page: &Page) -> SwapError {
    SwapError::WrongContents {
        tier: page.tier(),
        region: page.region(),
    }
}

/// Fields of a swapped page, and the handle they came from.
fn load(page: &Page, region: &Region) -> Result<(SwapHandle, Vec<Field>), SwapError> {
    let handle = page.swap_handle().ok_or_else(|| wrong_contents(page))?;
    if !region.is_subset_of(&page.region()) {
        return Err(wrong_contents(page));
    }
    let len = page.region().len() as usize;
    let fields = match handle.store().read_slot(handle.slot())? {
        Some(bytes) => page_codec::decode(handle.slot(), &bytes)?,
        None => vec![Field::Null; len],
    };
    if fields.len() != len {
        return Err(wrong_contents(page));
    }
    Ok((handle.clone(), fields))
}

fn offset(page: &Page, position: Position) -> usize {
    position.offset_from(page.start()).count() as usize
}

impl Swapper for StoreSwapper {
    fn out_state(&self) -> &Arc<dyn SwapState> {
        &self.out_state
    }

    fn in_state(&self) -> &Arc<dyn SwapState> {
        &self.in_state
    }

    fn read_in(
        &self,
        _credentials: &Credentials,
        out_page: &Page,
        in_page: &mut Page,
        region: &Region,
    ) -> Result<(), SwapError> {
        let (handle, fields) = load(out_page, region)?;
        trace!("read in {} from {}", region, handle.slot());
        let wrong = wrong_contents(in_page);
        let buffer = in_page.buffer_mut().ok_or(wrong)?;
        for position in region.positions() {
            buffer.set(position, fields[offset(out_page, position)].clone())?;
        }
        Ok(())
    }

    fn write_out(
        &self,
        _credentials: &Credentials,
        in_page: &Page,
        out_page: &mut Page,
        region: &Region,
    ) -> Result<(), SwapError> {
        let (handle, mut fields) = load(out_page, region)?;
        let buffer = in_page.buffer().ok_or_else(|| wrong_contents(in_page))?;
        for position in region.positions() {
            fields[offset(out_page, position)] = buffer.get(position)?.clone();
        }
        trace!("write out {} to {}", region, handle.slot());
        handle
            .store()
            .write_slot(handle.slot(), page_codec::encode(&fields)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FieldSwapState, MemorySwapStore};

    const STORE: TierId = TierId::new("store");
    const FIELDS: TierId = TierId::new("fields");

    fn setup() -> (Arc<MemorySwapStore>, StoreSwapState, TierConfig) {
        let store = Arc::new(MemorySwapStore::new());
        let config = TierConfig::new(StoreConfig::new(store.clone(), 100));
        (store, StoreSwapState::new(STORE, Space::default(), 8), config)
    }

    #[test]
    fn test_create_page_maps_slots() {
        let (_store, tier, config) = setup();
        let credentials = Credentials::owner_with_all("test");
        let page = tier
            .create_page(&credentials, Position::new(16), Some(&config))
            .unwrap();
        assert_eq!(page.swap_handle().unwrap().slot(), SwapSlot::new(102));
        assert!(!page.is_resident());
    }

    #[test]
    fn test_create_page_needs_configuration() {
        let (_store, tier, _config) = setup();
        let credentials = Credentials::owner_with_all("test");
        assert!(matches!(
            tier.create_page(&credentials, Position::ORIGIN, None),
            Err(SwapError::MissingConfiguration(STORE))
        ));
        assert!(matches!(
            tier.create_page(&credentials, Position::ORIGIN, Some(&TierConfig::new(5u8))),
            Err(SwapError::InvalidConfiguration(STORE))
        ));
    }

    #[test]
    fn test_slot_past_last_number() {
        let (store, tier, _config) = setup();
        let credentials = Credentials::owner_with_all("test");
        let config = TierConfig::new(StoreConfig::new(store, u64::MAX - 1));
        assert!(
            tier.create_page(&credentials, Position::new(8), Some(&config))
                .is_ok()
        );
        assert!(matches!(
            tier.create_page(&credentials, Position::new(16), Some(&config)),
            Err(SwapError::SlotOverflow { tier: STORE, .. })
        ));
        assert!(matches!(
            tier.discard(Position::new(16), Some(&config)),
            Err(SwapError::SlotOverflow { .. })
        ));
        assert!(tier.keeps_copies());
    }

    #[test]
    fn test_write_out_then_read_in() {
        let (store, tier, config) = setup();
        let tier: Arc<dyn SwapState> = Arc::new(tier);
        let fields: Arc<dyn SwapState> = Arc::new(FieldSwapState::new(FIELDS, Space::default(), 4));
        let swapper = StoreSwapper::new(tier.clone(), fields.clone());
        let credentials = Credentials::owner_with_all("test");

        let mut resident = fields.create_page(&credentials, Position::new(4), None).unwrap();
        resident
            .buffer_mut()
            .unwrap()
            .set(Position::new(6), Field::from("six"))
            .unwrap();

        let mut swapped = tier
            .create_page(&credentials, Position::ORIGIN, Some(&config))
            .unwrap();
        let region = resident.region();
        swapper
            .write_out(&credentials, &resident, &mut swapped, &region)
            .unwrap();
        assert_eq!(store.slot_count(), 1);

        let mut fresh = fields.create_page(&credentials, Position::new(4), None).unwrap();
        swapper
            .read_in(&credentials, &swapped, &mut fresh, &region)
            .unwrap();
        assert_eq!(fresh.buffer().unwrap(), resident.buffer().unwrap());

        tier.free_page(swapped).unwrap();
        assert_eq!(store.slot_count(), 0);
    }

    #[test]
    fn test_unwritten_slot_reads_null() {
        let (_store, tier, config) = setup();
        let tier: Arc<dyn SwapState> = Arc::new(tier);
        let fields: Arc<dyn SwapState> = Arc::new(FieldSwapState::new(FIELDS, Space::default(), 8));
        let swapper = StoreSwapper::new(tier.clone(), fields.clone());
        let credentials = Credentials::owner_with_all("test");

        let swapped = tier
            .create_page(&credentials, Position::ORIGIN, Some(&config))
            .unwrap();
        let mut resident = fields.create_page(&credentials, Position::ORIGIN, None).unwrap();
        resident
            .buffer_mut()
            .unwrap()
            .set(Position::new(1), Field::Int(1))
            .unwrap();
        let region = resident.region();
        swapper
            .read_in(&credentials, &swapped, &mut resident, &region)
            .unwrap();
        assert!(resident.buffer().unwrap().fields().iter().all(Field::is_null));
    }

    #[test]
    fn test_corrupt_slot() {
        let (store, tier, config) = setup();
        let tier: Arc<dyn SwapState> = Arc::new(tier);
        let fields: Arc<dyn SwapState> = Arc::new(FieldSwapState::new(FIELDS, Space::default(), 8));
        let swapper = StoreSwapper::new(tier.clone(), fields.clone());
        let credentials = Credentials::owner_with_all("test");

        store.poke(SwapSlot::new(100), vec![0xde, 0xad, 0xbe, 0xef, 0x00]);
        let swapped = tier
            .create_page(&credentials, Position::ORIGIN, Some(&config))
            .unwrap();
        let mut resident = fields.create_page(&credentials, Position::ORIGIN, None).unwrap();
        let region = resident.region();
        assert!(matches!(
            swapper.read_in(&credentials, &swapped, &mut resident, &region),
            Err(SwapError::Corrupt { .. })
        ));
    }
}
