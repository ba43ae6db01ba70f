//! Pages and their contents.

use super::Buffer;
use crate::domain::ports::SwapStore;
use crate::domain::value_objects::{PageKey, PagedAreaId, Position, Region, SwapSlot, TierId};
use core::fmt;
use std::sync::Arc;

/// Where a swapped-out page keeps its data.
#[derive(Clone)]
pub struct SwapHandle {
    store: Arc<dyn SwapStore>,
    slot: SwapSlot,
}

impl SwapHandle {
    /// Create a handle to `slot` of `store`.
    pub fn new(store: Arc<dyn SwapStore>, slot: SwapSlot) -> Self {
        Self { store, slot }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn SwapStore> {
        &self.store
    }

    /// The slot within the store.
    pub fn slot(&self) -> SwapSlot {
        self.slot
    }
}

impl fmt::Debug for SwapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapHandle")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

/// What a page currently holds.
#[derive(Debug, Clone)]
pub enum PageContents {
    /// Fields held in memory.
    Resident(Buffer),
    /// Data held in a swap store.
    Swapped(SwapHandle),
}

/// A cheap, copyable description of a page.
///
/// Callers hold descriptors, never pages: the page itself stays in the
/// table behind the area lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageDescriptor {
    region: Region,
    tier: TierId,
}

impl PageDescriptor {
    /// Describe the page covering `region` in `tier`.
    pub const fn new(region: Region, tier: TierId) -> Self {
        Self { region, tier }
    }

    /// Region covered.
    pub const fn region(&self) -> Region {
        self.region
    }

    /// Tier the page lives in.
    pub const fn tier(&self) -> TierId {
        self.tier
    }

    /// First position covered.
    pub const fn start(&self) -> Position {
        self.region.start()
    }

    /// Kernel paging key of this page within `area`.
    pub const fn key(&self, area: PagedAreaId) -> PageKey {
        PageKey::new(area, self.tier, self.region.start())
    }
}

impl fmt::Display for PageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.tier, self.region)
    }
}

/// A fixed-size range of positions plus the tier it lives in.
#[derive(Debug, Clone)]
pub struct Page {
    region: Region,
    tier: TierId,
    contents: PageContents,
}

impl Page {
    /// A resident page over the region of `buffer`.
    pub fn resident(tier: TierId, buffer: Buffer) -> Self {
        Self {
            region: buffer.region(),
            tier,
            contents: PageContents::Resident(buffer),
        }
    }

    /// A swapped page over `region`.
    pub fn swapped(tier: TierId, region: Region, handle: SwapHandle) -> Self {
        Self {
            region,
            tier,
            contents: PageContents::Swapped(handle),
        }
    }

    /// Region covered.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Tier the page lives in.
    pub fn tier(&self) -> TierId {
        self.tier
    }

    /// First position covered.
    pub fn start(&self) -> Position {
        self.region.start()
    }

    /// Descriptor of this page.
    pub fn descriptor(&self) -> PageDescriptor {
        PageDescriptor::new(self.region, self.tier)
    }

    /// Contents of the page.
    pub fn contents(&self) -> &PageContents {
        &self.contents
    }

    /// Check whether the page holds its fields in memory.
    pub fn is_resident(&self) -> bool {
        matches!(self.contents, PageContents::Resident(_))
    }

    /// The resident buffer, if any.
    pub fn buffer(&self) -> Option<&Buffer> {
        match &self.contents {
            PageContents::Resident(buffer) => Some(buffer),
            PageContents::Swapped(_) => None,
        }
    }

    /// The resident buffer, mutably, if any.
    pub fn buffer_mut(&mut self) -> Option<&mut Buffer> {
        match &mut self.contents {
            PageContents::Resident(buffer) => Some(buffer),
            PageContents::Swapped(_) => None,
        }
    }

    /// The swap handle, if the page is swapped.
    pub fn swap_handle(&self) -> Option<&SwapHandle> {
        match &self.contents {
            PageContents::Swapped(handle) => Some(handle),
            PageContents::Resident(_) => None,
        }
    }

    /// Kernel paging key of this page within `area`.
    pub fn key(&self, area: PagedAreaId) -> PageKey {
        self.descriptor().key(area)
    }
}
