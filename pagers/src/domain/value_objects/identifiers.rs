//! Identity value objects for tiers, areas, slots and pages.

use super::Position;
use core::fmt;

/// Identity of a swap tier.
///
/// Tier ids are static names so they can be copied freely into pages and
/// log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TierId(&'static str);

impl TierId {
    /// Create a tier id.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Name of the tier.
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Identity of a paged area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PagedAreaId(u64);

impl PagedAreaId {
    /// Create an area id.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Underlying value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PagedAreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Area({})", self.0)
    }
}

/// A slot in a swap store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SwapSlot(u64);

impl SwapSlot {
    /// Create a slot number.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Underlying value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SwapSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({})", self.0)
    }
}

/// Key under which kernel paging tracks a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey {
    /// Owning area.
    pub area: PagedAreaId,
    /// Tier of the page.
    pub tier: TierId,
    /// First position of the page.
    pub start: Position,
}

impl PageKey {
    /// Create a page key.
    pub const fn new(area: PagedAreaId, tier: TierId, start: Position) -> Self {
        Self { area, tier, start }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.area, self.tier, self.start.index())
    }
}
