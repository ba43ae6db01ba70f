//! Domain-level errors.
//!
//! Each layer of the paging subsystem has its own error enum, and the
//! area-level [`MemoryError`] wraps them together with the area and position
//! the failure concerns, so callers can pattern-match on the kind of failure
//! instead of inspecting messages.

use crate::domain::entities::{BufferError, PageDescriptor};
use crate::domain::value_objects::{
    AddressError, PagedAreaId, Permissions, Position, Region, Space, SwapSlot, TierId,
};
use core::fmt;

/// Errors raised by a page table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PageTableError {
    /// The requested region is not fully covered by pages.
    RegionNotCovered {
        /// Requested region.
        requested: Region,
        /// Region covered by the table.
        covered: Region,
    },
    /// No page covers the position.
    NoSuchPage {
        /// Requested position.
        position: Position,
    },
    /// The page is not in the table.
    UnknownPage {
        /// The page that was named.
        page: PageDescriptor,
    },
    /// A page or region from another space was supplied.
    SpaceMismatch {
        /// Space of the table.
        expected: Space,
        /// Space that was supplied.
        actual: Space,
    },
}

impl fmt::Display for PageTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegionNotCovered { requested, covered } => write!(
                f,
                "Region {} is not covered by the page table (covers {})",
                requested, covered
            ),
            Self::NoSuchPage { position } => write!(f, "No page covers {}", position),
            Self::UnknownPage { page } => write!(f, "Page {} is not in the table", page),
            Self::SpaceMismatch { expected, actual } => write!(
                f,
                "Page table of {} cannot hold pages of {}",
                expected, actual
            ),
        }
    }
}

impl core::error::Error for PageTableError {}

/// Errors raised by a swap store.
#[derive(Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// A failure requested through a test hook.
    Injected {
        /// The store operation that failed.
        operation: &'static str,
        /// Slot involved.
        slot: SwapSlot,
    },
    /// The backend failed.
    Backend {
        /// Slot involved.
        slot: SwapSlot,
        /// Underlying failure.
        source: Box<dyn core::error::Error + Send + Sync>,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Injected { operation, slot } => {
                write!(f, "Injected failure during {} of {}", operation, slot)
            }
            Self::Backend { slot, source } => write!(f, "Store failure on {}: {}", slot, source),
        }
    }
}

impl core::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Backend { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Errors raised while building swap systems or moving pages between tiers.
#[derive(Debug)]
#[non_exhaustive]
pub enum SwapError {
    /// The tier is not part of the swap system.
    UnknownTier(TierId),
    /// No swapper links the two tiers.
    NoSwapper {
        /// Tier data would leave.
        from: TierId,
        /// Tier data would enter.
        to: TierId,
    },
    /// The swap system's tiers do not form a valid chain.
    InvalidLayout(&'static str),
    /// The tier needs a configuration payload and none was given.
    MissingConfiguration(TierId),
    /// The tier's configuration payload has the wrong type.
    InvalidConfiguration(TierId),
    /// A page start is not aligned to the tier's page size.
    Misaligned {
        /// Tier whose page size applies.
        tier: TierId,
        /// Offending position.
        position: Position,
    },
    /// The slot for a page lies past the end of the store's slot numbers.
    SlotOverflow {
        /// Tier whose store was addressed.
        tier: TierId,
        /// Start of the page.
        position: Position,
    },
    /// The source pages do not exactly cover one swap unit in one tier.
    IncompleteUnit {
        /// Tier of the first source page.
        tier: TierId,
        /// The swap unit that was being moved.
        unit: Region,
    },
    /// A page does not hold the contents its tier requires.
    WrongContents {
        /// Tier of the page.
        tier: TierId,
        /// Region of the page.
        region: Region,
    },
    /// Target pages were requested before a successful swap.
    NotSwapped,
    /// A swap operation was run twice.
    AlreadySwapped,
    /// A slot failed its integrity check.
    Corrupt {
        /// Slot read.
        slot: SwapSlot,
        /// Checksum stored with the data.
        expected: u32,
        /// Checksum computed over the data.
        actual: u32,
    },
    /// A slot is too short to hold its checksum.
    Truncated {
        /// Slot read.
        slot: SwapSlot,
    },
    /// Encoding or decoding slot data failed.
    Codec(postcard::Error),
    /// The swap store failed.
    Store(StoreError),
    /// The page table failed.
    PageTable(PageTableError),
    /// A buffer access failed.
    Buffer(BufferError),
    /// A region could not be built.
    Address(AddressError),
}

impl fmt::Display for SwapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTier(tier) => write!(f, "Unknown swap tier {}", tier),
            Self::NoSwapper { from, to } => write!(f, "No swapper from {} to {}", from, to),
            Self::InvalidLayout(reason) => write!(f, "Invalid swap system: {}", reason),
            Self::MissingConfiguration(tier) => write!(f, "Tier {} is not configured", tier),
            Self::InvalidConfiguration(tier) => {
                write!(f, "Tier {} has a configuration of the wrong type", tier)
            }
            Self::Misaligned { tier, position } => {
                write!(f, "{} is not aligned to a page of tier {}", position, tier)
            }
            Self::SlotOverflow { tier, position } => {
                write!(f, "No slot of tier {} can hold the page at {}", tier, position)
            }
            Self::IncompleteUnit { tier, unit } => write!(
                f,
                "Pages of tier {} do not exactly cover swap unit {}",
                tier, unit
            ),
            Self::WrongContents { tier, region } => {
                write!(f, "Page {}{} holds the wrong kind of contents", tier, region)
            }
            Self::NotSwapped => write!(f, "Swap operation has not completed"),
            Self::AlreadySwapped => write!(f, "Swap operation has already run"),
            Self::Corrupt {
                slot,
                expected,
                actual,
            } => write!(
                f,
                "{} is corrupt: checksum {:#010x}, computed {:#010x}",
                slot, expected, actual
            ),
            Self::Truncated { slot } => write!(f, "{} is truncated", slot),
            Self::Codec(e) => write!(f, "Slot codec error: {}", e),
            Self::Store(e) => write!(f, "Swap store error: {}", e),
            Self::PageTable(e) => write!(f, "Page table error: {}", e),
            Self::Buffer(e) => write!(f, "Buffer error: {}", e),
            Self::Address(e) => write!(f, "Address error: {}", e),
        }
    }
}

impl core::error::Error for SwapError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::PageTable(e) => Some(e),
            Self::Buffer(e) => Some(e),
            Self::Address(e) => Some(e),
            _ => None,
        }
    }
}

impl From<postcard::Error> for SwapError {
    fn from(e: postcard::Error) -> Self {
        Self::Codec(e)
    }
}

impl From<StoreError> for SwapError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<PageTableError> for SwapError {
    fn from(e: PageTableError) -> Self {
        Self::PageTable(e)
    }
}

impl From<BufferError> for SwapError {
    fn from(e: BufferError) -> Self {
        Self::Buffer(e)
    }
}

impl From<AddressError> for SwapError {
    fn from(e: AddressError) -> Self {
        Self::Address(e)
    }
}

/// Errors returned by paged-area operations.
#[derive(Debug)]
#[non_exhaustive]
pub enum MemoryError {
    /// An argument was rejected before any state changed.
    InvalidArgument {
        /// Operation that was called.
        operation: &'static str,
        /// What was wrong.
        reason: &'static str,
    },
    /// The credential lacks a permission the operation needs.
    PermissionDenied {
        /// Area operated on.
        area: PagedAreaId,
        /// Operation that was called.
        operation: &'static str,
        /// Permissions the operation needs.
        required: Permissions,
    },
    /// The page table failed.
    PageTable {
        /// Area operated on.
        area: PagedAreaId,
        /// Underlying failure.
        source: PageTableError,
    },
    /// Moving a page between tiers failed.
    Swap {
        /// Area operated on.
        area: PagedAreaId,
        /// Position being swapped.
        position: Position,
        /// Underlying failure.
        source: SwapError,
    },
    /// Copying fields failed.
    Buffer {
        /// Area operated on.
        area: PagedAreaId,
        /// Underlying failure.
        source: BufferError,
    },
    /// Freeing a page failed; the remaining pages were still freed.
    Free {
        /// Area operated on.
        area: PagedAreaId,
        /// First position of the page that failed.
        position: Position,
        /// Underlying failure.
        source: SwapError,
    },
    /// The page table contradicts itself.
    Corrupt {
        /// Area operated on.
        area: PagedAreaId,
        /// Position being resolved.
        position: Position,
        /// What was found.
        detail: String,
    },
}

impl MemoryError {
    /// Position the error concerns, if any.
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Swap { position, .. }
            | Self::Free { position, .. }
            | Self::Corrupt { position, .. } => Some(*position),
            _ => None,
        }
    }
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { operation, reason } => {
                write!(f, "Invalid argument to {}: {}", operation, reason)
            }
            Self::PermissionDenied {
                area,
                operation,
                required,
            } => write!(
                f,
                "{} on {} requires permissions {:?}",
                operation, area, required
            ),
            Self::PageTable { area, source } => write!(f, "{}: {}", area, source),
            Self::Swap {
                area,
                position,
                source,
            } => write!(f, "{}: swap at {} failed: {}", area, position, source),
            Self::Buffer { area, source } => write!(f, "{}: {}", area, source),
            Self::Free {
                area,
                position,
                source,
            } => write!(f, "{}: freeing page at {} failed: {}", area, position, source),
            Self::Corrupt {
                area,
                position,
                detail,
            } => write!(f, "{}: page table corrupt at {}: {}", area, position, detail),
        }
    }
}

impl core::error::Error for MemoryError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::PageTable { source, .. } => Some(source),
            Self::Swap { source, .. } | Self::Free { source, .. } => Some(source),
            Self::Buffer { source, .. } => Some(source),
            _ => None,
        }
    }
}
