//! Page fault requests.

use super::PageDescriptor;
use crate::domain::value_objects::{Position, TierId};
use bitflags::bitflags;

bitflags! {
    /// Outcome flags set on a [`PageFault`] once it has been handled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FaultFlags: u8 {
        /// The fault could not be resolved.
        const ERROR = 0x01;
        /// Resolving the fault moved at least one page between tiers.
        const SWAPPED = 0x02;
    }
}

/// A request to bring the page at a position into a target tier.
///
/// The paged area records the outcome on the fault itself, so callers that
/// only keep the fault still see failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFault {
    position: Position,
    target: TierId,
    page: Option<PageDescriptor>,
    flags: FaultFlags,
}

impl PageFault {
    /// Create an unresolved fault.
    pub fn new(position: Position, target: TierId) -> Self {
        Self {
            position,
            target,
            page: None,
            flags: FaultFlags::empty(),
        }
    }

    /// Faulting position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Requested tier.
    pub fn target(&self) -> TierId {
        self.target
    }

    /// The page now covering the position, once resolved.
    pub fn page(&self) -> Option<PageDescriptor> {
        self.page
    }

    /// Outcome flags.
    pub fn flags(&self) -> FaultFlags {
        self.flags
    }

    /// Check whether handling the fault failed.
    pub fn is_error(&self) -> bool {
        self.flags.contains(FaultFlags::ERROR)
    }

    pub(crate) fn resolve(&mut self, page: PageDescriptor, swapped: bool) {
        self.page = Some(page);
        self.flags.remove(FaultFlags::ERROR);
        self.flags.set(FaultFlags::SWAPPED, swapped);
    }

    pub(crate) fn fail(&mut self) {
        self.page = None;
        self.flags.insert(FaultFlags::ERROR);
    }
}
