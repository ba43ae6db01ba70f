//! SwapState and Swapper ports - storage tiers and the links between them.

use crate::domain::entities::Page;
use crate::domain::error::SwapError;
use crate::domain::value_objects::{Credentials, Position, Region, Size, Space, TierConfig, TierId};
use core::fmt::Debug;
use std::sync::Arc;

/// One storage tier a page's data can reside in.
///
/// A swap state is tier metadata plus a page factory. Many pages refer to
/// the same state and the state owns none of them.
pub trait SwapState: Send + Sync + Debug {
    /// Identity of the tier.
    fn id(&self) -> TierId;

    /// Space the tier's pages belong to.
    fn space(&self) -> Space;

    /// Number of positions in one page of this tier.
    fn page_size(&self) -> Size;

    /// Check whether pages of this tier are field-addressable buffers.
    fn holds_fields(&self) -> bool;

    /// Check whether the tier keeps its copy of a unit after the unit has
    /// been swapped further in.
    ///
    /// Only such tiers can be read back from or written back to.
    fn keeps_copies(&self) -> bool {
        false
    }

    /// Allocate a fresh page of this tier starting at `start`.
    ///
    /// The page does not hold caller data yet. `configuration` is the
    /// tier's payload from the area's swap configuration, forwarded
    /// unchanged.
    fn create_page(
        &self,
        credentials: &Credentials,
        start: Position,
        configuration: Option<&TierConfig>,
    ) -> Result<Page, SwapError>;

    /// Release whatever backs `page`.
    fn free_page(&self, page: Page) -> Result<(), SwapError> {
        drop(page);
        Ok(())
    }

    /// Release a copy of the page at `start` kept in this tier while the
    /// page itself lives in a more swapped-in tier.
    fn discard(
        &self,
        start: Position,
        configuration: Option<&TierConfig>,
    ) -> Result<(), SwapError> {
        let _ = (start, configuration);
        Ok(())
    }
}

/// Moves data between two adjacent tiers.
///
/// The out state is the slower, more swapped-out tier; the in state is the
/// next tier towards field residency.
pub trait Swapper: Send + Sync + Debug {
    /// The more swapped-out tier.
    fn out_state(&self) -> &Arc<dyn SwapState>;

    /// The more swapped-in tier.
    fn in_state(&self) -> &Arc<dyn SwapState>;

    /// Copy the positions of `region` from `out_page` into `in_page`.
    fn read_in(
        &self,
        credentials: &Credentials,
        out_page: &Page,
        in_page: &mut Page,
        region: &Region,
    ) -> Result<(), SwapError>;

    /// Copy the positions of `region` from `in_page` into `out_page`.
    fn write_out(
        &self,
        credentials: &Credentials,
        in_page: &Page,
        out_page: &mut Page,
        region: &Region,
    ) -> Result<(), SwapError>;
}
