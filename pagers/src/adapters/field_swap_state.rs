//! Resident tiers: pages that hold their fields in memory.

use crate::domain::entities::{Buffer, Page};
use crate::domain::error::SwapError;
use crate::domain::ports::{SwapState, Swapper};
use crate::domain::value_objects::{Credentials, Position, Region, Size, Space, TierConfig, TierId};
use std::sync::Arc;

/// A tier whose pages are resident field buffers.
///
/// Fresh pages are filled with `Null`. The tier needs no configuration.
#[derive(Debug, Clone)]
pub struct FieldSwapState {
    id: TierId,
    space: Space,
    page_size: Size,
}

impl FieldSwapState {
    /// Create a resident tier with pages of `page_size` fields.
    pub fn new(id: TierId, space: Space, page_size: u64) -> Self {
        Self {
            id,
            space,
            page_size: Size::new(page_size),
        }
    }
}

impl SwapState for FieldSwapState {
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
        true
    }

    fn create_page(
        &self,
        _credentials: &Credentials,
        start: Position,
        _configuration: Option<&TierConfig>,
    ) -> Result<Page, SwapError> {
        if !start.is_aligned(self.page_size) {
            return Err(SwapError::Misaligned {
                tier: self.id,
                position: start,
            });
        }
        let region = self.space.region_of(start, self.page_size)?;
        Ok(Page::resident(self.id, Buffer::new(region)))
    }
}

/// Copies fields between two resident tiers.
#[derive(Debug, Clone)]
pub struct CopySwapper {
    out_state: Arc<dyn SwapState>,
    in_state: Arc<dyn SwapState>,
}

impl CopySwapper {
    /// Link `out_state` to `in_state`.
    pub fn new(out_state: Arc<dyn SwapState>, in_state: Arc<dyn SwapState>) -> Self {
        Self {
            out_state,
            in_state,
        }
    }
}

/// Copy the fields of `region` from one resident page to another.
fn copy_fields(from: &Page, to: &mut Page, region: &Region) -> Result<(), SwapError> {
    let source = from.buffer().ok_or(SwapError::WrongContents {
        tier: from.tier(),
        region: from.region(),
    })?;
    let (tier, page_region) = (to.tier(), to.region());
    let target = to.buffer_mut().ok_or(SwapError::WrongContents {
        tier,
        region: page_region,
    })?;
    for position in region.positions() {
        target.set(position, source.get(position)?.clone())?;
    }
    Ok(())
}

impl Swapper for CopySwapper {
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
        copy_fields(out_page, in_page, region)
    }

    fn write_out(
        &self,
        _credentials: &Credentials,
        in_page: &Page,
        out_page: &mut Page,
        region: &Region,
    ) -> Result<(), SwapError> {
        copy_fields(in_page, out_page, region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Field;

    const STAGING: TierId = TierId::new("staging");
    const FIELDS: TierId = TierId::new("fields");

    #[test]
    fn test_create_page() {
        let tier = FieldSwapState::new(FIELDS, Space::default(), 4);
        let credentials = Credentials::owner_with_all("test");
        let page = tier.create_page(&credentials, Position::new(8), None).unwrap();
        assert_eq!(page.tier(), FIELDS);
        assert_eq!(page.region().len(), 4);
        assert!(page.buffer().unwrap().fields().iter().all(Field::is_null));

        assert!(matches!(
            tier.create_page(&credentials, Position::new(6), None),
            Err(SwapError::Misaligned { .. })
        ));
    }

    #[test]
    fn test_copy_between_resident_pages() {
        let staging: Arc<dyn SwapState> = Arc::new(FieldSwapState::new(STAGING, Space::default(), 8));
        let fields: Arc<dyn SwapState> = Arc::new(FieldSwapState::new(FIELDS, Space::default(), 4));
        let swapper = CopySwapper::new(staging.clone(), fields.clone());
        let credentials = Credentials::owner_with_all("test");

        let mut out_page = staging.create_page(&credentials, Position::ORIGIN, None).unwrap();
        out_page
            .buffer_mut()
            .unwrap()
            .set(Position::new(5), Field::Int(5))
            .unwrap();

        let mut in_page = fields.create_page(&credentials, Position::new(4), None).unwrap();
        let overlap = in_page.region().intersection(&out_page.region());
        swapper
            .read_in(&credentials, &out_page, &mut in_page, &overlap)
            .unwrap();
        assert_eq!(in_page.buffer().unwrap().get(Position::new(5)), Ok(&Field::Int(5)));
    }
}
