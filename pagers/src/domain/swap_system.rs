//! Registry of the tiers available to a paged area.

use crate::domain::entities::Page;
use crate::domain::error::SwapError;
use crate::domain::ports::{PageTable, SwapState, Swapper};
use crate::domain::swap_operation::{SwapDirection, SwapHop, SwapOperation};
use crate::domain::value_objects::{
    AddressError, PagedAreaId, Position, Region, Size, Space, SwapConfiguration, TierId,
};
use core::fmt;
use std::sync::Arc;

/// The ordered chain of tiers of a paged area, and the swappers linking them.
///
/// Tiers are ordered from most swapped out to most swapped in. The first
/// tier is the swapped-out tier: pages are created there by `resize`, and
/// its page size is the swap unit, the largest page size in the system.
/// Every swap moves exactly one unit.
///
/// ```text
///   swapped out                                   swapped in
///   states[0] --swappers[0]--> states[1] --swappers[1]--> states[2]
/// ```
pub struct SwapSystem {
    states: Vec<Arc<dyn SwapState>>,
    swappers: Vec<Arc<dyn Swapper>>,
    fields_index: usize,
    space: Space,
    unit: Size,
}

impl SwapSystem {
    /// Build a swap system.
    ///
    /// `swappers` must form a chain starting at `swapped_out`: the first
    /// swapper's out state is `swapped_out` and every later swapper's out
    /// state is the previous one's in state. With no swappers, the system
    /// has the single tier `swapped_out`.
    ///
    /// # Errors
    ///
    /// Fails when the chain is broken, a tier id repeats, tiers use
    /// different spaces, a page size is zero or not a power-of-two multiple
    /// of the smallest one, the swapped-out tier does not have the largest
    /// page size, or `swapped_in_to_fields` is not a field-holding tier of
    /// the chain.
    pub fn new(
        swapped_out: Arc<dyn SwapState>,
        swapped_in_to_fields: TierId,
        swappers: Vec<Arc<dyn Swapper>>,
    ) -> Result<Self, SwapError> {
        let mut states = vec![swapped_out];
        for swapper in &swappers {
            let previous = states[states.len() - 1].id();
            if swapper.out_state().id() != previous {
                return Err(SwapError::InvalidLayout(
                    "swappers must form a chain starting at the swapped-out tier",
                ));
            }
            let next = swapper.in_state();
            if states.iter().any(|state| state.id() == next.id()) {
                return Err(SwapError::InvalidLayout("tier ids must be unique"));
            }
            states.push(next.clone());
        }

        let space = states[0].space();
        if states.iter().any(|state| state.space() != space) {
            return Err(SwapError::InvalidLayout("all tiers must share one space"));
        }

        let sizes: Vec<u64> = states.iter().map(|state| state.page_size().count()).collect();
        let smallest = sizes.iter().copied().min().unwrap_or(0);
        if smallest == 0 {
            return Err(SwapError::InvalidLayout("page sizes must be non-zero"));
        }
        if sizes
            .iter()
            .any(|size| size % smallest != 0 || !(size / smallest).is_power_of_two())
        {
            return Err(SwapError::InvalidLayout(
                "page sizes must be power-of-two multiples of the smallest page size",
            ));
        }
        let unit = states[0].page_size();
        if sizes.iter().any(|&size| size > unit.count()) {
            return Err(SwapError::InvalidLayout(
                "the swapped-out tier must have the largest page size",
            ));
        }

        let fields_index = states
            .iter()
            .position(|state| state.id() == swapped_in_to_fields)
            .ok_or(SwapError::UnknownTier(swapped_in_to_fields))?;
        if !states[fields_index].holds_fields() {
            return Err(SwapError::InvalidLayout(
                "the swapped-in-to-fields tier must hold fields",
            ));
        }

        debug!(
            "swap system over {}: {} tier(s), unit {}, fields tier {}",
            space,
            states.len(),
            unit,
            swapped_in_to_fields
        );

        Ok(Self {
            states,
            swappers,
            fields_index,
            space,
            unit,
        })
    }

    /// Every tier, most swapped out first.
    pub fn swap_states(&self) -> &[Arc<dyn SwapState>] {
        &self.states
    }

    /// The tier new pages are created in.
    pub fn swapped_out(&self) -> &Arc<dyn SwapState> {
        &self.states[0]
    }

    /// The tier whose pages are field-addressable buffers.
    pub fn swapped_in_to_fields(&self) -> &Arc<dyn SwapState> {
        &self.states[self.fields_index]
    }

    /// The tier with the given id.
    pub fn state(&self, id: TierId) -> Option<&Arc<dyn SwapState>> {
        self.states.iter().find(|state| state.id() == id)
    }

    fn index_of(&self, id: TierId) -> Result<usize, SwapError> {
        self.states
            .iter()
            .position(|state| state.id() == id)
            .ok_or(SwapError::UnknownTier(id))
    }

    /// The fields tier and every tier more swapped in than it.
    pub fn in_swap_states(&self) -> &[Arc<dyn SwapState>] {
        &self.states[self.fields_index..]
    }

    /// Every tier more swapped out than the fields tier.
    pub fn out_swap_states(&self) -> &[Arc<dyn SwapState>] {
        &self.states[..self.fields_index]
    }

    /// The next tier towards field residency from `id`.
    pub fn in_from(&self, id: TierId) -> Option<&Arc<dyn SwapState>> {
        let index = self.index_of(id).ok()?;
        self.states.get(index + 1)
    }

    /// The next tier towards the swapped-out tier from `id`.
    pub fn out_from(&self, id: TierId) -> Option<&Arc<dyn SwapState>> {
        let index = self.index_of(id).ok()?;
        index.checked_sub(1).map(|previous| &self.states[previous])
    }

    /// Check whether pages of `id` can move further in.
    pub fn is_swap_inable(&self, id: TierId) -> bool {
        self.in_from(id).is_some()
    }

    /// Check whether pages of `id` can move further out.
    pub fn is_swap_outable(&self, id: TierId) -> bool {
        self.out_from(id).is_some()
    }

    /// The swapper linking two adjacent tiers.
    pub fn swapper(&self, out: TierId, inward: TierId) -> Option<&Arc<dyn Swapper>> {
        self.swappers
            .iter()
            .find(|swapper| swapper.out_state().id() == out && swapper.in_state().id() == inward)
    }

    /// Space shared by every tier.
    pub fn space(&self) -> Space {
        self.space
    }

    /// Number of positions moved by one swap.
    pub fn swap_unit(&self) -> Size {
        self.unit
    }

    /// The swap unit containing `position`.
    pub fn unit_region(&self, position: Position) -> Result<Region, SwapError> {
        if position.is_out_of_bounds() {
            return Err(SwapError::Address(AddressError::OutOfBounds));
        }
        let start = position.align_down(self.unit);
        Ok(self.space.region_of(start, self.unit)?)
    }

    /// Plan moving the unit containing `position` to `target`.
    ///
    /// The page at `position` already being in `target` yields an empty
    /// operation.
    pub fn create_swap_operation<'a, T>(
        &'a self,
        area: PagedAreaId,
        table: &'a T,
        configuration: &'a SwapConfiguration,
        position: Position,
        target: TierId,
    ) -> Result<SwapOperation<'a>, SwapError>
    where
        T: PageTable + ?Sized,
    {
        self.index_of(target)?;
        let unit = self.unit_region(position)?;
        let page = table.page(position)?;
        if page.tier() == target {
            return Ok(SwapOperation::new(
                area,
                position,
                unit,
                SwapDirection::In,
                Vec::new(),
                configuration,
                vec![page],
                target,
            ));
        }
        let sources = table.pages(&unit)?;
        self.swap_operation_from(area, configuration, position, sources, target)
    }

    /// Plan moving explicit source pages to `target`.
    ///
    /// The sources must all live in one tier and exactly cover the swap
    /// unit containing `position`.
    pub fn swap_operation_from<'a>(
        &'a self,
        area: PagedAreaId,
        configuration: &'a SwapConfiguration,
        position: Position,
        sources: Vec<&'a Page>,
        target: TierId,
    ) -> Result<SwapOperation<'a>, SwapError> {
        let to = self.index_of(target)?;
        let unit = self.unit_region(position)?;

        let tier = match sources.first() {
            Some(page) => page.tier(),
            None => return Err(SwapError::IncompleteUnit { tier: target, unit }),
        };
        let from = self.index_of(tier)?;

        let mut expected = unit.start();
        for page in &sources {
            if page.tier() != tier || page.start() != expected {
                return Err(SwapError::IncompleteUnit { tier, unit });
            }
            expected = page.region().end().next();
        }
        if expected != unit.end().next() {
            return Err(SwapError::IncompleteUnit { tier, unit });
        }

        let (direction, path): (SwapDirection, Vec<usize>) = if to >= from {
            (SwapDirection::In, (from..to).collect())
        } else {
            (SwapDirection::Out, (to..from).rev().collect())
        };
        let mut hops: Vec<SwapHop<'a>> = Vec::with_capacity(path.len());
        for index in path {
            let (outer, inner) = (&self.states[index], &self.states[index + 1]);
            let swapper = self
                .swapper(outer.id(), inner.id())
                .ok_or(SwapError::NoSwapper {
                    from: outer.id(),
                    to: inner.id(),
                })?;
            let (from, to) = match direction {
                SwapDirection::In => (outer, inner),
                SwapDirection::Out => (inner, outer),
            };
            hops.push(SwapHop { from, to, swapper });
        }

        Ok(SwapOperation::new(
            area,
            position,
            unit,
            direction,
            hops,
            configuration,
            sources,
            target,
        ))
    }
}

impl fmt::Debug for SwapSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tiers: Vec<TierId> = self.states.iter().map(|state| state.id()).collect();
        f.debug_struct("SwapSystem")
            .field("tiers", &tiers)
            .field("fields", &self.states[self.fields_index].id())
            .field("unit", &self.unit)
            .finish()
    }
}
