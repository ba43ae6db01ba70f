//! One-shot transfer of a swap unit between tiers.

use crate::domain::entities::Page;
use crate::domain::error::SwapError;
use crate::domain::ports::{SwapState, Swapper};
use crate::domain::value_objects::{
    Credentials, PagedAreaId, Position, Region, SwapConfiguration, TierId,
};
use std::sync::Arc;

/// Direction data moves in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
    /// Towards field residency.
    In,
    /// Towards the swapped-out tier.
    Out,
}

/// One step between adjacent tiers.
#[derive(Debug)]
pub(crate) struct SwapHop<'a> {
    pub(crate) from: &'a Arc<dyn SwapState>,
    pub(crate) to: &'a Arc<dyn SwapState>,
    pub(crate) swapper: &'a Arc<dyn Swapper>,
}

/// A planned transfer of one swap unit to a target tier.
///
/// Built by [`SwapSystem`](super::SwapSystem). The operation borrows its
/// source pages and never touches the page table: after a successful
/// [`swap`](Self::swap) the caller takes the target pages and installs them.
/// A failed swap leaves the sources exactly as they were, and is never
/// retried.
#[derive(Debug)]
pub struct SwapOperation<'a> {
    area: PagedAreaId,
    position: Position,
    unit: Region,
    direction: SwapDirection,
    hops: Vec<SwapHop<'a>>,
    configuration: &'a SwapConfiguration,
    sources: Vec<&'a Page>,
    target: TierId,
    target_pages: Option<Vec<Page>>,
}

impl<'a> SwapOperation<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        area: PagedAreaId,
        position: Position,
        unit: Region,
        direction: SwapDirection,
        hops: Vec<SwapHop<'a>>,
        configuration: &'a SwapConfiguration,
        sources: Vec<&'a Page>,
        target: TierId,
    ) -> Self {
        Self {
            area,
            position,
            unit,
            direction,
            hops,
            configuration,
            sources,
            target,
            target_pages: None,
        }
    }

    /// Perform every hop.
    ///
    /// Target pages are created through each hop's target tier and filled
    /// through the hop's swapper, which may block on I/O.
    pub fn swap(&mut self, credentials: &Credentials) -> Result<(), SwapError> {
        if self.target_pages.is_some() {
            return Err(SwapError::AlreadySwapped);
        }

        if self.hops.is_empty() {
            self.target_pages = Some(self.sources.iter().map(|page| (*page).clone()).collect());
            return Ok(());
        }

        debug!(
            "{}: swapping {} {:?} to {} through {} hop(s)",
            self.area,
            self.unit,
            self.direction,
            self.target,
            self.hops.len()
        );

        let mut pages = self.run_hop(credentials, &self.hops[0], &self.sources)?;
        for hop in &self.hops[1..] {
            let inputs: Vec<&Page> = pages.iter().collect();
            pages = self.run_hop(credentials, hop, &inputs)?;
        }

        self.target_pages = Some(pages);
        Ok(())
    }

    fn run_hop(
        &self,
        credentials: &Credentials,
        hop: &SwapHop<'a>,
        inputs: &[&Page],
    ) -> Result<Vec<Page>, SwapError> {
        trace!("{}: hop {} -> {}", self.area, hop.from.id(), hop.to.id());

        let configuration = self.configuration.for_swap_state(hop.to.id());
        let mut outputs = Vec::new();
        for start in self.unit.page_starts(hop.to.page_size()) {
            let mut page = hop.to.create_page(credentials, start, configuration)?;
            for input in inputs {
                let overlap = input.region().intersection(&page.region());
                if overlap.is_empty() {
                    continue;
                }
                match self.direction {
                    SwapDirection::In => hop.swapper.read_in(credentials, input, &mut page, &overlap)?,
                    SwapDirection::Out => {
                        hop.swapper.write_out(credentials, input, &mut page, &overlap)?
                    }
                }
            }
            outputs.push(page);
        }
        Ok(outputs)
    }

    /// Pages in the target tier.
    ///
    /// # Errors
    ///
    /// [`SwapError::NotSwapped`] until [`swap`](Self::swap) has succeeded.
    pub fn target_pages(&self) -> Result<&[Page], SwapError> {
        self.target_pages.as_deref().ok_or(SwapError::NotSwapped)
    }

    /// Take the pages in the target tier, releasing the borrowed sources.
    pub fn into_target_pages(self) -> Result<Vec<Page>, SwapError> {
        self.target_pages.ok_or(SwapError::NotSwapped)
    }

    /// Direction data moves in.
    pub fn direction(&self) -> SwapDirection {
        self.direction
    }

    /// Check whether the sources already live in the target tier.
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// The swap unit being moved.
    pub fn unit(&self) -> Region {
        self.unit
    }

    /// The position the operation was requested for.
    pub fn position(&self) -> Position {
        self.position
    }

    /// The target tier.
    pub fn target(&self) -> TierId {
        self.target
    }

    /// The pages being moved.
    pub fn sources(&self) -> &[&'a Page] {
        &self.sources
    }
}
