//! PagedArea - a resizable field store backed by tiered pages.

use crate::domain::entities::{Buffer, BufferError, Field, Page, PageDescriptor, PageFault};
use crate::domain::error::{MemoryError, PageTableError, SwapError};
use crate::domain::ports::{KernelPaging, PageTable};
use crate::domain::swap_system::SwapSystem;
use crate::domain::value_objects::{
    Credentials, PageKey, PagedAreaId, Permissions, Position, Region, Size, Space,
    SwapConfiguration, TierId,
};
use async_lock::{Mutex, MutexGuard};
use core::fmt;
use std::sync::Arc;

/// One contiguous, resizable range of positions presented as a
/// random-access field store.
///
/// The area owns its page table behind a single lock. Every operation that
/// touches the table takes that lock for its whole duration, so swaps on one
/// area never run concurrently and a single `read` or `write` is atomic with
/// respect to other calls on the same area. Swaps may block on I/O while the
/// lock is held.
///
/// Callers never see page buffers: fields are copied across the boundary one
/// at a time.
///
/// # Examples
///
/// ```ignore
/// let area = PagedArea::new(id, system, configuration, kernel_paging, table)?;
/// area.resize(&cred, space.region_of(Position::ORIGIN, Size::new(10))?)?;
///
/// let mut out = Buffer::with_len(space, 10);
/// let filled = area.read(&cred, Position::ORIGIN, &mut out, &out.region())?;
/// ```
pub struct PagedArea<T: PageTable> {
    id: PagedAreaId,
    swap_system: Arc<SwapSystem>,
    swap_configuration: SwapConfiguration,
    kernel_paging: Arc<dyn KernelPaging>,
    table: Mutex<T>,
}

impl<T: PageTable> PagedArea<T> {
    /// Create a paged area over `page_table`.
    ///
    /// # Errors
    ///
    /// Fails with [`MemoryError::InvalidArgument`] when the page table and
    /// the swap system use different spaces.
    pub fn new(
        id: PagedAreaId,
        swap_system: Arc<SwapSystem>,
        swap_configuration: SwapConfiguration,
        kernel_paging: Arc<dyn KernelPaging>,
        page_table: T,
    ) -> Result<Self, MemoryError> {
        if page_table.space() != swap_system.space() {
            return Err(MemoryError::InvalidArgument {
                operation: "new",
                reason: "page table and swap system use different spaces",
            });
        }
        Ok(Self {
            id,
            swap_system,
            swap_configuration,
            kernel_paging,
            table: Mutex::new(page_table),
        })
    }

    /// Identity of the area.
    pub fn id(&self) -> PagedAreaId {
        self.id
    }

    /// Lock the page table.
    ///
    /// The guard blocks every other operation on the area until dropped.
    pub fn page_table(&self) -> MutexGuard<'_, T> {
        self.table.lock_blocking()
    }

    /// The area's tiers.
    pub fn swap_system(&self) -> &Arc<SwapSystem> {
        &self.swap_system
    }

    /// Per-tier configuration forwarded to page creation.
    pub fn swap_configuration(&self) -> &SwapConfiguration {
        &self.swap_configuration
    }

    /// Shared dirty and recency bookkeeping.
    pub fn kernel_paging(&self) -> &Arc<dyn KernelPaging> {
        &self.kernel_paging
    }

    /// Region currently covered by pages.
    pub fn region(&self) -> Region {
        self.table.lock_blocking().region()
    }

    /// Number of pages currently in the fields tier.
    pub fn resident_pages(&self) -> usize {
        let fields = self.fields_tier();
        self.table
            .lock_blocking()
            .descriptors()
            .iter()
            .filter(|descriptor| descriptor.tier() == fields)
            .count()
    }

    /// Copy fields from the area into `destination`.
    ///
    /// Reads `destination_region.len()` fields starting at `start`, clamped
    /// to the end of the area, into `destination_region` of `destination`.
    /// Every page touched is swapped into the fields tier first. Returns
    /// the part of `destination_region` that was filled, or the empty
    /// region when nothing was copied.
    ///
    /// # Errors
    ///
    /// Argument errors when the credential is null or lacks `READ`, when
    /// `start` lies outside the area, or when `destination_region` is not
    /// inside `destination`. Swap failures are returned with the position
    /// being swapped.
    pub fn read(
        &self,
        credentials: &Credentials,
        start: Position,
        destination: &mut Buffer,
        destination_region: &Region,
    ) -> Result<Region, MemoryError> {
        self.check(credentials, Permissions::READ, "read")?;
        let space = self.swap_system.space();
        if destination_region.is_empty() {
            return Ok(space.empty());
        }
        self.check_space(destination_region, "read")?;
        if !destination_region.is_subset_of(&destination.region()) {
            return Err(MemoryError::InvalidArgument {
                operation: "read",
                reason: "destination region lies outside the destination buffer",
            });
        }

        let mut table = self.table.lock_blocking();
        let source = self.source_region(&*table, start, destination_region.size(), "read")?;
        self.swap_in_region(&mut *table, credentials, &source)?;

        let mut destinations = destination_region.positions();
        let mut filled = Filled::default();
        let pages = table.pages(&source).map_err(|e| self.table_error(e))?;
        for page in pages {
            let buffer = page
                .buffer()
                .ok_or_else(|| self.corrupt(page.start(), "page is not resident after swap-in"))?;
            let mut touched = false;
            for position in page.region().intersection(&source).positions() {
                let Some(to) = destinations.next() else {
                    break;
                };
                let field = buffer.get(position).map_err(|e| self.buffer_error(e))?;
                destination
                    .set(to, field.clone())
                    .map_err(|e| self.buffer_error(e))?;
                filled.push(to);
                touched = true;
            }
            if touched {
                self.kernel_paging.recent(&page.key(self.id));
            }
        }

        let filled = filled.region(space);
        trace!("{}: read {} from {} into {}", self.id, source, start, filled);
        Ok(filled)
    }

    /// Copy fields from `source` into the area.
    ///
    /// The mirror image of [`read`](Self::read): copies `source_region` of
    /// `source` into the area starting at `start`, clamped to the end of the
    /// area. Every page that receives a field is marked dirty. Returns the
    /// part of `source_region` that was consumed.
    pub fn write(
        &self,
        credentials: &Credentials,
        start: Position,
        source: &Buffer,
        source_region: &Region,
    ) -> Result<Region, MemoryError> {
        self.check(credentials, Permissions::WRITE, "write")?;
        let space = self.swap_system.space();
        if source_region.is_empty() {
            return Ok(space.empty());
        }
        self.check_space(source_region, "write")?;
        if !source_region.is_subset_of(&source.region()) {
            return Err(MemoryError::InvalidArgument {
                operation: "write",
                reason: "source region lies outside the source buffer",
            });
        }

        let mut table = self.table.lock_blocking();
        let target = self.source_region(&*table, start, source_region.size(), "write")?;
        self.swap_in_region(&mut *table, credentials, &target)?;

        let mut sources = source_region.positions();
        let mut consumed = Filled::default();
        let pages = table.pages_mut(&target).map_err(|e| self.table_error(e))?;
        for page in pages {
            let key = page.key(self.id);
            let overlap = page.region().intersection(&target);
            let page_start = page.start();
            let buffer = page
                .buffer_mut()
                .ok_or_else(|| self.corrupt(page_start, "page is not resident after swap-in"))?;
            let mut touched = false;
            for position in overlap.positions() {
                let Some(from) = sources.next() else {
                    break;
                };
                let field = source.get(from).map_err(|e| self.buffer_error(e))?;
                buffer
                    .set(position, field.clone())
                    .map_err(|e| self.buffer_error(e))?;
                consumed.push(from);
                touched = true;
            }
            if touched {
                self.kernel_paging.dirty(&key);
            }
        }

        let consumed = consumed.region(space);
        trace!("{}: wrote {} from {} at {}", self.id, target, consumed, start);
        Ok(consumed)
    }

    /// Read the single field at `position`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::Corrupt`] when the page table resolves the position to
    /// anything other than exactly one page.
    pub fn read_field(
        &self,
        credentials: &Credentials,
        position: Position,
    ) -> Result<Field, MemoryError> {
        self.check(credentials, Permissions::READ, "read_field")?;
        let mut table = self.table.lock_blocking();
        let region = self.field_region(&*table, position, "read_field")?;
        self.swap_in_region(&mut *table, credentials, &region)?;

        let pages = table.pages(&region).map_err(|e| self.table_error(e))?;
        let [page] = pages.as_slice() else {
            return Err(self.corrupt(
                position,
                format!("position resolves to {} pages", pages.len()),
            ));
        };
        let buffer = page
            .buffer()
            .ok_or_else(|| self.corrupt(position, "page is not resident after swap-in"))?;
        let field = buffer
            .get(position)
            .map_err(|e| self.buffer_error(e))?
            .clone();
        self.kernel_paging.recent(&page.key(self.id));
        Ok(field)
    }

    /// Replace the single field at `position`, marking its page dirty.
    ///
    /// # Errors
    ///
    /// [`MemoryError::Corrupt`] when the page table resolves the position to
    /// anything other than exactly one page.
    pub fn write_field(
        &self,
        credentials: &Credentials,
        position: Position,
        field: Field,
    ) -> Result<(), MemoryError> {
        self.check(credentials, Permissions::WRITE, "write_field")?;
        let mut table = self.table.lock_blocking();
        let region = self.field_region(&*table, position, "write_field")?;
        self.swap_in_region(&mut *table, credentials, &region)?;

        let mut pages = table.pages_mut(&region).map_err(|e| self.table_error(e))?;
        let count = pages.len();
        let [page] = pages.as_mut_slice() else {
            return Err(self.corrupt(position, format!("position resolves to {} pages", count)));
        };
        let key = page.key(self.id);
        let buffer = page
            .buffer_mut()
            .ok_or_else(|| self.corrupt(position, "page is not resident after swap-in"))?;
        buffer
            .set(position, field)
            .map_err(|e| self.buffer_error(e))?;
        self.kernel_paging.dirty(&key);
        Ok(())
    }

    /// Bring the page at the fault's position into the fault's target tier.
    ///
    /// The outcome is recorded on `fault` as well as returned: on success the
    /// fault carries the page now covering the position; on failure its
    /// error flag is set.
    pub fn page_fault(
        &self,
        credentials: &Credentials,
        fault: &mut PageFault,
    ) -> Result<(), MemoryError> {
        let result = self.handle_fault(credentials, fault);
        match result {
            Ok((page, swapped)) => {
                fault.resolve(page, swapped);
                Ok(())
            }
            Err(e) => {
                warn!("{}: page fault at {} failed: {}", self.id, fault.position(), e);
                fault.fail();
                Err(e)
            }
        }
    }

    fn handle_fault(
        &self,
        credentials: &Credentials,
        fault: &PageFault,
    ) -> Result<(PageDescriptor, bool), MemoryError> {
        self.check(credentials, Permissions::SWAP, "page_fault")?;
        let position = fault.position();
        debug!("{}: page fault at {} to {}", self.id, position, fault.target());

        let mut table = self.table.lock_blocking();
        let swapped = self.swap_to(&mut *table, credentials, position, fault.target())?;
        let page = table
            .page(position)
            .map_err(|e| self.table_error(e))?
            .descriptor();
        self.kernel_paging.recent(&page.key(self.id));
        Ok((page, swapped))
    }

    /// Grow or shrink the area to cover `region`.
    ///
    /// The allocation is rounded up to whole pages of the swapped-out tier.
    /// Missing pages are created in that tier; pages already covering part
    /// of the new range keep their data; pages outside it are freed.
    /// Returns the region covered before the call.
    ///
    /// # Errors
    ///
    /// Argument errors when the credential is null or lacks `RESIZE`, or when
    /// `region` does not start on a page boundary. Page creation failures are
    /// returned before the table changes.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Page size 4: ten fields need three pages.
    /// let previous = area.resize(&cred, space.region_of(Position::ORIGIN, Size::new(10))?)?;
    /// assert!(previous.is_empty());
    /// assert_eq!(area.region().len(), 12);
    /// ```
    pub fn resize(&self, credentials: &Credentials, region: Region) -> Result<Region, MemoryError> {
        self.check(credentials, Permissions::RESIZE, "resize")?;
        self.check_space(&region, "resize")?;
        let space = self.swap_system.space();
        let tier = self.swap_system.swapped_out().clone();
        let page_size = tier.page_size();
        if !region.is_empty() && !region.start().is_aligned(page_size) {
            return Err(MemoryError::InvalidArgument {
                operation: "resize",
                reason: "region must start on a page boundary",
            });
        }

        let target = if region.is_empty() {
            space.empty()
        } else {
            let pages = region.size().pages_needed(page_size);
            space
                .region_of(region.start(), page_size.multiply(pages))
                .map_err(|_| MemoryError::InvalidArgument {
                    operation: "resize",
                    reason: "region runs out of bounds",
                })?
        };

        let mut table = self.table.lock_blocking();
        let previous = table.region();

        let configuration = self.swap_configuration.for_swap_state(tier.id());
        let mut created = Vec::new();
        for start in target.page_starts(page_size) {
            match table.page(start) {
                Ok(_) => continue,
                Err(PageTableError::NoSuchPage { .. }) => {}
                Err(e) => return Err(self.table_error(e)),
            }
            let page = tier
                .create_page(credentials, start, configuration)
                .map_err(|source| self.swap_error(start, source))?;
            created.push(page);
        }

        let stale: Vec<PageDescriptor> = table
            .descriptors()
            .into_iter()
            .filter(|descriptor| !descriptor.region().is_subset_of(&target))
            .collect();
        let removed = table.remove(&stale).map_err(|e| self.table_error(e))?;

        let keys: Vec<PageKey> = created.iter().map(|page| page.key(self.id)).collect();
        table.put(created).map_err(|e| self.table_error(e))?;
        for key in &keys {
            self.kernel_paging.clean(key);
        }

        debug!(
            "{}: resized {} -> {} ({} created, {} removed)",
            self.id,
            previous,
            target,
            keys.len(),
            removed.len()
        );

        self.release_pages(removed)?;
        Ok(previous)
    }

    /// Free every page of the area.
    ///
    /// Every page is attempted even after a failure; the first failure is
    /// returned once all were tried. The table is empty afterwards either
    /// way. A page table that cannot hand over its pages fails immediately.
    pub fn free(&self) -> Result<(), MemoryError> {
        let mut table = self.table.lock_blocking();
        let pages = table.take_all().map_err(|e| self.table_error(e))?;
        debug!("{}: freeing {} page(s)", self.id, pages.len());
        self.release_pages(pages)
    }

    /// Write back or read in between a page and its copy in another tier.
    ///
    /// If `in_page` is dirty its unit is pushed out to `out_page`'s tier and
    /// every page of the unit is clean afterwards, since all of them were
    /// written. Otherwise `out_page`'s tier is read back in, overwriting
    /// `in_page`, which is then clean.
    ///
    /// # Errors
    ///
    /// Argument errors unless both pages name known tiers, `in_page` is more
    /// swapped in than `out_page`, their regions overlap, and `out_page`'s
    /// tier keeps copies of the units swapped in from it. `in_page` must be
    /// in the table.
    pub fn synchronize(
        &self,
        credentials: &Credentials,
        in_page: &PageDescriptor,
        out_page: &PageDescriptor,
    ) -> Result<(), MemoryError> {
        self.check(credentials, Permissions::SWAP, "synchronize")?;
        let states = self.swap_system.swap_states();
        let index = |tier: TierId| states.iter().position(|state| state.id() == tier);
        let (Some(inner), Some(outer)) = (index(in_page.tier()), index(out_page.tier())) else {
            return Err(MemoryError::InvalidArgument {
                operation: "synchronize",
                reason: "pages must belong to tiers of the swap system",
            });
        };
        if inner <= outer {
            return Err(MemoryError::InvalidArgument {
                operation: "synchronize",
                reason: "in page must be more swapped in than out page",
            });
        }
        if in_page.region().intersection(&out_page.region()).is_empty() {
            return Err(MemoryError::InvalidArgument {
                operation: "synchronize",
                reason: "pages must overlap",
            });
        }
        if !states[outer].keeps_copies() {
            return Err(MemoryError::InvalidArgument {
                operation: "synchronize",
                reason: "out page's tier keeps no copies",
            });
        }

        let mut table = self.table.lock_blocking();
        let start = in_page.start();
        let current = table
            .page(start)
            .map_err(|e| self.table_error(e))?
            .descriptor();
        if current != *in_page {
            return Err(self.table_error(PageTableError::UnknownPage { page: *in_page }));
        }

        let key = in_page.key(self.id);
        if self.kernel_paging.is_dirty(&key) {
            debug!("{}: writing back {} to {}", self.id, in_page, out_page.tier());
            let mut operation = self
                .swap_system
                .create_swap_operation(
                    self.id,
                    &*table,
                    &self.swap_configuration,
                    start,
                    out_page.tier(),
                )
                .map_err(|source| self.swap_error(start, source))?;
            operation
                .swap(credentials)
                .map_err(|source| self.swap_error(start, source))?;
            for page in operation.sources() {
                self.kernel_paging.clean(&page.descriptor().key(self.id));
            }
        } else {
            debug!("{}: reading {} back in from {}", self.id, in_page, out_page.tier());
            let restored = self
                .read_back(credentials, start, out_page.tier(), in_page)
                .map_err(|source| self.swap_error(start, source))?;
            let displaced = table.put(vec![restored]).map_err(|e| self.table_error(e))?;
            for page in &displaced {
                self.kernel_paging.forget(&page.key(self.id));
            }
        }

        self.kernel_paging.clean(&key);
        Ok(())
    }

    /// Rebuild `in_page` from the copy of its unit kept in tier `out`.
    fn read_back(
        &self,
        credentials: &Credentials,
        start: Position,
        out: TierId,
        in_page: &PageDescriptor,
    ) -> Result<Page, SwapError> {
        let state = self
            .swap_system
            .state(out)
            .ok_or(SwapError::UnknownTier(out))?;
        let unit = self.swap_system.unit_region(start)?;
        let configuration = self.swap_configuration.for_swap_state(out);
        let copies = unit
            .page_starts(state.page_size())
            .map(|page_start| state.create_page(credentials, page_start, configuration))
            .collect::<Result<Vec<_>, _>>()?;

        let sources: Vec<&Page> = copies.iter().collect();
        let mut operation = self.swap_system.swap_operation_from(
            self.id,
            &self.swap_configuration,
            start,
            sources,
            in_page.tier(),
        )?;
        operation.swap(credentials)?;
        operation
            .into_target_pages()?
            .into_iter()
            .find(|page| page.region() == in_page.region())
            .ok_or(SwapError::IncompleteUnit {
                tier: in_page.tier(),
                unit,
            })
    }

    /// Push every dirty resident page out to the swapped-out tier.
    ///
    /// Pages of one swap unit are written together, so a unit is written
    /// once however many of its pages are dirty.
    ///
    /// Returns the number of pages written.
    pub fn write_back(&self, credentials: &Credentials) -> Result<usize, MemoryError> {
        self.check(credentials, Permissions::SWAP, "write_back")?;
        let out = self.swap_system.swapped_out();
        if !out.keeps_copies() {
            return Ok(0);
        }
        let out = out.id();

        let dirty: Vec<PageDescriptor> = self
            .table
            .lock_blocking()
            .descriptors()
            .into_iter()
            .filter(|descriptor| {
                descriptor.tier() != out && self.kernel_paging.is_dirty(&descriptor.key(self.id))
            })
            .collect();

        for page in &dirty {
            // Written along with an earlier page of its unit.
            if !self.kernel_paging.is_dirty(&page.key(self.id)) {
                continue;
            }
            let unit = self
                .swap_system
                .unit_region(page.start())
                .map_err(|source| self.swap_error(page.start(), source))?;
            self.synchronize(credentials, page, &PageDescriptor::new(unit, out))?;
        }

        if !dirty.is_empty() {
            info!("{}: wrote back {} page(s)", self.id, dirty.len());
        }
        Ok(dirty.len())
    }

    /// Hull of the pages of `tiers` within `region` that are dirty.
    pub fn dirty_region(&self, region: &Region, tiers: &[TierId]) -> Result<Region, MemoryError> {
        self.region_where(region, tiers, "dirty_region", true)
    }

    /// Hull of the pages of `tiers` within `region` that are clean.
    pub fn clean_region(&self, region: &Region, tiers: &[TierId]) -> Result<Region, MemoryError> {
        self.region_where(region, tiers, "clean_region", false)
    }

    /// Mark every page of `tiers` within `region` dirty.
    pub fn dirty_all(&self, region: &Region, tiers: &[TierId]) -> Result<(), MemoryError> {
        for key in self.keys_in(region, tiers, "dirty_all")? {
            self.kernel_paging.dirty(&key);
        }
        Ok(())
    }

    /// Mark every page of `tiers` within `region` clean.
    pub fn clean_all(&self, region: &Region, tiers: &[TierId]) -> Result<(), MemoryError> {
        for key in self.keys_in(region, tiers, "clean_all")? {
            self.kernel_paging.clean(&key);
        }
        Ok(())
    }

    fn region_where(
        &self,
        region: &Region,
        tiers: &[TierId],
        operation: &'static str,
        dirty: bool,
    ) -> Result<Region, MemoryError> {
        let table = self.table.lock_blocking();
        let pages = self.tier_pages(&*table, region, tiers, operation)?;
        Ok(pages
            .into_iter()
            .filter(|page| self.kernel_paging.is_dirty(&page.key(self.id)) == dirty)
            .map(|page| page.region().intersection(region))
            .fold(self.swap_system.space().empty(), |hull, part| hull.hull(&part)))
    }

    fn keys_in(
        &self,
        region: &Region,
        tiers: &[TierId],
        operation: &'static str,
    ) -> Result<Vec<PageKey>, MemoryError> {
        let table = self.table.lock_blocking();
        let pages = self.tier_pages(&*table, region, tiers, operation)?;
        Ok(pages.into_iter().map(|page| page.key(self.id)).collect())
    }

    fn tier_pages<'t>(
        &self,
        table: &'t T,
        region: &Region,
        tiers: &[TierId],
        operation: &'static str,
    ) -> Result<Vec<&'t Page>, MemoryError> {
        if tiers.is_empty() {
            return Err(MemoryError::InvalidArgument {
                operation,
                reason: "at least one tier is required",
            });
        }
        self.check_space(region, operation)?;
        let pages = table.pages(region).map_err(|e| self.table_error(e))?;
        Ok(pages
            .into_iter()
            .filter(|page| tiers.contains(&page.tier()))
            .collect())
    }

    fn fields_tier(&self) -> TierId {
        self.swap_system.swapped_in_to_fields().id()
    }

    /// Swap the unit containing `position` to `target`, installing the result.
    ///
    /// Returns whether anything moved.
    fn swap_to(
        &self,
        table: &mut T,
        credentials: &Credentials,
        position: Position,
        target: TierId,
    ) -> Result<bool, MemoryError> {
        let mut operation = self
            .swap_system
            .create_swap_operation(self.id, &*table, &self.swap_configuration, position, target)
            .map_err(|source| self.swap_error(position, source))?;
        if operation.is_empty() {
            return Ok(false);
        }

        operation
            .swap(credentials)
            .map_err(|source| self.swap_error(position, source))?;
        let pages = operation
            .into_target_pages()
            .map_err(|source| self.swap_error(position, source))?;

        let keys: Vec<PageKey> = pages.iter().map(|page| page.key(self.id)).collect();
        let displaced = table.put(pages).map_err(|e| self.table_error(e))?;
        let mut unsaved = false;
        for page in &displaced {
            let key = page.key(self.id);
            unsaved |= self.kernel_paging.is_dirty(&key);
            self.kernel_paging.forget(&key);
        }
        // Data only reaches a saved copy when it lands in a tier that keeps one.
        let saved = self
            .swap_system
            .state(target)
            .is_some_and(|state| state.keeps_copies());
        for key in &keys {
            if unsaved && !saved {
                self.kernel_paging.dirty(key);
            } else {
                self.kernel_paging.clean(key);
            }
        }
        Ok(true)
    }

    /// Bring every page covering `region` into the fields tier.
    fn swap_in_region(
        &self,
        table: &mut T,
        credentials: &Credentials,
        region: &Region,
    ) -> Result<(), MemoryError> {
        let fields = self.fields_tier();
        let pending: Vec<Position> = table
            .pages(region)
            .map_err(|e| self.table_error(e))?
            .into_iter()
            .filter(|page| page.tier() != fields)
            .map(|page| page.start())
            .collect();

        for position in pending {
            // An earlier swap in this loop may have brought the whole unit in.
            let tier = table
                .page(position)
                .map_err(|e| self.table_error(e))?
                .tier();
            if tier != fields {
                self.swap_to(table, credentials, position, fields)?;
            }
        }

        for page in table.pages(region).map_err(|e| self.table_error(e))? {
            if page.tier() != fields || !page.is_resident() {
                return Err(self.corrupt(
                    page.start(),
                    format!("page in tier {} after swap-in", page.tier()),
                ));
            }
        }
        Ok(())
    }

    /// Free pages already taken out of the table, best effort.
    fn release_pages(&self, pages: Vec<Page>) -> Result<(), MemoryError> {
        let mut first_failure = None;
        for page in pages {
            let start = page.start();
            let tier = page.tier();
            self.kernel_paging.forget(&page.key(self.id));

            let mut failures = Vec::new();
            match self.swap_system.state(tier) {
                Some(state) => {
                    if let Err(e) = state.free_page(page) {
                        failures.push(e);
                    }
                }
                None => failures.push(SwapError::UnknownTier(tier)),
            }
            // Copies of the page kept in more swapped-out tiers.
            for state in self.swap_system.swap_states() {
                if state.id() == tier {
                    break;
                }
                if start.is_aligned(state.page_size()) {
                    let configuration = self.swap_configuration.for_swap_state(state.id());
                    if let Err(e) = state.discard(start, configuration) {
                        failures.push(e);
                    }
                }
            }

            for source in failures {
                warn!("{}: freeing page at {} failed: {}", self.id, start, source);
                if first_failure.is_none() {
                    first_failure = Some(MemoryError::Free {
                        area: self.id,
                        position: start,
                        source,
                    });
                }
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn check(
        &self,
        credentials: &Credentials,
        required: Permissions,
        operation: &'static str,
    ) -> Result<(), MemoryError> {
        if credentials.is_anonymous() {
            return Err(MemoryError::InvalidArgument {
                operation,
                reason: "null credentials",
            });
        }
        if !credentials.allows(required) {
            warn!("{}: {} lacks permission for {}", self.id, credentials, operation);
            return Err(MemoryError::PermissionDenied {
                area: self.id,
                operation,
                required,
            });
        }
        Ok(())
    }

    fn check_space(&self, region: &Region, operation: &'static str) -> Result<(), MemoryError> {
        if region.space() != self.swap_system.space() {
            return Err(MemoryError::InvalidArgument {
                operation,
                reason: "region belongs to another space",
            });
        }
        Ok(())
    }

    /// Region of up to `size` positions at `start`, clamped to the area.
    fn source_region(
        &self,
        table: &T,
        start: Position,
        size: Size,
        operation: &'static str,
    ) -> Result<Region, MemoryError> {
        let area = table.region();
        if !area.contains(start) {
            return Err(MemoryError::InvalidArgument {
                operation,
                reason: "start lies outside the area",
            });
        }
        let end = start.add(Size::new(size.count() - 1)).min(area.end());
        self.swap_system
            .space()
            .region(start, end)
            .map_err(|_| MemoryError::InvalidArgument {
                operation,
                reason: "region runs out of bounds",
            })
    }

    fn field_region(
        &self,
        table: &T,
        position: Position,
        operation: &'static str,
    ) -> Result<Region, MemoryError> {
        self.source_region(table, position, Size::ONE, operation)
    }

    fn table_error(&self, source: PageTableError) -> MemoryError {
        MemoryError::PageTable {
            area: self.id,
            source,
        }
    }

    fn buffer_error(&self, source: BufferError) -> MemoryError {
        MemoryError::Buffer {
            area: self.id,
            source,
        }
    }

    fn swap_error(&self, position: Position, source: SwapError) -> MemoryError {
        warn!("{}: swap at {} failed: {}", self.id, position, source);
        MemoryError::Swap {
            area: self.id,
            position,
            source,
        }
    }

    fn corrupt(&self, position: Position, detail: impl Into<String>) -> MemoryError {
        let detail = detail.into();
        error!("{}: page table corrupt at {}: {}", self.id, position, detail);
        MemoryError::Corrupt {
            area: self.id,
            position,
            detail,
        }
    }
}

impl<T: PageTable> fmt::Debug for PagedArea<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedArea")
            .field("id", &self.id)
            .field("swap_system", &self.swap_system)
            .field("swap_configuration", &self.swap_configuration)
            .finish_non_exhaustive()
    }
}

/// First and last position of a contiguous run being copied.
#[derive(Default)]
struct Filled {
    first: Option<Position>,
    last: Option<Position>,
}

impl Filled {
    fn push(&mut self, position: Position) {
        self.first.get_or_insert(position);
        self.last = Some(position);
    }

    fn region(&self, space: Space) -> Region {
        match (self.first, self.last) {
            (Some(first), Some(last)) => space.region(first, last).unwrap_or_else(|_| space.empty()),
            _ => space.empty(),
        }
    }
}
