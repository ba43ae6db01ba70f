//! PageTable port - the position-to-page map owned by one paged area.

use crate::domain::entities::{Page, PageDescriptor};
use crate::domain::error::PageTableError;
use crate::domain::value_objects::{Position, Region, Space};

/// Map from positions to the pages covering them.
///
/// A table is owned by exactly one paged area, which keeps it behind its
/// lock. Pages in a table never overlap. The table never creates pages on
/// its own; the paged area creates them through the tier's swap state and
/// hands them over with [`put`](PageTable::put).
///
/// # Examples
///
/// ```ignore
/// let mut table = SimplePageTable::new(space);
/// table.put(vec![page])?;
/// let page = table.page(Position::new(3))?;
/// ```
pub trait PageTable: Send {
    /// Space the table's positions belong to.
    fn space(&self) -> Space;

    /// Hull of all covered positions, the empty region when the table is empty.
    fn region(&self) -> Region;

    /// Number of pages.
    fn len(&self) -> usize;

    /// Check whether the table holds no pages.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All pages intersecting `region`, in position order.
    ///
    /// # Errors
    ///
    /// Fails with [`PageTableError::RegionNotCovered`] unless every position
    /// of `region` is covered. The empty region yields no pages.
    fn pages(&self, region: &Region) -> Result<Vec<&Page>, PageTableError>;

    /// Mutable form of [`pages`](PageTable::pages).
    fn pages_mut(&mut self, region: &Region) -> Result<Vec<&mut Page>, PageTableError>;

    /// The one page covering `position`.
    fn page(&self, position: Position) -> Result<&Page, PageTableError>;

    /// Mutable form of [`page`](PageTable::page).
    fn page_mut(&mut self, position: Position) -> Result<&mut Page, PageTableError>;

    /// Insert pages, replacing any existing pages they overlap.
    ///
    /// Returns the displaced pages.
    fn put(&mut self, pages: Vec<Page>) -> Result<Vec<Page>, PageTableError>;

    /// Remove the described pages.
    ///
    /// Nothing is removed if any descriptor names a page not in the table.
    fn remove(&mut self, pages: &[PageDescriptor]) -> Result<Vec<Page>, PageTableError>;

    /// Remove and return every page.
    fn take_all(&mut self) -> Result<Vec<Page>, PageTableError>;

    /// Descriptors of every page, in position order.
    fn descriptors(&self) -> Vec<PageDescriptor>;
}
