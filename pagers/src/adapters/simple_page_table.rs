//! Ordered-map page table.

use crate::domain::entities::{Page, PageDescriptor};
use crate::domain::error::PageTableError;
use crate::domain::ports::PageTable;
use crate::domain::value_objects::{Position, Region, Space};
use crate::domain::PagedArea;
use std::collections::BTreeMap;

/// A paged area over a [`SimplePageTable`].
pub type SimplePagedArea = PagedArea<SimplePageTable>;

/// Page table keyed by each page's first position.
///
/// Pages never overlap, so ordering by start also orders by end, and the
/// page covering a position is the last one starting at or before it.
#[derive(Debug, Clone)]
pub struct SimplePageTable {
    space: Space,
    pages: BTreeMap<Position, Page>,
}

impl SimplePageTable {
    /// Create an empty table for `space`.
    pub fn new(space: Space) -> Self {
        Self {
            space,
            pages: BTreeMap::new(),
        }
    }

    fn check_space(&self, space: Space) -> Result<(), PageTableError> {
        if space != self.space {
            return Err(PageTableError::SpaceMismatch {
                expected: self.space,
                actual: space,
            });
        }
        Ok(())
    }

    /// Start of the first page of a fully covered `region`.
    fn covering(&self, region: &Region) -> Result<Position, PageTableError> {
        self.check_space(region.space())?;
        let not_covered = || PageTableError::RegionNotCovered {
            requested: *region,
            covered: self.region(),
        };

        let (first, _) = self
            .pages
            .range(..=region.start())
            .next_back()
            .ok_or_else(not_covered)?;

        let mut expected = region.start();
        for (_, page) in self.pages.range(*first..=region.end()) {
            if !page.region().contains(expected) {
                return Err(not_covered());
            }
            expected = page.region().end().next();
        }
        if expected <= region.end() {
            return Err(not_covered());
        }
        Ok(*first)
    }

    fn covering_start(&self, position: Position) -> Result<Position, PageTableError> {
        match self.pages.range(..=position).next_back() {
            Some((start, page)) if page.region().contains(position) => Ok(*start),
            _ => Err(PageTableError::NoSuchPage { position }),
        }
    }

    fn overlapping(&self, region: &Region) -> Vec<Position> {
        self.pages
            .range(..=region.end())
            .rev()
            .take_while(|(_, page)| page.region().end() >= region.start())
            .map(|(start, _)| *start)
            .collect()
    }
}

impl PageTable for SimplePageTable {
    fn space(&self) -> Space {
        self.space
    }

    fn region(&self) -> Region {
        match (self.pages.values().next(), self.pages.values().next_back()) {
            (Some(first), Some(last)) => first.region().hull(&last.region()),
            _ => self.space.empty(),
        }
    }

    fn len(&self) -> usize {
        self.pages.len()
    }

    fn pages(&self, region: &Region) -> Result<Vec<&Page>, PageTableError> {
        if region.is_empty() {
            return Ok(Vec::new());
        }
        let first = self.covering(region)?;
        Ok(self.pages.range(first..=region.end()).map(|(_, page)| page).collect())
    }

    fn pages_mut(&mut self, region: &Region) -> Result<Vec<&mut Page>, PageTableError> {
        if region.is_empty() {
            return Ok(Vec::new());
        }
        let first = self.covering(region)?;
        Ok(self
            .pages
            .range_mut(first..=region.end())
            .map(|(_, page)| page)
            .collect())
    }

    fn page(&self, position: Position) -> Result<&Page, PageTableError> {
        let start = self.covering_start(position)?;
        self.pages
            .get(&start)
            .ok_or(PageTableError::NoSuchPage { position })
    }

    fn page_mut(&mut self, position: Position) -> Result<&mut Page, PageTableError> {
        let start = self.covering_start(position)?;
        self.pages
            .get_mut(&start)
            .ok_or(PageTableError::NoSuchPage { position })
    }

    fn put(&mut self, pages: Vec<Page>) -> Result<Vec<Page>, PageTableError> {
        for page in &pages {
            self.check_space(page.region().space())?;
        }

        let mut displaced = Vec::new();
        for page in pages {
            for start in self.overlapping(&page.region()) {
                if let Some(old) = self.pages.remove(&start) {
                    displaced.push(old);
                }
            }
            self.pages.insert(page.start(), page);
        }
        Ok(displaced)
    }

    fn remove(&mut self, pages: &[PageDescriptor]) -> Result<Vec<Page>, PageTableError> {
        for descriptor in pages {
            match self.pages.get(&descriptor.start()) {
                Some(page) if page.descriptor() == *descriptor => {}
                _ => return Err(PageTableError::UnknownPage { page: *descriptor }),
            }
        }
        Ok(pages
            .iter()
            .filter_map(|descriptor| self.pages.remove(&descriptor.start()))
            .collect())
    }

    fn take_all(&mut self) -> Result<Vec<Page>, PageTableError> {
        Ok(core::mem::take(&mut self.pages).into_values().collect())
    }

    fn descriptors(&self) -> Vec<PageDescriptor> {
        self.pages.values().map(Page::descriptor).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Buffer, Field};
    use crate::domain::value_objects::TierId;

    const FIELDS: TierId = TierId::new("fields");

    fn region(start: u64, end: u64) -> Region {
        Space::default()
            .region(Position::new(start), Position::new(end))
            .unwrap()
    }

    fn page(start: u64, end: u64) -> Page {
        Page::resident(FIELDS, Buffer::new(region(start, end)))
    }

    fn table() -> SimplePageTable {
        let mut table = SimplePageTable::new(Space::default());
        table.put(vec![page(0, 3), page(4, 7), page(8, 11)]).unwrap();
        table
    }

    #[test]
    fn test_region_and_len() {
        let table = table();
        assert_eq!(table.len(), 3);
        assert_eq!(table.region(), region(0, 11));
        assert!(SimplePageTable::new(Space::default()).region().is_empty());
    }

    #[test]
    fn test_pages_in_order() {
        let table = table();
        let starts: Vec<u64> = table
            .pages(&region(2, 9))
            .unwrap()
            .iter()
            .map(|page| page.start().index())
            .collect();
        assert_eq!(starts, vec![0, 4, 8]);
        assert_eq!(table.pages(&region(5, 6)).unwrap().len(), 1);
        assert!(table.pages(&Space::default().empty()).unwrap().is_empty());
    }

    #[test]
    fn test_pages_rejects_uncovered() {
        let table = table();
        assert!(matches!(
            table.pages(&region(8, 12)),
            Err(PageTableError::RegionNotCovered { .. })
        ));

        let mut gappy = SimplePageTable::new(Space::default());
        gappy.put(vec![page(0, 3), page(8, 11)]).unwrap();
        assert!(gappy.pages(&region(2, 9)).is_err());
        assert!(gappy.pages(&region(8, 9)).is_ok());
    }

    #[test]
    fn test_page_lookup() {
        let mut table = table();
        assert_eq!(table.page(Position::new(6)).unwrap().start(), Position::new(4));
        assert!(matches!(
            table.page(Position::new(12)),
            Err(PageTableError::NoSuchPage { .. })
        ));

        let page = table.page_mut(Position::new(9)).unwrap();
        page.buffer_mut()
            .unwrap()
            .set(Position::new(9), Field::Int(9))
            .unwrap();
        assert_eq!(
            table.page(Position::new(9)).unwrap().buffer().unwrap().get(Position::new(9)),
            Ok(&Field::Int(9))
        );
    }

    #[test]
    fn test_put_displaces_overlapping() {
        let mut table = table();
        let displaced = table.put(vec![page(0, 7)]).unwrap();
        assert_eq!(displaced.len(), 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.region(), region(0, 11));
    }

    #[test]
    fn test_put_rejects_other_space() {
        let mut table = table();
        let other = Space::new(2).region(Position::new(0), Position::new(3)).unwrap();
        let result = table.put(vec![Page::resident(FIELDS, Buffer::new(other))]);
        assert!(matches!(result, Err(PageTableError::SpaceMismatch { .. })));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_remove_is_all_or_nothing() {
        let mut table = table();
        let known = PageDescriptor::new(region(0, 3), FIELDS);
        let unknown = PageDescriptor::new(region(12, 15), FIELDS);
        assert!(table.remove(&[known, unknown]).is_err());
        assert_eq!(table.len(), 3);

        let removed = table.remove(&[known]).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(table.region(), region(4, 11));
    }

    #[test]
    fn test_take_all() {
        let mut table = table();
        assert_eq!(table.take_all().unwrap().len(), 3);
        assert!(table.is_empty());
    }
}
