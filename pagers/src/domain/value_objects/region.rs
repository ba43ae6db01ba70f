//! Regions and the spaces they live in.

use super::{Position, Size};
use core::fmt;
use core::ops::Range;

/// The owner of positions, sizes and regions.
///
/// Regions remember the space they were made in, and a paged area refuses
/// regions from any space other than its page table's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Space {
    id: u32,
}

impl Space {
    /// Create a space with the given identity.
    pub const fn new(id: u32) -> Self {
        Self { id }
    }

    /// Identity of this space.
    pub const fn id(self) -> u32 {
        self.id
    }

    /// The first position.
    pub const fn origin(self) -> Position {
        Position::ORIGIN
    }

    /// The size of a single position.
    pub const fn one(self) -> Size {
        Size::ONE
    }

    /// The out-of-bounds sentinel position.
    pub const fn out_of_bounds(self) -> Position {
        Position::OUT_OF_BOUNDS
    }

    /// The canonical empty region of this space.
    pub const fn empty(self) -> Region {
        Region {
            space: self,
            start: Position::OUT_OF_BOUNDS,
            end: Position::OUT_OF_BOUNDS,
        }
    }

    /// Create the inclusive region `[start, end]`.
    ///
    /// # Errors
    ///
    /// Fails if either bound is the sentinel or if `start > end`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagers::{Position, Space};
    ///
    /// let space = Space::default();
    /// let region = space.region(Position::new(2), Position::new(5)).unwrap();
    /// assert_eq!(region.len(), 4);
    /// assert!(space.region(Position::new(5), Position::new(2)).is_err());
    /// ```
    pub const fn region(self, start: Position, end: Position) -> Result<Region, AddressError> {
        if start.is_out_of_bounds() || end.is_out_of_bounds() {
            return Err(AddressError::OutOfBounds);
        }
        if start.index() > end.index() {
            return Err(AddressError::InvertedBounds { start, end });
        }
        Ok(Region {
            space: self,
            start,
            end,
        })
    }

    /// Create the region of `size` positions beginning at `start`.
    ///
    /// A zero size yields the empty region.
    pub fn region_of(self, start: Position, size: Size) -> Result<Region, AddressError> {
        if size.is_zero() {
            return Ok(self.empty());
        }
        let end = start.add(Size::new(size.count() - 1));
        if end.is_out_of_bounds() {
            return Err(AddressError::OutOfBounds);
        }
        self.region(start, end)
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Space({})", self.id)
    }
}

/// An inclusive range of positions within one [`Space`].
///
/// Either `start <= end`, or both bounds are the out-of-bounds sentinel and
/// the region is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    space: Space,
    start: Position,
    end: Position,
}

impl Region {
    /// The space this region belongs to.
    #[inline]
    pub const fn space(&self) -> Space {
        self.space
    }

    /// First position, or the sentinel when empty.
    #[inline]
    pub const fn start(&self) -> Position {
        self.start
    }

    /// Last position, or the sentinel when empty.
    #[inline]
    pub const fn end(&self) -> Position {
        self.end
    }

    /// Check whether this is the empty region.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start.is_out_of_bounds()
    }

    /// Number of positions covered.
    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.len())
    }

    /// Number of positions covered, as a plain count.
    #[inline]
    pub const fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.end.index() - self.start.index() + 1
        }
    }

    /// Check whether `position` lies inside this region.
    #[inline]
    pub fn contains(&self, position: Position) -> bool {
        !self.is_empty() && self.start <= position && position <= self.end
    }

    /// The positions common to both regions.
    ///
    /// Disjoint regions, and regions of different spaces, have an empty
    /// intersection.
    pub fn intersection(&self, other: &Region) -> Region {
        if self.is_empty() || other.is_empty() || self.space != other.space {
            return self.space.empty();
        }
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start > end {
            return self.space.empty();
        }
        Region {
            space: self.space,
            start,
            end,
        }
    }

    /// Check whether every position of this region lies in `other`.
    ///
    /// The empty region is a subset of every region.
    pub fn is_subset_of(&self, other: &Region) -> bool {
        if self.is_empty() {
            return true;
        }
        self.space == other.space && other.contains(self.start) && other.contains(self.end)
    }

    /// Smallest region covering both regions.
    pub fn hull(&self, other: &Region) -> Region {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Region {
            space: self.space,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Iterate over every position in order.
    pub fn positions(self) -> impl Iterator<Item = Position> {
        let range = if self.is_empty() {
            1..=0
        } else {
            self.start.index()..=self.end.index()
        };
        range.map(Position::new)
    }

    /// Smallest region of whole pages of `page_size` covering this one.
    ///
    /// This is the translation from a region of fields to a region of
    /// pages.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagers::{Position, Size, Space};
    ///
    /// let space = Space::default();
    /// let region = space.region(Position::new(5), Position::new(9)).unwrap();
    /// let pages = region.page_aligned(Size::new(4));
    /// assert_eq!(pages.start(), Position::new(4));
    /// assert_eq!(pages.end(), Position::new(11));
    /// ```
    pub fn page_aligned(&self, page_size: Size) -> Region {
        if self.is_empty() {
            return *self;
        }
        let start = self.start.align_down(page_size);
        let last_page = self.end.align_down(page_size);
        let end = last_page.add(Size::new(page_size.count() - 1));
        Region {
            space: self.space,
            start,
            // The last page of the space may be cut short by the sentinel.
            end: if end.is_out_of_bounds() {
                self.space.out_of_bounds().previous()
            } else {
                end
            },
        }
    }

    /// Indices of the pages of `page_size` this region touches.
    pub fn page_indices(&self, page_size: Size) -> Range<u64> {
        if self.is_empty() {
            return 0..0;
        }
        let page = page_size.count();
        assert!(page != 0, "page size must be non-zero");
        self.start.index() / page..self.end.index() / page + 1
    }

    /// Start positions of the pages of `page_size` this region touches.
    pub fn page_starts(&self, page_size: Size) -> impl Iterator<Item = Position> {
        let page = page_size.count();
        self.page_indices(page_size)
            .map(move |index| Position::new(index * page))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "[empty]")
        } else {
            write!(f, "[{}..={}]", self.start.index(), self.end.index())
        }
    }
}

/// Errors building regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AddressError {
    /// The start of the region lies after its end.
    InvertedBounds {
        /// Requested start.
        start: Position,
        /// Requested end.
        end: Position,
    },
    /// A bound is the out-of-bounds sentinel, or the region runs past it.
    OutOfBounds,
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvertedBounds { start, end } => {
                write!(f, "Region start {} lies after its end {}", start, end)
            }
            Self::OutOfBounds => write!(f, "Region runs out of bounds"),
        }
    }
}

impl core::error::Error for AddressError {}
