//! Addressable coordinate value object.

use super::Size;
use core::fmt;

/// A single addressable coordinate within a [`Space`](super::Space).
///
/// Positions are totally ordered. The largest representable value is
/// reserved as the out-of-bounds sentinel: stepping past the last valid
/// position, or before the origin, yields it instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position(u64);

impl Position {
    /// The first position of every space.
    pub const ORIGIN: Self = Self(0);

    /// Sentinel for "no position".
    pub const OUT_OF_BOUNDS: Self = Self(u64::MAX);

    /// Create a new position.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagers::Position;
    ///
    /// let position = Position::new(7);
    /// assert_eq!(position.index(), 7);
    /// ```
    #[inline]
    pub const fn new(index: u64) -> Self {
        Self(index)
    }

    /// Get the underlying index.
    #[inline]
    pub const fn index(self) -> u64 {
        self.0
    }

    /// Check whether this is the out-of-bounds sentinel.
    #[inline]
    pub const fn is_out_of_bounds(self) -> bool {
        self.0 == u64::MAX
    }

    /// The following position, or the sentinel past the last one.
    #[inline]
    pub const fn next(self) -> Self {
        if self.0 >= u64::MAX - 1 {
            Self::OUT_OF_BOUNDS
        } else {
            Self(self.0 + 1)
        }
    }

    /// The preceding position, or the sentinel before the origin.
    #[inline]
    pub const fn previous(self) -> Self {
        if self.0 == 0 || self.is_out_of_bounds() {
            Self::OUT_OF_BOUNDS
        } else {
            Self(self.0 - 1)
        }
    }

    /// Advance by `size` positions.
    #[inline]
    pub const fn add(self, size: Size) -> Self {
        if self.is_out_of_bounds() {
            return Self::OUT_OF_BOUNDS;
        }
        match self.0.checked_add(size.count()) {
            Some(index) if index != u64::MAX => Self(index),
            _ => Self::OUT_OF_BOUNDS,
        }
    }

    /// Distance from `origin` to this position, zero if `origin` lies after it.
    #[inline]
    pub const fn offset_from(self, origin: Position) -> Size {
        Size::new(self.0.saturating_sub(origin.0))
    }

    /// Round down to a multiple of `page_size`.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    #[inline]
    pub const fn align_down(self, page_size: Size) -> Self {
        assert!(!page_size.is_zero(), "page size must be non-zero");
        Self(self.0 - self.0 % page_size.count())
    }

    /// Check whether this position starts a page of `page_size`.
    #[inline]
    pub const fn is_aligned(self, page_size: Size) -> bool {
        !page_size.is_zero() && self.0 % page_size.count() == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_out_of_bounds() {
            write!(f, "Position(out of bounds)")
        } else {
            write!(f, "Position({})", self.0)
        }
    }
}

impl From<u64> for Position {
    fn from(index: u64) -> Self {
        Self::new(index)
    }
}

impl From<Position> for u64 {
    fn from(position: Position) -> Self {
        position.index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_and_previous() {
        let position = Position::new(5);
        assert_eq!(position.next(), Position::new(6));
        assert_eq!(position.previous(), Position::new(4));
    }

    #[test]
    fn test_previous_of_origin_is_sentinel() {
        assert!(Position::ORIGIN.previous().is_out_of_bounds());
    }

    #[test]
    fn test_next_saturates_to_sentinel() {
        assert!(Position::new(u64::MAX - 1).next().is_out_of_bounds());
        assert!(Position::OUT_OF_BOUNDS.next().is_out_of_bounds());
    }

    #[test]
    fn test_add_and_offset() {
        let start = Position::new(8);
        assert_eq!(start.add(Size::new(4)), Position::new(12));
        assert_eq!(Position::new(12).offset_from(start), Size::new(4));
        assert_eq!(start.offset_from(Position::new(12)), Size::ZERO);
        assert!(Position::new(u64::MAX - 2).add(Size::new(5)).is_out_of_bounds());
    }

    #[test]
    fn test_align_down() {
        assert_eq!(Position::new(13).align_down(Size::new(4)), Position::new(12));
        assert_eq!(Position::new(12).align_down(Size::new(4)), Position::new(12));
        assert!(Position::new(12).is_aligned(Size::new(4)));
        assert!(!Position::new(13).is_aligned(Size::new(4)));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Position::new(3)), "Position(3)");
        assert_eq!(format!("{}", Position::OUT_OF_BOUNDS), "Position(out of bounds)");
    }
}
