//! Magnitude value object.

use core::fmt;

/// A number of positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Size(u64);

impl Size {
    /// No positions.
    pub const ZERO: Self = Self(0);

    /// A single position.
    pub const ONE: Self = Self(1);

    /// Create a size covering `count` positions.
    #[inline]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    /// Number of positions.
    #[inline]
    pub const fn count(self) -> u64 {
        self.0
    }

    /// Check whether this size covers nothing.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Number of pages of `page_size` needed to cover this size, rounded up.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagers::Size;
    ///
    /// assert_eq!(Size::new(10).pages_needed(Size::new(4)), 3);
    /// assert_eq!(Size::new(8).pages_needed(Size::new(4)), 2);
    /// assert_eq!(Size::ZERO.pages_needed(Size::new(4)), 0);
    /// ```
    #[inline]
    pub const fn pages_needed(self, page_size: Size) -> u64 {
        assert!(!page_size.is_zero(), "page size must be non-zero");
        self.0.div_ceil(page_size.0)
    }

    /// Size of `count` units of this size, saturating.
    #[inline]
    pub const fn multiply(self, count: u64) -> Self {
        Self(self.0.saturating_mul(count))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Size({})", self.0)
    }
}

impl From<u64> for Size {
    fn from(count: u64) -> Self {
        Self::new(count)
    }
}

impl From<usize> for Size {
    fn from(count: usize) -> Self {
        Self::new(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_needed_rounds_up() {
        let page = Size::new(4);
        assert_eq!(Size::new(1).pages_needed(page), 1);
        assert_eq!(Size::new(4).pages_needed(page), 1);
        assert_eq!(Size::new(5).pages_needed(page), 2);
        assert_eq!(Size::new(10).pages_needed(page), 3);
    }

    #[test]
    #[should_panic]
    fn test_pages_needed_zero_page_size() {
        let _ = Size::new(4).pages_needed(Size::ZERO);
    }

    #[test]
    fn test_multiply_saturates() {
        assert_eq!(Size::new(4).multiply(3), Size::new(12));
        assert_eq!(Size::new(u64::MAX).multiply(2), Size::new(u64::MAX));
    }
}
