//! KernelPaging port - process-wide dirty and recency bookkeeping.

use crate::domain::value_objects::PageKey;

/// Per-page dirty flags and recency shared by every paged area.
///
/// Implementations are internally synchronized. Paged areas only read and
/// update flags through this trait; they never evict.
pub trait KernelPaging: Send + Sync {
    /// Check whether the page differs from its swapped-out copy.
    fn is_dirty(&self, key: &PageKey) -> bool;

    /// Mark the page dirty and recently used.
    fn dirty(&self, key: &PageKey);

    /// Clear the dirty flag and mark the page recently used.
    fn clean(&self, key: &PageKey);

    /// Mark the page recently used.
    fn recent(&self, key: &PageKey);

    /// Drop everything known about the page.
    fn forget(&self, key: &PageKey);
}
