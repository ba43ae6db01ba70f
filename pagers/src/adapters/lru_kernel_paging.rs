//! Kernel paging bookkeeping with least-recently-used ordering.

use crate::domain::ports::KernelPaging;
use crate::domain::value_objects::PageKey;
use async_lock::Mutex;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct PageRecord {
    dirty: bool,
    last_used: u64,
}

/// Dirty flags and a logical use clock for every known page.
///
/// One instance is shared by every paged area of a process. Eviction policy
/// lives with the caller: this type only answers which pages were used
/// least recently.
#[derive(Default)]
pub struct LruKernelPaging {
    records: Mutex<HashMap<PageKey, PageRecord>>,
    clock: AtomicU64,
}

impl LruKernelPaging {
    /// Create empty bookkeeping.
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn touch(&self, key: &PageKey, dirty: Option<bool>) {
        let now = self.tick();
        let mut records = self.records.lock_blocking();
        let record = records.entry(*key).or_insert(PageRecord {
            dirty: false,
            last_used: now,
        });
        record.last_used = now;
        if let Some(dirty) = dirty {
            record.dirty = dirty;
        }
    }

    /// Logical time the page was last used, if known.
    pub fn recency(&self, key: &PageKey) -> Option<u64> {
        self.records
            .lock_blocking()
            .get(key)
            .map(|record| record.last_used)
    }

    /// Up to `limit` known pages, least recently used first.
    pub fn least_recently_used(&self, limit: usize) -> Vec<PageKey> {
        let records = self.records.lock_blocking();
        let mut keys: Vec<(u64, PageKey)> = records
            .iter()
            .map(|(key, record)| (record.last_used, *key))
            .collect();
        keys.sort();
        keys.into_iter().take(limit).map(|(_, key)| key).collect()
    }

    /// Number of dirty pages.
    pub fn dirty_count(&self) -> usize {
        self.records
            .lock_blocking()
            .values()
            .filter(|record| record.dirty)
            .count()
    }

    /// Number of known pages.
    pub fn len(&self) -> usize {
        self.records.lock_blocking().len()
    }

    /// Check whether no page is known.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KernelPaging for LruKernelPaging {
    fn is_dirty(&self, key: &PageKey) -> bool {
        self.records
            .lock_blocking()
            .get(key)
            .is_some_and(|record| record.dirty)
    }

    fn dirty(&self, key: &PageKey) {
        self.touch(key, Some(true));
    }

    fn clean(&self, key: &PageKey) {
        self.touch(key, Some(false));
    }

    fn recent(&self, key: &PageKey) {
        self.touch(key, None);
    }

    fn forget(&self, key: &PageKey) {
        self.records.lock_blocking().remove(key);
    }
}

impl fmt::Debug for LruKernelPaging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruKernelPaging")
            .field("pages", &self.len())
            .field("dirty", &self.dirty_count())
            .finish()
    }
}
