//! Paged area tests over a single resident tier
//!
//! These tests cover:
//! - Field copies across page boundaries and clamping at the end of the area
//! - Resize rounding, shrinking and growing
//! - Freeing every page even when some fail
//! - Page tables that resolve a position to the wrong number of pages
//! - Credential checks

use std::sync::atomic::{AtomicUsize, Ordering};

use pagers::prelude::*;

const FIELDS: TierId = TierId::new("fields");
const PAGE_SIZE: u64 = 4;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn cred() -> Credentials {
    Credentials::owner_with_all("test")
}

fn space() -> Space {
    Space::default()
}

fn region(start: u64, len: u64) -> Region {
    space().region_of(Position::new(start), Size::new(len)).unwrap()
}

fn area_with<T: PageTable>(tier: Arc<dyn SwapState>, table: T) -> PagedArea<T> {
    let id = tier.id();
    let system = Arc::new(SwapSystem::new(tier, id, Vec::new()).unwrap());
    PagedArea::new(
        PagedAreaId::new(7),
        system,
        SwapConfiguration::new(),
        Arc::new(LruKernelPaging::new()),
        table,
    )
    .unwrap()
}

fn area(len: u64) -> SimplePagedArea {
    let area = area_with(
        Arc::new(FieldSwapState::new(FIELDS, space(), PAGE_SIZE)),
        SimplePageTable::new(space()),
    );
    area.resize(&cred(), region(0, len)).unwrap();
    area
}

fn ints(range: std::ops::Range<i64>) -> Vec<Field> {
    range.map(Field::Int).collect()
}

// =============================================================================
// READ / WRITE
// =============================================================================

/// Ten fields over pages of four span three pages
#[test]
fn test_round_trip_across_pages() {
    init();
    let area = area(10);
    assert_eq!(area.resident_pages(), 3);

    let source = Buffer::from_fields(space(), Position::ORIGIN, ints(0..10));
    let consumed = area
        .write(&cred(), Position::ORIGIN, &source, &source.region())
        .unwrap();
    assert_eq!(consumed, region(0, 10));

    let mut destination = Buffer::with_len(space(), 10);
    let destination_region = destination.region();
    let filled = area
        .read(&cred(), Position::ORIGIN, &mut destination, &destination_region)
        .unwrap();
    assert_eq!(filled, region(0, 10));
    assert_eq!(destination.into_fields(), ints(0..10));
}

/// A write starting mid-page lands at the requested positions only
#[test]
fn test_write_at_offset() {
    init();
    let area = area(12);

    let source = Buffer::from_fields(space(), Position::ORIGIN, ints(100..105));
    area.write(&cred(), Position::new(2), &source, &source.region())
        .unwrap();

    assert_eq!(area.read_field(&cred(), Position::new(1)).unwrap(), Field::Null);
    assert_eq!(area.read_field(&cred(), Position::new(2)).unwrap(), Field::Int(100));
    assert_eq!(area.read_field(&cred(), Position::new(6)).unwrap(), Field::Int(104));
    assert_eq!(area.read_field(&cred(), Position::new(7)).unwrap(), Field::Null);
}

/// Reads running past the end of the area are clamped
#[test]
fn test_read_clamped_at_end() {
    init();
    let area = area(12);
    area.write_field(&cred(), Position::new(11), Field::from("last"))
        .unwrap();

    let mut destination = Buffer::with_len(space(), 5);
    let destination_region = destination.region();
    let filled = area
        .read(&cred(), Position::new(10), &mut destination, &destination_region)
        .unwrap();
    assert_eq!(filled, region(0, 2));
    assert_eq!(destination.get(Position::new(1)).unwrap(), &Field::from("last"));
    assert_eq!(destination.get(Position::new(2)).unwrap(), &Field::Null);
}

/// Only the requested part of the destination buffer is written
#[test]
fn test_read_into_subregion() {
    init();
    let area = area(8);
    let source = Buffer::from_fields(space(), Position::ORIGIN, ints(0..8));
    area.write(&cred(), Position::ORIGIN, &source, &source.region())
        .unwrap();

    let mut destination = Buffer::with_len(space(), 6);
    let filled = area
        .read(&cred(), Position::new(4), &mut destination, &region(3, 2))
        .unwrap();
    assert_eq!(filled, region(3, 2));
    assert_eq!(
        destination.into_fields(),
        vec![
            Field::Null,
            Field::Null,
            Field::Null,
            Field::Int(4),
            Field::Int(5),
            Field::Null
        ]
    );
}

/// Empty requests copy nothing and report the empty region
#[test]
fn test_empty_copy() {
    init();
    let area = area(8);
    let mut destination = Buffer::with_len(space(), 0);
    let filled = area
        .read(&cred(), Position::ORIGIN, &mut destination, &space().empty())
        .unwrap();
    assert!(filled.is_empty());
}

/// Bad arguments are rejected before anything is copied
#[test]
fn test_copy_argument_errors() {
    init();
    let area = area(8);

    let mut destination = Buffer::with_len(space(), 4);
    let result = area.read(&cred(), Position::ORIGIN, &mut destination, &region(2, 4));
    assert!(matches!(result, Err(MemoryError::InvalidArgument { operation: "read", .. })));

    let destination_region = destination.region();
    let result = area.read(&cred(), Position::new(8), &mut destination, &destination_region);
    assert!(matches!(result, Err(MemoryError::InvalidArgument { .. })));

    let foreign = Buffer::with_len(Space::new(9), 4);
    let result = area.write(&cred(), Position::ORIGIN, &foreign, &foreign.region());
    assert!(matches!(result, Err(MemoryError::InvalidArgument { .. })));

    assert!(matches!(
        area.read_field(&cred(), Position::new(8)),
        Err(MemoryError::InvalidArgument { .. })
    ));
}

// =============================================================================
// RESIZE
// =============================================================================

/// Allocation rounds up to whole pages and reports the previous region
#[test]
fn test_resize_rounds_up() {
    init();
    let area = area_with(
        Arc::new(FieldSwapState::new(FIELDS, space(), PAGE_SIZE)),
        SimplePageTable::new(space()),
    );
    assert!(area.region().is_empty());

    let previous = area.resize(&cred(), region(0, 10)).unwrap();
    assert!(previous.is_empty());
    assert_eq!(area.region(), region(0, 12));

    let previous = area.resize(&cred(), region(0, 13)).unwrap();
    assert_eq!(previous, region(0, 12));
    assert_eq!(area.region(), region(0, 16));
    assert_eq!(area.resident_pages(), 4);
}

/// Shrinking frees trailing pages; surviving pages keep their data
#[test]
fn test_resize_shrink_and_grow() {
    init();
    let area = area(12);
    area.write_field(&cred(), Position::new(1), Field::Int(1))
        .unwrap();
    area.write_field(&cred(), Position::new(9), Field::Int(9))
        .unwrap();

    area.resize(&cred(), region(0, 5)).unwrap();
    assert_eq!(area.region(), region(0, 8));
    assert_eq!(area.read_field(&cred(), Position::new(1)).unwrap(), Field::Int(1));

    area.resize(&cred(), region(0, 12)).unwrap();
    assert_eq!(area.read_field(&cred(), Position::new(9)).unwrap(), Field::Null);
}

/// Resizing to the empty region frees everything
#[test]
fn test_resize_to_empty() {
    init();
    let area = area(12);
    let previous = area.resize(&cred(), space().empty()).unwrap();
    assert_eq!(previous, region(0, 12));
    assert!(area.region().is_empty());
    assert_eq!(area.resident_pages(), 0);
}

/// The area must start on a page boundary
#[test]
fn test_resize_misaligned() {
    init();
    let area = area(8);
    assert!(matches!(
        area.resize(&cred(), region(2, 8)),
        Err(MemoryError::InvalidArgument { operation: "resize", .. })
    ));
    assert_eq!(area.region(), region(0, 8));
}

// =============================================================================
// FREE
// =============================================================================

/// Resident tier whose `free_page` fails for one page
#[derive(Debug)]
struct FlakyFreeState {
    inner: FieldSwapState,
    fail_at: Position,
    attempts: AtomicUsize,
}

impl SwapState for FlakyFreeState {
    fn id(&self) -> TierId {
        self.inner.id()
    }

    fn space(&self) -> Space {
        self.inner.space()
    }

    fn page_size(&self) -> Size {
        self.inner.page_size()
    }

    fn holds_fields(&self) -> bool {
        true
    }

    fn create_page(
        &self,
        credentials: &Credentials,
        start: Position,
        configuration: Option<&TierConfig>,
    ) -> Result<Page, SwapError> {
        self.inner.create_page(credentials, start, configuration)
    }

    fn free_page(&self, page: Page) -> Result<(), SwapError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if page.start() == self.fail_at {
            return Err(SwapError::Store(StoreError::Injected {
                operation: "free",
                slot: SwapSlot::new(page.start().index()),
            }));
        }
        Ok(())
    }
}

/// A failure on one page does not stop the others from being freed
#[test]
fn test_free_attempts_every_page() {
    init();
    let tier = Arc::new(FlakyFreeState {
        inner: FieldSwapState::new(FIELDS, space(), PAGE_SIZE),
        fail_at: Position::new(4),
        attempts: AtomicUsize::new(0),
    });
    let area = area_with(tier.clone(), SimplePageTable::new(space()));
    area.resize(&cred(), region(0, 12)).unwrap();

    let result = area.free();
    assert!(matches!(
        result,
        Err(MemoryError::Free { position, .. }) if position == Position::new(4)
    ));
    assert_eq!(tier.attempts.load(Ordering::SeqCst), 3);
    assert!(area.region().is_empty());
}

/// Freeing an empty area succeeds
#[test]
fn test_free_empty() {
    init();
    let area = area(0);
    area.free().unwrap();
}

// =============================================================================
// PAGE TABLE CORRUPTION
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Corruption {
    /// Single positions resolve to no page.
    Missing,
    /// Single positions resolve to every page.
    Doubled,
}

/// Page table that answers single-position lookups wrongly
struct CorruptPageTable {
    inner: SimplePageTable,
    corruption: Corruption,
}

impl PageTable for CorruptPageTable {
    fn space(&self) -> Space {
        self.inner.space()
    }

    fn region(&self) -> Region {
        self.inner.region()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn pages(&self, region: &Region) -> Result<Vec<&Page>, PageTableError> {
        match (region.len(), self.corruption) {
            (1, Corruption::Missing) => Ok(Vec::new()),
            (1, Corruption::Doubled) => self.inner.pages(&self.inner.region()),
            _ => self.inner.pages(region),
        }
    }

    fn pages_mut(&mut self, region: &Region) -> Result<Vec<&mut Page>, PageTableError> {
        match (region.len(), self.corruption) {
            (1, Corruption::Missing) => Ok(Vec::new()),
            (1, Corruption::Doubled) => {
                let all = self.inner.region();
                self.inner.pages_mut(&all)
            }
            _ => self.inner.pages_mut(region),
        }
    }

    fn page(&self, position: Position) -> Result<&Page, PageTableError> {
        self.inner.page(position)
    }

    fn page_mut(&mut self, position: Position) -> Result<&mut Page, PageTableError> {
        self.inner.page_mut(position)
    }

    fn put(&mut self, pages: Vec<Page>) -> Result<Vec<Page>, PageTableError> {
        self.inner.put(pages)
    }

    fn remove(&mut self, pages: &[PageDescriptor]) -> Result<Vec<Page>, PageTableError> {
        self.inner.remove(pages)
    }

    fn take_all(&mut self) -> Result<Vec<Page>, PageTableError> {
        self.inner.take_all()
    }

    fn descriptors(&self) -> Vec<PageDescriptor> {
        self.inner.descriptors()
    }
}

fn corrupt_area(corruption: Corruption) -> PagedArea<CorruptPageTable> {
    let area = area_with(
        Arc::new(FieldSwapState::new(FIELDS, space(), PAGE_SIZE)),
        CorruptPageTable {
            inner: SimplePageTable::new(space()),
            corruption,
        },
    );
    area.resize(&cred(), region(0, 8)).unwrap();
    area
}

/// A position that resolves to no page is reported as corruption
#[test]
fn test_field_resolves_to_no_page() {
    init();
    let area = corrupt_area(Corruption::Missing);
    assert!(matches!(
        area.read_field(&cred(), Position::new(2)),
        Err(MemoryError::Corrupt { .. })
    ));
    assert!(matches!(
        area.write_field(&cred(), Position::new(2), Field::Int(2)),
        Err(MemoryError::Corrupt { .. })
    ));
}

/// A position that resolves to two pages is reported as corruption
#[test]
fn test_field_resolves_to_two_pages() {
    init();
    let area = corrupt_area(Corruption::Doubled);
    let result = area.read_field(&cred(), Position::new(5));
    assert!(matches!(
        result,
        Err(MemoryError::Corrupt { position, ref detail, .. })
            if position == Position::new(5) && detail.contains("2 pages")
    ));
    assert!(matches!(
        area.write_field(&cred(), Position::new(5), Field::Int(5)),
        Err(MemoryError::Corrupt { .. })
    ));
}

// =============================================================================
// CREDENTIALS
// =============================================================================

/// Anonymous credentials are an argument error, not a permission error
#[test]
fn test_anonymous_credentials() {
    init();
    let area = area(8);
    let anonymous = Credentials::anonymous();
    assert!(matches!(
        area.read_field(&anonymous, Position::ORIGIN),
        Err(MemoryError::InvalidArgument { reason: "null credentials", .. })
    ));
    assert!(matches!(
        area.resize(&anonymous, region(0, 4)),
        Err(MemoryError::InvalidArgument { .. })
    ));
}

/// Each operation needs its own permission
#[test]
fn test_missing_permissions() {
    init();
    let area = area(8);
    let reader = Credentials::new("reader", Permissions::READ);

    area.read_field(&reader, Position::ORIGIN).unwrap();
    assert!(matches!(
        area.write_field(&reader, Position::ORIGIN, Field::Int(0)),
        Err(MemoryError::PermissionDenied { required, .. }) if required == Permissions::WRITE
    ));
    assert!(matches!(
        area.resize(&reader, region(0, 16)),
        Err(MemoryError::PermissionDenied { required, .. }) if required == Permissions::RESIZE
    ));

    let mut fault = PageFault::new(Position::ORIGIN, FIELDS);
    assert!(area.page_fault(&reader, &mut fault).is_err());
    assert!(fault.is_error());
    assert_eq!(area.region(), region(0, 8));
}

// =============================================================================
// DIRTY TRACKING
// =============================================================================

/// Writes dirty their pages; clean_all resets them
#[test]
fn test_dirty_and_clean_regions() {
    init();
    let area = area(12);
    let whole = region(0, 12);
    assert!(area.dirty_region(&whole, &[FIELDS]).unwrap().is_empty());

    area.write_field(&cred(), Position::new(5), Field::Bool(true))
        .unwrap();
    assert_eq!(area.dirty_region(&whole, &[FIELDS]).unwrap(), region(4, 4));
    assert_eq!(area.clean_region(&region(0, 4), &[FIELDS]).unwrap(), region(0, 4));

    area.clean_all(&whole, &[FIELDS]).unwrap();
    assert!(area.dirty_region(&whole, &[FIELDS]).unwrap().is_empty());

    area.dirty_all(&region(8, 4), &[FIELDS]).unwrap();
    assert_eq!(area.dirty_region(&whole, &[FIELDS]).unwrap(), region(8, 4));

    assert!(matches!(
        area.dirty_region(&whole, &[]),
        Err(MemoryError::InvalidArgument { .. })
    ));
}

/// Reading through a stream sees the same fields as read_field
#[test]
fn test_stream_over_area() {
    init();
    let area = area(10);
    let mut stream = FieldStream::new(&area, cred());
    assert_eq!(stream.len(), 12);
    assert_eq!(stream.write(&ints(0..12)).unwrap(), 12);

    stream.seek(SeekFrom::End(-3)).unwrap();
    let mut out = vec![Field::Null; 8];
    assert_eq!(stream.read(&mut out).unwrap(), 3);
    assert_eq!(&out[..3], &ints(9..12)[..]);
    assert_eq!(area.read_field(&cred(), Position::new(10)).unwrap(), Field::Int(10));
}
