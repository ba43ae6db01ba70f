//! Domain entities: fields, buffers, pages and page faults.

mod field;
mod buffer;
mod page;
mod page_fault;

pub use field::Field;
pub use buffer::{Buffer, BufferError};
pub use page::{Page, PageContents, PageDescriptor, SwapHandle};
pub use page_fault::{FaultFlags, PageFault};
