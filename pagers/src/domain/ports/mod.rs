//! Ports - the interfaces the paging domain depends on.
//!
//! Adapters in [`crate::adapters`] implement these; tests implement them
//! with doubles that fail on demand.

mod page_table;
mod swap_state;
mod kernel_paging;
mod swap_store;

pub use page_table::PageTable;
pub use swap_state::{SwapState, Swapper};
pub use kernel_paging::KernelPaging;
pub use swap_store::SwapStore;
