//! Adapter layer - concrete implementations of the domain ports.
//!
//! - [`SimplePageTable`]: `PageTable` over an ordered map
//! - [`FieldSwapState`] / [`CopySwapper`]: resident tiers
//! - [`StoreSwapState`] / [`StoreSwapper`]: a tier stored in a `SwapStore`
//! - [`MemorySwapStore`]: `SwapStore` kept in memory
//! - [`LruKernelPaging`]: `KernelPaging` with recency ordering

mod simple_page_table;
mod field_swap_state;
mod store_swap_state;
mod memory_swap_store;
mod lru_kernel_paging;

pub mod page_codec;

pub use simple_page_table::{SimplePageTable, SimplePagedArea};
pub use field_swap_state::{CopySwapper, FieldSwapState};
pub use store_swap_state::{StoreConfig, StoreSwapState, StoreSwapper};
pub use memory_swap_store::MemorySwapStore;
pub use lru_kernel_paging::LruKernelPaging;
