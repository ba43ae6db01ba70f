//! Domain layer - paging logic with no storage dependencies.
//!
//! The domain layer contains:
//! - **Value Objects**: address-space arithmetic (`Position`, `Size`,
//!   `Region`, `Space`), identities and configuration payloads
//! - **Entities**: `Field`, `Buffer`, `Page`, `PageFault`
//! - **Ports**: `PageTable`, `SwapState`, `Swapper`, `KernelPaging`,
//!   `SwapStore`
//! - **Domain Services**: `SwapSystem`, `SwapOperation`, `PagedArea`
//! - **Domain Errors**: one enum per layer, wrapped by `MemoryError`
//!
//! # Data flow
//!
//! ```text
//!   caller ── read / write / page_fault ──▶ PagedArea
//!                                              │ lock
//!                                              ▼
//!                                          PageTable ── non-resident page ──▶ SwapSystem
//!                                              ▲                                  │
//!                                              │ install target pages             ▼
//!                                              └──────────────────────────── SwapOperation
//!                                                                                 │
//!                                                                     SwapState / Swapper
//! ```
//!
//! `KernelPaging` is told about every residency and dirty transition.

pub mod entities;
pub mod value_objects;
pub mod ports;
pub mod error;

mod swap_operation;
mod swap_system;
mod paged_area;

// Re-export commonly used types
pub use entities::{
    Buffer, BufferError, FaultFlags, Field, Page, PageContents, PageDescriptor, PageFault,
    SwapHandle,
};
pub use value_objects::{
    AddressError, Credentials, PageKey, PagedAreaId, Permissions, Position, Region, Size, Space,
    SwapConfiguration, SwapSlot, TierConfig, TierId,
};
pub use ports::{KernelPaging, PageTable, SwapState, SwapStore, Swapper};
pub use error::{MemoryError, PageTableError, StoreError, SwapError};
pub use swap_operation::{SwapDirection, SwapOperation};
pub use swap_system::SwapSystem;
pub use paged_area::PagedArea;
