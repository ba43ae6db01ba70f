//! Demand-paged field memory with tiered swap states.
//!
//! A [`PagedArea`] presents one contiguous, resizable range of positions as a
//! random-access store of [`Field`]s. Behind it, the range is split into
//! fixed-size pages which live in one of several storage tiers: resident
//! field buffers, or a slower backing store. Touching a page that is not
//! resident faults it in before the access completes.
//!
//! # Architecture
//!
//! The crate is organized into three layers:
//!
//! ## Domain Layer (`domain`)
//! Pure paging logic with no storage dependencies:
//! - **Value Objects**: `Position`, `Size`, `Region`, `Space`, `Credentials`
//! - **Entities**: `Field`, `Buffer`, `Page`, `PageFault`
//! - **Ports**: `PageTable`, `SwapState`, `Swapper`, `KernelPaging`, `SwapStore`
//! - **Services**: `SwapSystem`, `SwapOperation`, `PagedArea`
//!
//! ## Adapter Layer (`adapters`)
//! Concrete implementations of the ports:
//! - **`SimplePageTable`**: ordered map from page start to page
//! - **`FieldSwapState`** / **`CopySwapper`**: resident tiers
//! - **`StoreSwapState`** / **`StoreSwapper`**: a tier over a `SwapStore`
//! - **`MemorySwapStore`**: in-memory slot store
//! - **`LruKernelPaging`**: dirty and recency bookkeeping
//!
//! ## Infrastructure Layer (`infrastructure`)
//! - **`FieldStream`**: a seekable cursor over a paged area
//!
//! # Quick Start
//!
//! ```ignore
//! use pagers::prelude::*;
//!
//! let space = Space::default();
//! let fields: Arc<dyn SwapState> = Arc::new(FieldSwapState::new(TierId::new("fields"), space, 4));
//! let system = Arc::new(SwapSystem::new(fields.clone(), fields.id(), Vec::new())?);
//! let area = PagedArea::new(
//!     PagedAreaId::new(1),
//!     system,
//!     SwapConfiguration::new(),
//!     Arc::new(LruKernelPaging::new()),
//!     SimplePageTable::new(space),
//! )?;
//!
//! let cred = Credentials::owner_with_all("alice");
//! area.resize(&cred, space.region_of(Position::ORIGIN, Size::new(10))?)?;
//! area.write_field(&cred, Position::new(3), Field::Int(42))?;
//! assert_eq!(area.read_field(&cred, Position::new(3))?, Field::Int(42));
//! ```
//!
//! # Features
//!
//! - `log`: Enable logging through the `log` crate (default)

#![warn(missing_docs)]

#[macro_use]
mod log_macros;

// Core layers
pub mod domain;
pub mod adapters;
pub mod infrastructure;

// Re-export commonly used types
pub use domain::{
    Buffer, Credentials, Field, KernelPaging, MemoryError, Page, PageFault, PageTable, PagedArea,
    PagedAreaId, Permissions, Position, Region, Size, Space, SwapConfiguration, SwapError,
    SwapState, SwapSystem, Swapper, TierId,
};

/// Everything needed to assemble and drive a paged area.
pub mod prelude {
    pub use crate::adapters::{
        CopySwapper, FieldSwapState, LruKernelPaging, MemorySwapStore, SimplePageTable,
        SimplePagedArea, StoreConfig, StoreSwapState, StoreSwapper,
    };
    pub use crate::domain::*;
    pub use crate::infrastructure::{FieldStream, SeekFrom, StreamError};
    pub use std::sync::Arc;
}
