//! Value objects for the domain layer.
//!
//! Value objects are immutable, validated data types: address-space
//! arithmetic, identities and configuration payloads.

mod position;
mod size;
mod region;
mod credentials;
mod identifiers;
mod swap_configuration;

pub use position::Position;
pub use size::Size;
pub use region::{AddressError, Region, Space};
pub use credentials::{Credentials, Permissions};
pub use identifiers::{PageKey, PagedAreaId, SwapSlot, TierId};
pub use swap_configuration::{SwapConfiguration, TierConfig};
