//! Caller identity and the permissions it carries.

use bitflags::bitflags;
use core::fmt;

bitflags! {
    /// Operations a caller may perform on a paged area.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u8 {
        /// Read fields.
        const READ = 0x01;
        /// Write fields.
        const WRITE = 0x02;
        /// Move pages between tiers.
        const SWAP = 0x04;
        /// Grow or shrink the area.
        const RESIZE = 0x08;
        /// Every permission.
        const ALL = Self::READ.bits() | Self::WRITE.bits() | Self::SWAP.bits() | Self::RESIZE.bits();
    }
}

/// Identity token passed to every paged-area operation.
///
/// The anonymous credential stands in for "no credential" and is rejected
/// by every operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    owner: Option<String>,
    permissions: Permissions,
}

impl Credentials {
    /// Create a credential for `owner` with the given permissions.
    pub fn new(owner: impl Into<String>, permissions: Permissions) -> Self {
        Self {
            owner: Some(owner.into()),
            permissions,
        }
    }

    /// Create a credential for `owner` holding every permission.
    pub fn owner_with_all(owner: impl Into<String>) -> Self {
        Self::new(owner, Permissions::ALL)
    }

    /// The null credential.
    pub const fn anonymous() -> Self {
        Self {
            owner: None,
            permissions: Permissions::empty(),
        }
    }

    /// Check whether this is the null credential.
    pub fn is_anonymous(&self) -> bool {
        self.owner.is_none()
    }

    /// Check whether every permission in `required` is held.
    pub fn allows(&self, required: Permissions) -> bool {
        !self.is_anonymous() && self.permissions.contains(required)
    }

    /// Permissions held by this credential.
    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    /// Name of the owner, `<anonymous>` for the null credential.
    pub fn owner(&self) -> &str {
        self.owner.as_deref().unwrap_or("<anonymous>")
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.owner())
    }
}
