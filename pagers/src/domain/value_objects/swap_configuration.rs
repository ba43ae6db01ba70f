//! Per-tier configuration payloads.

use super::TierId;
use core::any::Any;
use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

/// Opaque configuration for one tier.
///
/// The paged area never looks inside; it forwards the payload unchanged to
/// the tier's `create_page`, which downcasts it to whatever it expects.
#[derive(Clone)]
pub struct TierConfig(Arc<dyn Any + Send + Sync>);

impl TierConfig {
    /// Wrap a configuration value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the payload as `T`, if that is what it holds.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for TierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TierConfig").finish_non_exhaustive()
    }
}

/// Configuration for every tier of a paged area.
#[derive(Clone, Default)]
pub struct SwapConfiguration {
    entries: HashMap<TierId, TierConfig>,
}

impl SwapConfiguration {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set).
    pub fn with<T: Any + Send + Sync>(mut self, tier: TierId, value: T) -> Self {
        self.set(tier, value);
        self
    }

    /// Set the payload for `tier`, replacing any previous one.
    pub fn set<T: Any + Send + Sync>(&mut self, tier: TierId, value: T) {
        self.entries.insert(tier, TierConfig::new(value));
    }

    /// Payload for `tier`, if configured.
    pub fn for_swap_state(&self, tier: TierId) -> Option<&TierConfig> {
        self.entries.get(&tier)
    }

    /// Tiers that have a payload.
    pub fn tiers(&self) -> impl Iterator<Item = TierId> + '_ {
        self.entries.keys().copied()
    }
}

impl fmt::Debug for SwapConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tiers: Vec<_> = self.tiers().collect();
        tiers.sort();
        f.debug_struct("SwapConfiguration")
            .field("tiers", &tiers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORE: TierId = TierId::new("store");

    #[test]
    fn test_lookup_and_downcast() {
        let config = SwapConfiguration::new().with(STORE, 42u32);
        let entry = config.for_swap_state(STORE).unwrap();
        assert_eq!(entry.downcast_ref::<u32>(), Some(&42));
        assert!(entry.downcast_ref::<String>().is_none());
        assert!(config.for_swap_state(TierId::new("fields")).is_none());
    }

    #[test]
    fn test_set_replaces() {
        let mut config = SwapConfiguration::new().with(STORE, 1u32);
        config.set(STORE, 2u32);
        assert_eq!(config.for_swap_state(STORE).unwrap().downcast_ref::<u32>(), Some(&2));
    }
}
