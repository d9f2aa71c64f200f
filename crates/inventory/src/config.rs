//! Availability configuration.

use serde::{Deserialize, Serialize};

/// Environment variable toggling reservation accounting process-wide.
pub const RESERVATIONS_ENABLED_ENV: &str = "STOCKWISE_RESERVATIONS_ENABLED";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityConfig {
    /// Global switch for reservation accounting. A call only subtracts reservations
    /// when it asks to *and* this is enabled.
    pub reservations_enabled: bool,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            reservations_enabled: true,
        }
    }
}

impl AvailabilityConfig {
    /// Load from process environment; missing or unparsable values keep defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (env, config file, test fixture).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let reservations_enabled = lookup(RESERVATIONS_ENABLED_ENV)
            .and_then(|v| v.trim().parse::<bool>().ok())
            .unwrap_or(defaults.reservations_enabled);

        Self {
            reservations_enabled,
        }
    }

    pub(crate) fn should_check_reservations(&self, requested: bool) -> bool {
        requested && self.reservations_enabled
    }
}
