//! Tunables of the navigation controller.
//!
//! Every field defaults to the values the viewer ships with, so
//! `NavConfig::default()` is the production behavior. With the `config`
//! feature the struct loads from TOML or JSON:
//!
//! ```toml
//! cooldown_ms = 1000
//! settle_delay_ms = 100
//! tie_break = "last_delivered"
//!
//! [band]
//! top_inset_px = 100.0
//! bottom_inset_fraction = 0.6
//! ```

use core::time::Duration;

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::band::ActiveBand;
use crate::event::ScrollBehavior;

/// Default suppression window after a programmatic jump.
///
/// Must outlast a typical smooth-scroll animation, otherwise the observer
/// reports the items the animation passes over.
pub const DEFAULT_COOLDOWN_MS: u64 = 1_000;
/// Default delay before resolving a deep link, letting layout settle.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;

/// How simultaneous intersections in one visibility batch are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum TieBreak {
    /// Each intersecting entry is applied in delivery order; the last wins.
    /// Delivery order is defined by the host primitive and not guaranteed
    /// stable.
    #[default]
    LastDelivered,
    /// Only the intersecting entry earliest in the item list is applied.
    DocumentOrder,
}

/// Controller configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct NavConfig {
    /// Suppression window after a jump, in milliseconds.
    pub cooldown_ms: u64,
    /// Delay before a deep-link jump, in milliseconds.
    pub settle_delay_ms: u64,
    /// Active band margins handed to the host observer.
    pub band: ActiveBand,
    /// Resolution of multi-entry batches.
    pub tie_break: TieBreak,
    /// Animation requested for jumps.
    pub scroll_behavior: ScrollBehavior,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            band: ActiveBand::default(),
            tie_break: TieBreak::default(),
            scroll_behavior: ScrollBehavior::default(),
        }
    }
}

impl NavConfig {
    /// Suppression window as a duration.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Deep-link settle delay as a duration.
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Builder-style override of the cooldown.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown_ms = u64::try_from(cooldown.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Builder-style override of the tie-break policy.
    #[must_use]
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Validate all parameters.
    ///
    /// Returns a list of violations; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.cooldown_ms == 0 {
            errors.push("cooldown_ms must be greater than zero".to_owned());
        }
        errors.extend(self.band.validate());
        errors
    }

    /// Return `self` if valid, otherwise [`ConfigError::Validation`].
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Load and validate from a TOML file.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load and validate from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validated()
    }

    /// Load and validate from a JSON file.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }
}

/// Errors from loading a [`NavConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    /// One or more values out of range.
    #[error("invalid config: {}", .0.join("; "))]
    Validation(Vec<String>),
}
