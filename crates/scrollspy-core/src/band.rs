//! Active-band geometry.
//!
//! The active band is the viewport collapsed by a fixed inset from the top
//! (the fixed header) and a fraction of its height from the bottom, so an
//! item has to be well into view before it counts as the one being read.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Default top inset in CSS pixels (fixed app bar).
pub const DEFAULT_TOP_INSET_PX: f64 = 100.0;
/// Default bottom inset as a fraction of viewport height.
pub const DEFAULT_BOTTOM_INSET_FRACTION: f64 = 0.6;
/// Default minimum intersection ratio.
pub const DEFAULT_THRESHOLD: f64 = 0.0;

/// Asymmetric viewport margins defining the active band.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ActiveBand {
    /// Pixels removed from the top of the viewport.
    pub top_inset_px: f64,
    /// Fraction of the viewport height removed from the bottom, in `[0, 1)`.
    pub bottom_inset_fraction: f64,
    /// Minimum visible ratio of an element, in `[0, 1]`. Zero means any overlap.
    pub threshold: f64,
}

impl Default for ActiveBand {
    fn default() -> Self {
        Self {
            top_inset_px: DEFAULT_TOP_INSET_PX,
            bottom_inset_fraction: DEFAULT_BOTTOM_INSET_FRACTION,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ActiveBand {
    /// Render the band as an `IntersectionObserver` `rootMargin` string.
    ///
    /// ```
    /// use scrollspy_core::ActiveBand;
    /// assert_eq!(ActiveBand::default().root_margin(), "-100px 0px -60% 0px");
    /// ```
    #[must_use]
    pub fn root_margin(&self) -> String {
        format!(
            "-{}px 0px -{}% 0px",
            css_number(self.top_inset_px),
            css_number(self.bottom_inset_fraction * 100.0)
        )
    }

    /// Band edges `(top, bottom)` in viewport coordinates.
    ///
    /// The band may be empty (`bottom <= top`) on very short viewports.
    #[must_use]
    pub fn edges(&self, viewport_height: f64) -> (f64, f64) {
        let top = self.top_inset_px;
        let bottom = viewport_height - viewport_height * self.bottom_inset_fraction;
        (top, bottom)
    }

    /// Whether an element spanning `[top, top + height)` in viewport
    /// coordinates counts as intersecting the band.
    #[must_use]
    pub fn intersects(&self, top: f64, height: f64, viewport_height: f64) -> bool {
        let (band_top, band_bottom) = self.edges(viewport_height);
        if band_bottom <= band_top {
            return false;
        }
        let overlap = (top + height).min(band_bottom) - top.max(band_top);
        if overlap <= 0.0 {
            return false;
        }
        if self.threshold <= 0.0 || height <= 0.0 {
            return true;
        }
        overlap / height >= self.threshold
    }

    /// Range violations, empty when valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.top_inset_px.is_finite() || self.top_inset_px < 0.0 {
            errors.push(format!(
                "band.top_inset_px must be a non-negative number, got {}",
                self.top_inset_px
            ));
        }
        if !(0.0..1.0).contains(&self.bottom_inset_fraction) {
            errors.push(format!(
                "band.bottom_inset_fraction must be in [0, 1), got {}",
                self.bottom_inset_fraction
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            errors.push(format!(
                "band.threshold must be in [0, 1], got {}",
                self.threshold
            ));
        }
        errors
    }
}

fn css_number(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
