//! Host-delivered observation events and scroll behavior.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::item::ItemId;

/// One entry of a visibility batch.
///
/// Mirrors an `IntersectionObserverEntry` reduced to what the controller
/// needs: which item, and whether it entered (`true`) or left the band.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct IntersectionEntry {
    pub id: ItemId,
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    /// Entry reporting that `id` entered the active band.
    #[must_use]
    pub fn entered(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            is_intersecting: true,
        }
    }

    /// Entry reporting that `id` left the active band.
    #[must_use]
    pub fn left(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            is_intersecting: false,
        }
    }
}

/// How the host should animate a scroll-into-view request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum ScrollBehavior {
    /// Animated scroll (`behavior: "smooth"`).
    #[default]
    Smooth,
    /// Jump without animation.
    Instant,
}

impl ScrollBehavior {
    /// Value of the DOM `ScrollIntoViewOptions.behavior` field.
    #[must_use]
    pub const fn as_dom_str(self) -> &'static str {
        match self {
            Self::Smooth => "smooth",
            Self::Instant => "instant",
        }
    }
}
