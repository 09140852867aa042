#![forbid(unsafe_code)]

//! Scroll geometry simulator.
//!
//! [`ViewportSim`] stacks item roots vertically, tracks a scroll offset and
//! reports what an `IntersectionObserver` configured with the same
//! [`ActiveBand`] would deliver: one entry per element whose intersection
//! state changed, in document order. [`ViewportSim::animate_to`] yields the
//! batches of every intermediate frame of a smooth scroll, which is exactly
//! the stream a jump's cooldown has to absorb.

use std::collections::BTreeSet;

use scrollspy_core::{ActiveBand, IntersectionEntry, ItemId};

/// One laid-out item root, in document coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SimElement {
    pub id: ItemId,
    pub top: f64,
    pub height: f64,
}

/// Deterministic viewport over a vertical stack of elements.
#[derive(Debug, Clone)]
pub struct ViewportSim {
    band: ActiveBand,
    viewport_height: f64,
    scroll_y: f64,
    elements: Vec<SimElement>,
    intersecting: BTreeSet<ItemId>,
}

impl ViewportSim {
    /// Empty page scrolled to the top.
    #[must_use]
    pub fn new(band: ActiveBand, viewport_height: f64) -> Self {
        Self {
            band,
            viewport_height: viewport_height.max(0.0),
            scroll_y: 0.0,
            elements: Vec::new(),
            intersecting: BTreeSet::new(),
        }
    }

    /// Append an element below the last one. Returns its top.
    pub fn push(&mut self, id: impl Into<ItemId>, height: f64) -> f64 {
        let top = self.content_height();
        self.elements.push(SimElement {
            id: id.into(),
            top,
            height: height.max(0.0),
        });
        top
    }

    #[must_use]
    pub fn elements(&self) -> &[SimElement] {
        &self.elements
    }

    #[must_use]
    pub fn content_height(&self) -> f64 {
        self.elements
            .last()
            .map_or(0.0, |last| last.top + last.height)
    }

    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        (self.content_height() - self.viewport_height).max(0.0)
    }

    #[must_use]
    pub const fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    /// Ids currently inside the band, sorted.
    pub fn intersecting_ids(&self) -> impl Iterator<Item = &ItemId> + '_ {
        self.intersecting.iter()
    }

    /// Scroll offset that `scrollIntoView` would settle on for `id`.
    #[must_use]
    pub fn scroll_target(&self, id: &ItemId) -> Option<f64> {
        self.elements
            .iter()
            .find(|element| &element.id == id)
            .map(|element| element.top.clamp(0.0, self.max_scroll()))
    }

    /// Initial batch delivered when the observer starts watching: one entry
    /// per element, intersecting or not.
    pub fn observe_all(&mut self) -> Vec<IntersectionEntry> {
        self.intersecting.clear();
        let mut batch = Vec::with_capacity(self.elements.len());
        for element in &self.elements {
            let hit = self.hits(element);
            if hit {
                self.intersecting.insert(element.id.clone());
            }
            batch.push(IntersectionEntry {
                id: element.id.clone(),
                is_intersecting: hit,
            });
        }
        batch
    }

    /// Jump the scroll offset to `y` (clamped) and return the entries whose
    /// state changed.
    pub fn scroll_to(&mut self, y: f64) -> Vec<IntersectionEntry> {
        self.scroll_y = y.clamp(0.0, self.max_scroll());
        let mut batch = Vec::new();
        for element in &self.elements {
            let hit = self.hits(element);
            let was = self.intersecting.contains(&element.id);
            if hit == was {
                continue;
            }
            if hit {
                self.intersecting.insert(element.id.clone());
            } else {
                self.intersecting.remove(&element.id);
            }
            batch.push(IntersectionEntry {
                id: element.id.clone(),
                is_intersecting: hit,
            });
        }
        batch
    }

    /// Scroll linearly to `y` over `frames` frames, returning the non-empty
    /// batch of each frame in order.
    pub fn animate_to(&mut self, y: f64, frames: u32) -> Vec<Vec<IntersectionEntry>> {
        let frames = frames.max(1);
        let start = self.scroll_y;
        let end = y.clamp(0.0, self.max_scroll());
        (1..=frames)
            .map(|frame| {
                let t = f64::from(frame) / f64::from(frames);
                self.scroll_to(start + (end - start) * t)
            })
            .filter(|batch| !batch.is_empty())
            .collect()
    }

    fn hits(&self, element: &SimElement) -> bool {
        self.band.intersects(
            element.top - self.scroll_y,
            element.height,
            self.viewport_height,
        )
    }
}
