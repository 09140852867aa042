#![forbid(unsafe_code)]

//! View models for the navigation surfaces around the long-scroll page.
//!
//! The same active item drives three surfaces: the sticky side list on wide
//! screens, the tab strip and the slide-out drawer on narrow ones. These
//! helpers derive what each surface shows from the controller state; the
//! rendering itself belongs to the host.

use std::borrow::Cow;

use scrollspy_backend::NavBackend;
use scrollspy_core::item::position_of;
use scrollspy_core::{ItemId, NavItem};

use crate::controller::{NavController, NavOutcome};

/// One row of the side list or drawer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry<'a> {
    pub id: &'a ItemId,
    pub label: Cow<'a, str>,
    pub selected: bool,
}

/// Rows for the side list/drawer, in item order, with the active one selected.
#[must_use]
pub fn nav_entries<'a, I: NavItem>(items: &'a [I], active: Option<&ItemId>) -> Vec<NavEntry<'a>> {
    items
        .iter()
        .map(|item| NavEntry {
            id: item.id(),
            label: item.label(),
            selected: active == Some(item.id()),
        })
        .collect()
}

/// Index of the selected tab.
///
/// Falls back to the first tab when nothing (or an unknown item) is active,
/// since a tab strip always shows one tab selected.
#[must_use]
pub fn tab_index<I: NavItem>(items: &[I], active: Option<&ItemId>) -> usize {
    active
        .and_then(|active| position_of(items, active))
        .unwrap_or(0)
}

/// Item addressed by a tab index.
#[must_use]
pub fn tab_target<I: NavItem>(items: &[I], index: usize) -> Option<&ItemId> {
    items.get(index).map(NavItem::id)
}

/// Slide-out drawer holding the nav list on narrow screens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavDrawer {
    open: bool,
}

impl NavDrawer {
    #[must_use]
    pub const fn new() -> Self {
        Self { open: false }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Jump to `id` from a nav surface. The drawer closes whether or not the
    /// jump took effect.
    pub fn select<B: NavBackend, I: NavItem>(
        &mut self,
        controller: &mut NavController<B, I>,
        id: &ItemId,
    ) -> NavOutcome {
        let outcome = controller.jump_to(id);
        self.close();
        outcome
    }
}

/// Load state of the item list as reported by the data layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T, E> {
    Loading,
    Loaded(T),
    Failed(E),
}

/// What the page body should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageView<'a, I> {
    /// Spinner.
    Loading,
    /// Error banner, e.g. "Failed to load sections".
    Failed { message: String },
    /// Empty notice, e.g. "No sections yet".
    Empty { message: String },
    /// Nav surfaces plus the long-scroll list.
    Ready { title: String, items: &'a [I] },
}

impl<'a, I> PageView<'a, I> {
    /// Derive the page body for a collection called `item_name`
    /// (plural, lower-case, e.g. `"fundraisers"`).
    #[must_use]
    pub fn classify<E>(state: &'a LoadState<Vec<I>, E>, item_name: &str) -> Self {
        match state {
            LoadState::Loading => Self::Loading,
            LoadState::Failed(_) => Self::Failed {
                message: format!("Failed to load {item_name}"),
            },
            LoadState::Loaded(items) if items.is_empty() => Self::Empty {
                message: format!("No {item_name} yet"),
            },
            LoadState::Loaded(items) => Self::Ready {
                title: capitalize(item_name),
                items,
            },
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
