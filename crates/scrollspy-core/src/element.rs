//! DOM ids of item root elements.
//!
//! Each item's root element carries the id `<prefix>-<item id>`, e.g.
//! `section-64f0c2…`. Hosts that only hand back the DOM element of an
//! intersection entry recover the item id from it.

use crate::item::ItemId;

/// Prefix used by section views.
pub const SECTION_PREFIX: &str = "section";
/// Prefix used by fundraiser views.
pub const FUNDRAISER_PREFIX: &str = "fundraiser";

/// Build the DOM id for an item's root element.
#[must_use]
pub fn element_dom_id(prefix: &str, id: &ItemId) -> String {
    format!("{prefix}-{id}")
}

/// Recover the item id from a DOM id built by [`element_dom_id`].
///
/// Everything after the first `-` is the item id, so ids may themselves
/// contain dashes. Returns `None` when there is no prefix or no id.
#[must_use]
pub fn parse_element_dom_id(dom_id: &str) -> Option<ItemId> {
    let (prefix, id) = dom_id.split_once('-')?;
    if prefix.is_empty() || id.is_empty() {
        return None;
    }
    Some(ItemId::from(id))
}
