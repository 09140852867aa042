//! Navigable items and their identifiers.

use std::borrow::{Borrow, Cow};
use std::fmt;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::fragment::slugify;

/// Stable identifier of a navigable item.
///
/// Identity is immutable for the lifetime of a loaded list; the controller
/// compares identifiers, never positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize), serde(transparent))]
pub struct ItemId(String);

impl ItemId {
    /// Create an identifier from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identifier, returning the owned text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Anything the navigation controller can point at.
///
/// Implementors supply identity and a human-readable label. The fragment
/// defaults to the slug of the label; override [`NavItem::fragment`] when an
/// item has a distinct bookmark form.
pub trait NavItem {
    /// Stable unique identifier.
    fn id(&self) -> &ItemId;

    /// Label shown in nav lists and tabs.
    fn label(&self) -> Cow<'_, str>;

    /// URL fragment (without `#`) that addresses this item.
    fn fragment(&self) -> String {
        slugify(&self.label())
    }

    /// Prefix of the DOM id the item's root element carries (`<prefix>-<id>`).
    fn dom_prefix(&self) -> &'static str {
        "item"
    }
}

/// Plain navigable item for callers that do not have a richer model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub label: String,
    /// Explicit fragment; `None` falls back to the label slug.
    pub fragment: Option<String>,
}

impl Item {
    /// Item whose fragment is derived from its label.
    #[must_use]
    pub fn new(id: impl Into<ItemId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            fragment: None,
        }
    }

    /// Override the fragment.
    #[must_use]
    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }
}

impl NavItem for Item {
    fn id(&self) -> &ItemId {
        &self.id
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.label)
    }

    fn fragment(&self) -> String {
        match &self.fragment {
            Some(fragment) => fragment.clone(),
            None => slugify(&self.label),
        }
    }
}

/// Index of the item with `id`, if loaded.
#[must_use]
pub fn position_of<I: NavItem>(items: &[I], id: &ItemId) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}
