//! Content models of the archive viewer.
//!
//! Field names follow the REST payloads (`_id`, `amountRaised`) so the
//! lists can be deserialized straight from the API with the `config`
//! feature enabled.

use std::borrow::Cow;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::element::{FUNDRAISER_PREFIX, SECTION_PREFIX};
use crate::item::{ItemId, NavItem};

/// Photo attached to a section or fundraiser.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct Photo {
    pub url: String,
    #[cfg_attr(feature = "config", serde(default, skip_serializing_if = "Option::is_none"))]
    pub tag: Option<String>,
}

/// Ordered content section of the home page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct Section {
    #[cfg_attr(feature = "config", serde(rename = "_id"))]
    pub id: ItemId,
    pub title: String,
    /// Sanitized rich text.
    #[cfg_attr(feature = "config", serde(default))]
    pub description: Option<String>,
    #[cfg_attr(feature = "config", serde(default))]
    pub order: i64,
    #[cfg_attr(feature = "config", serde(default))]
    pub photos: Vec<Photo>,
}

impl NavItem for Section {
    fn id(&self) -> &ItemId {
        &self.id
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.title)
    }

    fn dom_prefix(&self) -> &'static str {
        SECTION_PREFIX
    }
}

/// One year's fundraiser.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct Fundraiser {
    #[cfg_attr(feature = "config", serde(rename = "_id"))]
    pub id: ItemId,
    pub year: i32,
    #[cfg_attr(feature = "config", serde(default))]
    pub title: Option<String>,
    #[cfg_attr(feature = "config", serde(default))]
    pub description: Option<String>,
    #[cfg_attr(feature = "config", serde(default, rename = "amountRaised"))]
    pub amount_raised: f64,
    #[cfg_attr(feature = "config", serde(default))]
    pub photos: Vec<Photo>,
}

impl NavItem for Fundraiser {
    fn id(&self) -> &ItemId {
        &self.id
    }

    /// Fundraisers are navigated by year.
    fn label(&self) -> Cow<'_, str> {
        Cow::Owned(self.year.to_string())
    }

    fn dom_prefix(&self) -> &'static str {
        FUNDRAISER_PREFIX
    }
}

/// Sort sections for display: ascending `order`, ties keep load order.
pub fn sort_sections(sections: &mut [Section]) {
    sections.sort_by_key(|section| section.order);
}

/// Sort fundraisers for display: most recent year first.
pub fn sort_fundraisers(fundraisers: &mut [Fundraiser]) {
    fundraisers.sort_by(|a, b| b.year.cmp(&a.year));
}
