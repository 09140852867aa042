//! Fragment codec: label → URL-safe slug, fragment → loaded item.
//!
//! There is no reverse index. Decoding recomputes every loaded item's
//! fragment and compares, which is fine for lists of tens of items.

use crate::item::NavItem;

/// Separator inserted for each run of non-alphanumeric characters.
pub const SLUG_SEPARATOR: char = '-';

/// Lower-case `label`, collapse every run of characters outside `[a-z0-9]`
/// into one separator and trim separators from both ends.
///
/// The mapping is lossy but idempotent: `slugify(&slugify(x)) == slugify(x)`.
#[must_use]
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_separator = false;
    for ch in label.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push(SLUG_SEPARATOR);
            }
            pending_separator = false;
            slug.push(ch);
        } else {
            pending_separator = true;
        }
    }
    slug
}

/// Strip the leading `#` from a raw location hash.
///
/// Returns `None` for an absent or empty fragment.
#[must_use]
pub fn strip_hash(raw: &str) -> Option<&str> {
    let fragment = raw.strip_prefix('#').unwrap_or(raw);
    (!fragment.is_empty()).then_some(fragment)
}

/// Find the loaded item whose fragment equals `fragment`.
///
/// First match in list order wins when two items share a fragment.
#[must_use]
pub fn resolve_fragment<'a, I: NavItem>(items: &'a [I], fragment: &str) -> Option<&'a I> {
    items.iter().find(|item| item.fragment() == fragment)
}
