#![no_main]

use libfuzzer_sys::fuzz_target;
use scrollspy_core::element::{element_dom_id, parse_element_dom_id};
use scrollspy_core::{Item, ItemId, NavItem, resolve_fragment, slugify, strip_hash};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let slug = slugify(text);
    assert_eq!(slugify(&slug), slug, "slug not idempotent");
    assert!(
        slug.bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'),
        "slug outside [a-z0-9-]: {slug:?}"
    );
    assert!(!slug.starts_with('-') && !slug.ends_with('-'));
    assert!(!slug.contains("--"));

    // An item's own fragment always resolves back to it.
    let items = [Item::new("x", text), Item::new("y", "fallback")];
    if let Some(fragment) = strip_hash(&items[0].fragment()).map(str::to_owned) {
        let found = resolve_fragment(&items, &fragment).map(|item| item.id.as_str());
        assert_eq!(found, Some("x"));
    }

    if !text.is_empty() {
        let id = ItemId::from(text);
        let dom_id = element_dom_id("section", &id);
        assert_eq!(parse_element_dom_id(&dom_id), Some(id));
    }
});
