//! Duplicate removal across paginated search results.
//!
//! The same place regularly appears on adjacent pages under slightly
//! different highlight markup, so identity is the tag-stripped title plus
//! the literal address, joined with `|`. The returned items are the
//! original raw objects; normalization happens afterwards.

use std::collections::HashSet;

use crate::normalize::strip_html_tags;
use crate::types::RawSearchItem;

/// Removes duplicates by `name|address` key, preserving first-seen order.
#[must_use]
pub fn dedup_by_name_address(items: Vec<RawSearchItem>) -> Vec<RawSearchItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let key = format!("{}|{}", strip_html_tags(&item.title), item.address);
            seen.insert(key)
        })
        .collect()
}
