//! Colspan cleanup
//!
//! `colspan="1"`, `colspan=""` and a bare `colspan` mean nothing but still
//! trip up some clients' table layout. They are removed from `<td>`/`<th>`;
//! real spans (2 and up) are kept verbatim.

use std::borrow::Cow;

use crate::scanner::{scan_tags, TagKind};
use crate::text::{splice, Edit};

fn is_meaningless(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == "1"
}

/// Remove meaningless colspans from cells
pub fn clean_colspans(html: &str) -> Cow<'_, str> {
    let edits: Vec<Edit> = scan_tags(html)
        .iter()
        .filter(|tag| tag.kind != TagKind::Close && (tag.name == "td" || tag.name == "th"))
        .filter_map(|tag| {
            let mut attributes = tag.attributes();
            if !attributes.get("colspan").is_some_and(is_meaningless) {
                return None;
            }
            attributes.remove("colspan");
            Some(Edit::replace(tag.span.clone(), tag.render(&attributes)))
        })
        .collect();

    splice(html, edits)
}
