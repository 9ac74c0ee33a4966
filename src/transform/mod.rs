//! Structural transformers
//!
//! Each transformer is a pure function from HTML text to HTML text. Tags are
//! located with the shared [`scanner`](crate::scanner); writes go through
//! [`splice`](crate::text::splice), and a tag is only re-serialized when its
//! attribute list actually changes, so untouched markup stays byte-identical.

pub mod alt_text;
pub mod background;
pub mod cells;
pub mod colspan;
pub mod columns;
pub mod document;
pub mod hidden_text;
pub mod images;
pub mod links;
pub mod table;
pub mod whitespace;

use std::borrow::Cow;

use crate::scanner::{scan_tags, Attributes, Tag};
use crate::text::{splice, Edit};

/// Rewrite every start tag named `name`
///
/// `rewrite` receives the tag and its parsed attributes and returns the new
/// attribute list, or `None` to leave the tag alone. Returning an equal list
/// is also a no-op.
pub(crate) fn rewrite_start_tags<'a, F>(html: &'a str, name: &str, mut rewrite: F) -> Cow<'a, str>
where
    F: FnMut(&Tag<'_>, &Attributes) -> Option<Attributes>,
{
    let edits: Vec<Edit> = scan_tags(html)
        .iter()
        .filter(|tag| tag.is_start(name))
        .filter_map(|tag| {
            let attributes = tag.attributes();
            let updated = rewrite(tag, &attributes)?;
            (updated != attributes).then(|| Edit::replace(tag.span.clone(), tag.render(&updated)))
        })
        .collect();

    splice(html, edits)
}
