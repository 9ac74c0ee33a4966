//! Image-only cell collapsing
//!
//! A `<td>` whose content, after trimming whitespace, is exactly one `<img>`
//! gets its padding and font metrics zeroed so no gap appears under the image
//! in Outlook and Gmail. Cells holding text, several images or anything else
//! keep their markup byte-identical.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

use crate::scanner::{find_closing, scan_tags, TagKind};
use crate::style::{MergeMode, StyleBlock};
use crate::text::{splice, Edit};

/// Style given to image-only cells
pub const IMAGE_CELL_CSS: &str = "padding:0; font-size:0; line-height:0;";

/// Whole-string match of a single `<img>` tag
fn single_image_regex() -> Option<&'static Regex> {
    static SINGLE_IMAGE: OnceLock<Option<Regex>> = OnceLock::new();
    SINGLE_IMAGE
        .get_or_init(|| {
            Regex::new(r#"(?is)\A<img(?:\s(?:[^>"']|"[^"]*"|'[^']*')*|/)?>\z"#).ok()
        })
        .as_ref()
}

/// Whether trimmed cell content is exactly one image
pub fn is_image_only(content: &str) -> bool {
    single_image_regex().is_some_and(|re| re.is_match(content.trim()))
}

/// Zero padding/font metrics on every image-only `<td>`
pub fn collapse_image_only_cells(html: &str) -> Cow<'_, str> {
    let tags = scan_tags(html);
    let injected = StyleBlock::parse(IMAGE_CELL_CSS);

    let edits: Vec<Edit> = tags
        .iter()
        .enumerate()
        .filter(|(_, tag)| tag.name == "td" && tag.kind == TagKind::Open)
        .filter_map(|(i, tag)| {
            let close = find_closing(&tags, i)?;
            let content = &html[tag.span.end..tags[close].span.start];
            if !is_image_only(content) {
                return None;
            }

            let attributes = tag.attributes();
            let style = attributes.style().merged_with(&injected, MergeMode::Override);
            let mut updated = attributes.clone();
            updated.set_style(&style);
            (updated != attributes).then(|| Edit::replace(tag.span.clone(), tag.render(&updated)))
        })
        .collect();

    splice(html, edits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_image_detection() {
        assert!(is_image_only(r#"<img src="a.png">"#));
        assert!(is_image_only("\n   <IMG src='a.png' alt=\"x > y\" />  \n"));
        assert!(!is_image_only(r#"<img src="a.png"><img src="b.png">"#));
        assert!(!is_image_only(r#"<img src="a.png"> Shop now"#));
        assert!(!is_image_only(r#"<a href="x"><img src="a.png"></a>"#));
        assert!(!is_image_only(""));
        assert!(!is_image_only("<imgx>"));
    }

    #[test]
    fn test_image_only_cell_collapsed() {
        let out = collapse_image_only_cells(r#"<tr><td> <img src="a.png"> </td></tr>"#);
        assert_eq!(
            out,
            r#"<tr><td style="padding:0; font-size:0; line-height:0;"> <img src="a.png"> </td></tr>"#
        );
    }

    #[test]
    fn test_existing_style_preserved() {
        let out = collapse_image_only_cells(r#"<td style="background:#fff; padding:10px" align="center"><img src="a.png"></td>"#);
        assert!(out.starts_with(
            r#"<td style="padding:0; font-size:0; line-height:0; background:#fff;" align="center">"#
        ));
    }

    #[test]
    fn test_mixed_cells_untouched() {
        let html = concat!(
            r#"<td><img src="a.png"> Text</td>"#,
            r#"<td><img src="a.png"><img src="b.png"></td>"#,
            r#"<td>Only text</td>"#,
            r#"<td></td>"#,
        );
        assert_eq!(collapse_image_only_cells(html), html);
    }

    #[test]
    fn test_outer_cell_with_nested_table_untouched() {
        let html = r#"<td><table><tr><td><img src="a.png"></td></tr></table></td>"#;
        let out = collapse_image_only_cells(html);
        assert_eq!(
            out,
            r#"<td><table><tr><td style="padding:0; font-size:0; line-height:0;"><img src="a.png"></td></tr></table></td>"#
        );
    }

    #[test]
    fn test_unclosed_cell_untouched() {
        let html = r#"<tr><td><img src="a.png"></tr>"#;
        assert_eq!(collapse_image_only_cells(html), html);
    }

    #[test]
    fn test_idempotent() {
        let once = collapse_image_only_cells(r#"<td><img src="a.png"></td>"#).into_owned();
        assert_eq!(collapse_image_only_cells(&once), once);
    }
}
