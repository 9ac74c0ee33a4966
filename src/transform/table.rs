//! Table normalization
//!
//! Every `<table>` opening tag is rewritten to the canonical email-safe form:
//!
//! ```html
//! <table role="presentation" align="center" width="600" border="0"
//!        cellpadding="0" cellspacing="0"
//!        style="mso-table-lspace:0pt; mso-table-rspace:0pt; border-collapse:collapse;">
//! ```
//!
//! With `responsive` set the width becomes `100%` and `max-width:<W>px` joins
//! the injected block. Author attributes (`id`, `class`, `lang`, `dir`,
//! `data-*`, `aria-*`, an existing `role`, ...) follow the forced ones in their
//! original order; `height` is dropped. The rewrite is a fixed point: running
//! it on its own output changes nothing.

use std::borrow::Cow;

use crate::options::FormatOptions;
use crate::scanner::{render_tag, Attributes};
use crate::style::{MergeMode, StyleBlock};
use crate::transform::rewrite_start_tags;

/// Outlook table-spacing reset injected ahead of author styles
pub const OUTLOOK_TABLE_CSS: &str =
    "mso-table-lspace:0pt; mso-table-rspace:0pt; border-collapse:collapse;";

/// Attributes whose values the normalizer owns
const FORCED_ATTRIBUTES: &[&str] = &[
    "role",
    "align",
    "width",
    "border",
    "cellpadding",
    "cellspacing",
    "height",
    "style",
];

/// Remove `height` from every `<table>` opening tag
pub fn strip_table_heights(html: &str) -> Cow<'_, str> {
    rewrite_start_tags(html, "table", |_, attributes| {
        let mut updated = attributes.clone();
        updated.remove("height").then_some(updated)
    })
}

/// Rewrite every `<table>` opening tag to the canonical form
pub fn normalize_tables<'a>(html: &'a str, options: &FormatOptions) -> Cow<'a, str> {
    rewrite_start_tags(html, "table", |_, attributes| {
        Some(normalize_table_attributes(attributes, options))
    })
}

/// Canonical attribute list for a table with the given author attributes
pub fn normalize_table_attributes(attributes: &Attributes, options: &FormatOptions) -> Attributes {
    let pixels = options.target_width.pixels();
    let mut normalized = Attributes::default();

    let role = attributes
        .get("role")
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("presentation");
    normalized.set("role", role);
    normalized.set("align", "center");
    if options.responsive {
        normalized.set("width", "100%");
    } else {
        normalized.set("width", pixels.to_string());
    }
    normalized.set("border", "0");
    normalized.set("cellpadding", "0");
    normalized.set("cellspacing", "0");

    for attribute in attributes.iter() {
        let name = attribute.name.to_ascii_lowercase();
        if !FORCED_ATTRIBUTES.contains(&name.as_str()) {
            normalized.push(attribute.clone());
        }
    }

    let mut author = attributes.style();
    let mut injected = String::from(OUTLOOK_TABLE_CSS);
    if options.responsive {
        injected.push_str(&format!(" max-width:{pixels}px;"));
    } else {
        author.remove("max-width");
    }
    let style = author.merged_with(&StyleBlock::parse(&injected), MergeMode::Override);
    normalized.set_style(&style);

    normalized
}

/// A fresh canonical `<table>` opening tag
pub fn presentation_table_tag(options: &FormatOptions) -> String {
    let attributes = normalize_table_attributes(&Attributes::default(), options);
    render_tag("table", &attributes, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TargetWidth;
    use crate::scanner::scan_tags;
    use proptest::prelude::*;

    fn fixed_650() -> FormatOptions {
        FormatOptions::default().with_target_width(TargetWidth::W650)
    }

    #[test]
    fn test_strip_heights() {
        let html = r#"<table height="20" id="a"><tr><td height="10"></td></tr></table>"#;
        assert_eq!(
            strip_table_heights(html),
            r#"<table id="a"><tr><td height="10"></td></tr></table>"#
        );
    }

    #[test]
    fn test_strip_heights_untouched_borrows() {
        let html = "<table><tr><td></td></tr></table>";
        assert!(matches!(strip_table_heights(html), Cow::Borrowed(_)));
    }

    #[test]
    fn test_fixed_width_table() {
        let out = normalize_tables(r#"<table width="500" border="1" class="main">"#, &fixed_650());
        assert_eq!(
            out,
            r#"<table role="presentation" align="center" width="650" border="0" cellpadding="0" cellspacing="0" class="main" style="mso-table-lspace:0pt; mso-table-rspace:0pt; border-collapse:collapse;">"#
        );
    }

    #[test]
    fn test_responsive_table() {
        let options = FormatOptions::default().responsive(true);
        let out = normalize_tables(r#"<table style="max-width:300px; color:red">"#, &options);
        assert!(out.contains(r#"width="100%""#));
        assert!(out.contains(
            "style=\"mso-table-lspace:0pt; mso-table-rspace:0pt; border-collapse:collapse; max-width:600px; color:red;\""
        ));
    }

    #[test]
    fn test_fixed_width_drops_author_max_width() {
        let out = normalize_tables(r#"<table style="max-width:300px">"#, &fixed_650());
        assert!(!out.contains("max-width"));
    }

    #[test]
    fn test_preserves_author_attributes_and_role() {
        let html = r#"<table id="hero" lang="en" dir="ltr" data-slice="3" aria-label="Hero" role="none" height="40">"#;
        let out = normalize_tables(html, &fixed_650());
        let tags = scan_tags(&out);
        let attrs = tags[0].attributes();
        assert_eq!(attrs.get("role"), Some("none"));
        assert_eq!(attrs.get("id"), Some("hero"));
        assert_eq!(attrs.get("lang"), Some("en"));
        assert_eq!(attrs.get("dir"), Some("ltr"));
        assert_eq!(attrs.get("data-slice"), Some("3"));
        assert_eq!(attrs.get("aria-label"), Some("Hero"));
        assert_eq!(attrs.get("height"), None);
    }

    #[test]
    fn test_tables_in_conditional_comments_untouched() {
        let html = r#"<!--[if mso]><table width="600"><tr><td><![endif]--><table>"#;
        let out = normalize_tables(html, &fixed_650());
        assert!(out.starts_with(r#"<!--[if mso]><table width="600"><tr><td><![endif]-->"#));
        assert_eq!(out.matches("role=\"presentation\"").count(), 1);
    }

    #[test]
    fn test_presentation_table_tag() {
        let tag = presentation_table_tag(&FormatOptions::default());
        assert!(tag.starts_with(r#"<table role="presentation" align="center" width="600""#));
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(
            width in prop::sample::select(vec!["", " width=\"500\"", " width=100%"]),
            style in prop::sample::select(vec!["", " style=\"\"", " style=\"color:red; border-collapse:separate\"", " style='max-width:700px'"]),
            extra in prop::sample::select(vec!["", " id=\"x\"", " class=\"a b\" data-k=\"v\"", " role=\"grid\" height=\"5\""]),
            responsive in any::<bool>(),
            wide in any::<bool>(),
        ) {
            let options = FormatOptions::default()
                .responsive(responsive)
                .with_target_width(if wide { TargetWidth::W650 } else { TargetWidth::W600 });
            let html = format!("<table{width}{style}{extra}><tr><td>x</td></tr></table>");

            let once = normalize_tables(&html, &options).into_owned();
            let twice = normalize_tables(&once, &options).into_owned();
            prop_assert_eq!(&once, &twice);
        }
    }
}
