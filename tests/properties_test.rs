//! Property tests over generated table layouts
//!
//! Layouts are assembled from fragments typical of sliced exports: bare
//! images, images with captions, explicit and duplicated alts (including
//! ones that differ only in spacing), links of every scheme, and text cells.
//! Documents wrap a layout the ways exporters do: bare, in a full document,
//! without a head, behind a leading comment, or with a stray second body.

use email_html_formatter::scanner::{find_closing, scan_tags};
use email_html_formatter::transform::cells::{IMAGE_CELL_CSS, is_image_only};
use email_html_formatter::transform::table::normalize_tables;
use email_html_formatter::{FormatOptions, TargetWidth, format};
use proptest::prelude::*;
use regex::Regex;
use std::collections::HashSet;

const UNTOUCHABLE_HREFS: &[&str] = &[
    "mailto:news@example.com",
    "MAILTO:Sales@Example.com?subject=Hi",
    "tel:+15551234567",
    "#top",
    "javascript:void(0)",
];

const WEB_HREFS: &[&str] = &[
    "https://example.com/",
    "http://example.com/sale?ref=nl",
    "https://example.com/a?utm_medium=old",
];

fn cell_fragment() -> impl Strategy<Value = String> {
    let fixed = prop::sample::select(vec![
        r#"<img src="slice_01.png">"#,
        r#"<img src="slice_02.png">"#,
        r#"<img src="hero.jpg">"#,
        r#"<img src="hero.jpg">"#,
        r#"<img src="Logo.png" alt="Logo">"#,
        r#"<img src="logo2.png" alt="logo">"#,
        r#"<img src="sale_a.png" alt="Big  Sale">"#,
        r#"<img src="sale_b.png" alt="big sale">"#,
        r#"<img src="sale_c.png" alt=" Big Sale ">"#,
        r#"<img src="8f3a9c1b2d4e.png">"#,
        r#"<img>"#,
        r#"<img src="promo.gif"> Shop the sale"#,
        "Plain text cell",
        "",
    ])
    .prop_map(str::to_string);

    let link = prop::sample::select(
        UNTOUCHABLE_HREFS
            .iter()
            .chain(WEB_HREFS)
            .copied()
            .collect::<Vec<_>>(),
    )
    .prop_map(|href| format!(r#"<a href="{href}">Link</a>"#));

    prop_oneof![3 => fixed, 1 => link]
}

fn layout() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::collection::vec(cell_fragment(), 1..4), 1..5).prop_map(|rows| {
        let mut html = String::from("<table height=\"120\" style=\"max-width:300px\">");
        for row in rows {
            html.push_str("<tr>");
            for cell in row {
                html.push_str("<td>");
                html.push_str(&cell);
                html.push_str("</td>");
            }
            html.push_str("</tr>");
        }
        html.push_str("</table>");
        html
    })
}

fn document() -> impl Strategy<Value = String> {
    (layout(), 0..6usize).prop_map(|(layout, shell)| match shell {
        0 => layout,
        1 => format!("<!DOCTYPE html>\n<html><head><title>Export</title></head><body>{layout}</body></html>"),
        2 => format!("<!doctype html><html><body>{layout}</body></html>"),
        3 => format!("<!-- exported -->\n<!DOCTYPE html><html><head></head><body>{layout}</body></html>"),
        4 => format!(
            "  <!DOCTYPE html>\n<html><head><style>td {{ color:#333; }}</style></head><body>{layout}</body><body><p>Footer</p></body></html>"
        ),
        _ => format!("<html><head></head><body>{layout}</body></html>"),
    })
}

fn options() -> impl Strategy<Value = FormatOptions> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(responsive, wide, wrap, preheader)| {
            let mut options = FormatOptions::default()
                .responsive(responsive)
                .with_target_width(if wide { TargetWidth::W650 } else { TargetWidth::W600 })
                .wrap_columns(wrap)
                .with_utm("email", "spring");
            if preheader {
                options = options.with_preheader("Fresh picks for spring");
            }
            options
        },
    )
}

fn count(html: &str, pattern: &str) -> usize {
    Regex::new(pattern).map(|re| re.find_iter(html).count()).unwrap_or(0)
}

proptest! {
    #[test]
    fn prop_table_normalizer_is_idempotent(source in layout(), options in options()) {
        let once = normalize_tables(&source, &options).into_owned();
        let twice = normalize_tables(&once, &options).into_owned();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_width_invariant(source in layout(), options in options()) {
        let html = format(&source, &options).unwrap_or_default();
        let pixels = options.target_width.pixels();

        for tag in scan_tags(&html).iter().filter(|t| t.is_start("table")) {
            let attributes = tag.attributes();
            let style = attributes.style();
            if options.responsive {
                prop_assert_eq!(attributes.get("width"), Some("100%"));
                prop_assert_eq!(style.count("max-width"), 1);
                let expected = format!("{pixels}px");
                prop_assert_eq!(style.get("max-width"), Some(expected.as_str()));
            } else {
                let expected = pixels.to_string();
                prop_assert_eq!(attributes.get("width"), Some(expected.as_str()));
                prop_assert!(!style.contains("max-width"));
            }
            prop_assert!(!attributes.contains("height"));
        }
    }

    #[test]
    fn prop_alts_are_unique_ignoring_case(source in document(), options in options()) {
        let html = format(&source, &options).unwrap_or_default();
        let alts: Vec<String> = scan_tags(&html)
            .iter()
            .filter(|t| t.is_start("img"))
            .map(|t| t.attributes().get("alt").unwrap_or("").to_lowercase())
            .collect();

        prop_assert!(alts.iter().all(|a| !a.trim().is_empty()));
        let distinct: HashSet<&String> = alts.iter().collect();
        prop_assert_eq!(distinct.len(), alts.len(), "{:?}", alts);
    }

    #[test]
    fn prop_link_safety(source in layout(), options in options()) {
        let html = format(&source, &options).unwrap_or_default();

        for href in scan_tags(&html)
            .iter()
            .filter(|t| t.is_start("a"))
            .filter_map(|t| t.attributes().get("href").map(str::to_string))
        {
            if href.starts_with("http") {
                prop_assert!(href.contains("utm_medium=email"), "{}", href);
                prop_assert!(href.contains("utm_campaign=spring"), "{}", href);
                prop_assert!(!href.contains("utm_medium=old"), "{}", href);
            } else {
                prop_assert!(UNTOUCHABLE_HREFS.contains(&href.as_str()), "{}", href);
            }
        }
    }

    #[test]
    fn prop_image_only_cell_selectivity(source in document(), options in options()) {
        let html = format(&source, &options).unwrap_or_default();
        let tags = scan_tags(&html);

        for (i, tag) in tags.iter().enumerate().filter(|(_, t)| t.is_start("td")) {
            let Some(close) = find_closing(&tags, i) else { continue };
            let content = &html[tag.span.end..tags[close].span.start];
            let collapsed = tag
                .attributes()
                .get("style")
                .is_some_and(|s| s.contains(IMAGE_CELL_CSS));

            if is_image_only(content) {
                prop_assert!(collapsed, "{}", content);
            } else if content.contains("<img") {
                prop_assert!(!collapsed, "{}", content);
            }
        }
    }

    #[test]
    fn prop_document_is_complete(source in document(), options in options()) {
        let html = format(&source, &options).unwrap_or_default();
        prop_assert!(html.get(..9).is_some_and(|p| p.eq_ignore_ascii_case("<!doctype")), "{}", html);
        prop_assert_eq!(count(&html, r"(?i)<html[\s>]"), 1);
        prop_assert_eq!(count(&html, r"(?i)<head[\s>]"), 1);
        prop_assert_eq!(count(&html, r"(?i)<body[\s>]"), 1);
    }

    #[test]
    fn prop_formatting_is_deterministic(source in document(), options in options()) {
        prop_assert_eq!(format(&source, &options).ok(), format(&source, &options).ok());
    }
}
