//! Image enhancement
//!
//! For every `<img>`: resolve relative sources against the configured image
//! base URL, merge the baseline email image style ahead of the author style,
//! and make sure the image has a non-empty alt that is unique within the
//! document. Author alts have their whitespace collapsed to single spaces
//! before uniqueness is checked. Pixel `width`/`height` attributes are never touched.

use std::borrow::Cow;

use crate::options::FormatOptions;
use crate::scanner::Attributes;
use crate::style::{MergeMode, StyleBlock};
use crate::text::{escape_attribute, is_absolute_reference, join_url};
use crate::transform::alt_text::{
    alt_from_excerpt, alt_from_filename, positional_alt, AltTextRegistry,
};
use crate::transform::rewrite_start_tags;

/// Baseline style every email image carries
pub const IMAGE_BASELINE_CSS: &str = "display:block; line-height:0; font-size:0; height:auto; max-width:100%; border:0; outline:none; text-decoration:none; -ms-interpolation-mode:bicubic;";

/// Enhance every `<img>` in document order
pub fn enhance_images<'a>(html: &'a str, options: &FormatOptions) -> Cow<'a, str> {
    let baseline = StyleBlock::parse(IMAGE_BASELINE_CSS);
    let mut registry = AltTextRegistry::new();
    let mut position = 0usize;

    let output = rewrite_start_tags(html, "img", |_, attributes| {
        let index = position;
        position += 1;
        Some(enhance_image(attributes, index, options, &baseline, &mut registry))
    });

    log::debug!("enhanced {position} image(s), {} distinct alt text(s)", registry.len());
    output
}

fn enhance_image(
    attributes: &Attributes,
    index: usize,
    options: &FormatOptions,
    baseline: &StyleBlock,
    registry: &mut AltTextRegistry,
) -> Attributes {
    let mut updated = attributes.clone();

    let src = attributes.get("src").map(str::trim).unwrap_or("");
    if let Some(base) = options.image_base_url()
        && !src.is_empty()
        && !is_absolute_reference(src)
    {
        updated.set("src", join_url(base, src));
    }

    let style = attributes.style().merged_with(baseline, MergeMode::Override);
    updated.set_style(&style);

    // Stored with single spaces, the form whitespace tidying leaves behind
    let explicit = attributes
        .get("alt")
        .map(|alt| alt.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|alt| !alt.is_empty());

    let alt = match explicit {
        Some(alt) => registry.claim_explicit(&alt, index),
        None => {
            let generated = alt_from_filename(src)
                .or_else(|| {
                    options
                        .balance_text()
                        .or(options.preheader_text())
                        .and_then(|text| alt_from_excerpt(text, index))
                })
                .unwrap_or_else(|| positional_alt(index));
            registry.claim_generated(&escape_attribute(&generated))
        }
    };

    if attributes.get("alt") != Some(alt.as_str()) {
        updated.set("alt", alt);
    }

    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan_tags;
    use std::collections::HashSet;

    fn alts(html: &str) -> Vec<String> {
        scan_tags(html)
            .iter()
            .filter(|t| t.is_start("img"))
            .map(|t| t.attributes().get("alt").unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn test_relative_src_joined() {
        let options = FormatOptions::default().with_image_base_url("https://cdn.x.com/img/");
        let out = enhance_images(r#"<img src="/pic.png">"#, &options);
        assert!(out.contains(r#"src="https://cdn.x.com/img/pic.png""#));
    }

    #[test]
    fn test_absolute_src_untouched() {
        let options = FormatOptions::default().with_image_base_url("https://cdn.x.com/img");
        for src in ["https://other.com/a.png", "data:image/gif;base64,R0lGOD", "cid:logo"] {
            let html = format!(r#"<img src="{src}" alt="x">"#);
            let out = enhance_images(&html, &options);
            assert!(out.contains(&format!(r#"src="{src}""#)), "{out}");
        }
    }

    #[test]
    fn test_no_base_url_keeps_relative_src() {
        let out = enhance_images(r#"<img src="pic.png">"#, &FormatOptions::default());
        assert!(out.contains(r#"src="pic.png""#));
    }

    #[test]
    fn test_baseline_style_and_dimensions() {
        let html = r#"<img src="a.png" width="300" height="120" style="border:2px solid red; color:blue">"#;
        let out = enhance_images(html, &FormatOptions::default());
        assert!(out.contains(r#"width="300""#));
        assert!(out.contains(r#"height="120""#));
        assert!(out.contains(&format!(r#"style="{IMAGE_BASELINE_CSS} color:blue;""#)));
        assert!(!out.contains("2px solid red"));
    }

    #[test]
    fn test_explicit_alt_kept() {
        let out = enhance_images(r#"<img src="slice_01.png" alt="Spring sale">"#, &FormatOptions::default());
        assert_eq!(alts(&out), vec!["Spring sale"]);
    }

    #[test]
    fn test_slice_alts_are_distinct() {
        let html = r#"<img src="slice_01.png"><img src="slice_02.png">"#;
        let out = enhance_images(html, &FormatOptions::default());
        assert_eq!(alts(&out), vec!["Email section 01", "Email section 02"]);
    }

    #[test]
    fn test_excerpt_then_positional_fallback() {
        let html = r#"<img src="a8f3c9e1d2b4.png"><img>"#;
        let with_text = FormatOptions::default().with_preheader("Weekly digest");
        assert_eq!(
            alts(&enhance_images(html, &with_text)),
            vec!["Weekly digest 1", "Weekly digest 2"]
        );
        assert_eq!(
            alts(&enhance_images(html, &FormatOptions::default())),
            vec!["Email content image 1", "Email content image 2"]
        );
    }

    #[test]
    fn test_duplicate_alts_resolved() {
        let html = r#"<img src="a.png" alt="Logo"><img src="b.png" alt="logo"><img src="banner.png"><img src="banner.png">"#;
        let out = enhance_images(html, &FormatOptions::default());
        let found = alts(&out);
        assert_eq!(found, vec!["Logo", "logo 2", "Banner", "Banner variant 2"]);
        let unique: HashSet<String> = found.iter().map(|a| a.to_lowercase()).collect();
        assert_eq!(unique.len(), found.len());
    }

    #[test]
    fn test_alts_differing_only_in_spacing_resolved() {
        let html = "<img src=\"a.png\" alt=\"Big  Sale\"><img src=\"b.png\" alt=\" Big Sale\"><img src=\"c.png\" alt=\"Big\tSale\">";
        let out = enhance_images(html, &FormatOptions::default());
        assert_eq!(alts(&out), vec!["Big Sale", "Big Sale 2", "Big Sale 3"]);
    }

    #[test]
    fn test_images_in_conditional_comments_untouched() {
        let html = r#"<!--[if mso]><img src="x.png"><![endif]--><img src="y.png">"#;
        let out = enhance_images(html, &FormatOptions::default());
        assert!(out.starts_with(r#"<!--[if mso]><img src="x.png"><![endif]-->"#));
    }
}
