//! Link UTM tagging
//!
//! Outbound `<a href>` links get `utm_medium` / `utm_campaign` query
//! parameters. Relative links are resolved against a synthetic base so the
//! query can be edited with a real URL parser, then written back with their
//! original path so they stay relative.
//!
//! Left untouched:
//! - `mailto:`, `tel:`, `#...` and `javascript:` hrefs (any case)
//! - empty hrefs and non-http(s) absolute schemes
//! - hrefs carrying ESP merge tags (`*|UNSUB|*`, `{{url}}`, `%%view%%`, `[[link]]`),
//!   which a URL parser would mangle
//! - anything that fails to parse

use std::borrow::Cow;
use url::{ParseError, Position, Url};

use crate::options::FormatOptions;
use crate::transform::rewrite_start_tags;

/// Base used only to resolve relative hrefs; never appears in output
const SYNTHETIC_BASE: &str = "https://synthetic.invalid/";

const SKIPPED_PREFIXES: &[&str] = &["mailto:", "tel:", "#", "javascript:"];

const MERGE_TAG_MARKERS: &[&str] = &["*|", "{{", "%%", "[["];

/// Tag every eligible `<a href>` with the configured UTM parameters
pub fn tag_links<'a>(html: &'a str, options: &FormatOptions) -> Cow<'a, str> {
    if !options.has_utm() {
        return Cow::Borrowed(html);
    }
    let medium = options.utm_medium();
    let campaign = options.utm_campaign();

    rewrite_start_tags(html, "a", |_, attributes| {
        let href = attributes.get("href")?;
        let tagged = tag_href(href, medium, campaign)?;
        let mut updated = attributes.clone();
        updated.set("href", tagged);
        Some(updated)
    })
}

/// Add UTM parameters to a single href
///
/// Returns `None` when the href must stay byte-identical.
///
/// # Examples
///
/// ```rust
/// use email_html_formatter::transform::links::tag_href;
///
/// assert_eq!(
///     tag_href("/shop?ref=x", Some("email"), Some("spring")).as_deref(),
///     Some("/shop?ref=x&utm_medium=email&utm_campaign=spring")
/// );
/// assert_eq!(tag_href("mailto:hi@example.com", Some("email"), None), None);
/// ```
pub fn tag_href(href: &str, medium: Option<&str>, campaign: Option<&str>) -> Option<String> {
    let trimmed = href.trim();
    if trimmed.is_empty() || (medium.is_none() && campaign.is_none()) {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    if SKIPPED_PREFIXES.iter().any(|p| lower.starts_with(p))
        || MERGE_TAG_MARKERS.iter().any(|m| trimmed.contains(m))
    {
        return None;
    }

    // Only decode hrefs written with `&amp;`; a bare `&reg=1` is a parameter, not an entity
    let entity_encoded = trimmed.contains("&amp;");
    let decoded = if entity_encoded {
        html_escape::decode_html_entities(trimmed)
    } else {
        Cow::Borrowed(trimmed)
    };

    let (mut url, relative) = match Url::parse(&decoded) {
        Ok(url) => (url, false),
        Err(ParseError::RelativeUrlWithoutBase) => {
            let resolved = Url::parse(SYNTHETIC_BASE).and_then(|base| base.join(&decoded));
            match resolved {
                Ok(url) => (url, true),
                Err(e) => {
                    log::debug!("leaving unparseable href {trimmed:?}: {e}");
                    return None;
                }
            }
        }
        Err(e) => {
            log::debug!("leaving unparseable href {trimmed:?}: {e}");
            return None;
        }
    };

    if !relative && !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    for (key, value) in [("utm_medium", medium), ("utm_campaign", campaign)] {
        if let Some(value) = value {
            set_query_pair(&mut pairs, key, value);
        }
    }
    url.query_pairs_mut().clear().extend_pairs(pairs.iter());

    let mut tagged = if relative {
        let path = decoded.split(['?', '#']).next().unwrap_or("");
        format!("{}{}", path, &url[Position::AfterPath..])
    } else {
        url.to_string()
    };

    if entity_encoded {
        tagged = tagged.replace('&', "&amp;");
    }
    Some(tagged)
}

/// Overwrite the first `key` in place (dropping repeats) or append it
fn set_query_pair(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    match pairs.iter().position(|(k, _)| k == key) {
        Some(first) => {
            pairs[first].1 = value.to_string();
            let mut index = 0;
            pairs.retain(|(k, _)| {
                let keep = index <= first || k != key;
                index += 1;
                keep
            });
        }
        None => pairs.push((key.to_string(), value.to_string())),
    }
}
