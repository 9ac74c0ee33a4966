//! Alt text generation and uniqueness
//!
//! Sliced exports usually ship images named `slice_01.png`, `index_03.jpg` and
//! the like with no alt text. Alt text is generated from the filename when
//! possible, from the hidden text as a second choice, and from the image
//! position as a last resort. The [`AltTextRegistry`] keeps every alt in one
//! pass distinct.

use percent_encoding::percent_decode_str;
use std::collections::HashSet;

/// Filename prefixes added by slicing/export tools
const EXPORT_PREFIXES: &[&str] = &[
    "slices", "slice", "index", "images", "image", "img", "untitled", "layer", "group", "asset",
    "export", "frame", "copy",
];

/// Maximum excerpt length taken from hidden text
const EXCERPT_MAX_CHARS: usize = 40;
const EXCERPT_MAX_WORDS: usize = 6;

/// Case-insensitive set of alt strings used in one image pass
///
/// Allocated fresh for every pass; never shared between runs.
#[derive(Debug, Default)]
pub struct AltTextRegistry {
    used: HashSet<String>,
}

impl AltTextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, alt: &str) -> bool {
        self.used.contains(&alt.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Claim an author-supplied alt for the image at 0-based `index`
    ///
    /// Collisions append ` <index+1>`, counting up until unique.
    pub fn claim_explicit(&mut self, alt: &str, index: usize) -> String {
        let mut n = index + 1;
        let mut candidate = alt.to_string();
        while self.contains(&candidate) {
            candidate = format!("{alt} {n}");
            n += 1;
        }
        self.insert(candidate)
    }

    /// Claim a generated alt
    ///
    /// Collisions append ` variant <n>` starting at 2.
    pub fn claim_generated(&mut self, alt: &str) -> String {
        let mut n = 2;
        let mut candidate = alt.to_string();
        while self.contains(&candidate) {
            candidate = format!("{alt} variant {n}");
            n += 1;
        }
        self.insert(candidate)
    }

    fn insert(&mut self, alt: String) -> String {
        self.used.insert(alt.to_lowercase());
        alt
    }
}

/// Derive alt text from an image reference
///
/// Strips the query, directory, extension and export-tool prefixes, splits
/// the rest into words, title-cases words longer than two characters and
/// appends the first numeric segment as `section N`.
///
/// # Examples
///
/// ```rust
/// use email_html_formatter::transform::alt_text::alt_from_filename;
///
/// assert_eq!(alt_from_filename("images/slice_01.png").as_deref(), Some("Email section 01"));
/// assert_eq!(alt_from_filename("hero-banner_2.jpg").as_deref(), Some("Hero Banner section 2"));
/// assert_eq!(alt_from_filename("data:image/png;base64,AAAA"), None);
/// ```
pub fn alt_from_filename(src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() || src.to_ascii_lowercase().starts_with("data:") {
        return None;
    }

    let path = src.split(['?', '#']).next().unwrap_or(src);
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let file = percent_decode_str(file).decode_utf8_lossy().to_lowercase();

    let stem = match file.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) => stem,
        _ => file.as_str(),
    };
    let stem = strip_export_prefixes(stem);

    let mut words: Vec<String> = Vec::new();
    let mut number: Option<String> = None;

    for token in stem
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let has_digit = token.chars().any(|c| c.is_ascii_digit());
        let has_alpha = token.chars().any(char::is_alphabetic);

        if has_digit && has_alpha && token.len() >= 8 {
            // Content hashes and generated ids carry no meaning
            continue;
        }

        for run in digit_runs(token) {
            if run.chars().all(|c| c.is_ascii_digit()) {
                if number.is_none() {
                    number = Some(run.to_string());
                }
            } else {
                words.push(title_case(run));
            }
        }
    }

    let text = words.join(" ");
    match (text.is_empty(), number) {
        (true, None) => None,
        (true, Some(n)) => Some(format!("Email section {n}")),
        (false, None) => Some(text),
        (false, Some(n)) => Some(format!("{text} section {n}")),
    }
}

/// Short excerpt of hidden text suffixed with the 1-based position
pub fn alt_from_excerpt(text: &str, index: usize) -> Option<String> {
    let mut excerpt = String::new();
    for word in text.split_whitespace().take(EXCERPT_MAX_WORDS) {
        let extra = if excerpt.is_empty() { word.chars().count() } else { word.chars().count() + 1 };
        if excerpt.chars().count() + extra > EXCERPT_MAX_CHARS {
            break;
        }
        if !excerpt.is_empty() {
            excerpt.push(' ');
        }
        excerpt.push_str(word);
    }

    let excerpt = excerpt.trim_end_matches(|c: char| c.is_ascii_punctuation());
    if excerpt.is_empty() {
        return None;
    }
    Some(format!("{} {}", excerpt, index + 1))
}

/// Last-resort alt for the image at 0-based `index`
pub fn positional_alt(index: usize) -> String {
    format!("Email content image {}", index + 1)
}

fn strip_export_prefixes(stem: &str) -> &str {
    let mut rest = stem.trim();
    loop {
        let before = rest;
        for prefix in EXPORT_PREFIXES {
            if let Some(after) = rest.strip_prefix(prefix) {
                let boundary = after
                    .chars()
                    .next()
                    .is_none_or(|c| c.is_ascii_digit() || !c.is_alphanumeric());
                if boundary {
                    rest = after.trim_start_matches(|c: char| !c.is_alphanumeric());
                    break;
                }
            }
        }
        if rest == before {
            return rest;
        }
    }
}

/// Split `hero2b` into `hero`, `2`, `b`
fn digit_runs(token: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut digits: Option<bool> = None;

    for (i, c) in token.char_indices() {
        let is_digit = c.is_ascii_digit();
        if digits.is_some_and(|d| d != is_digit) {
            runs.push(&token[start..i]);
            start = i;
        }
        digits = Some(is_digit);
    }
    if start < token.len() {
        runs.push(&token[start..]);
    }
    runs
}

fn title_case(word: &str) -> String {
    if word.chars().count() <= 2 {
        return word.to_string();
    }
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_names() {
        assert_eq!(alt_from_filename("slice_01.png").as_deref(), Some("Email section 01"));
        assert_eq!(alt_from_filename("slice_02.png").as_deref(), Some("Email section 02"));
        assert_eq!(alt_from_filename("index_03.jpg").as_deref(), Some("Email section 03"));
        assert_eq!(alt_from_filename("images/Untitled-1_05.gif").as_deref(), Some("Email section 1"));
    }

    #[test]
    fn test_words_title_cased() {
        assert_eq!(
            alt_from_filename("https://cdn.x.com/a/summer_sale-of-the_year.png?v=3").as_deref(),
            Some("Summer Sale of The Year")
        );
    }

    #[test]
    fn test_prefix_needs_boundary() {
        assert_eq!(alt_from_filename("imagery.png").as_deref(), Some("Imagery"));
        assert_eq!(alt_from_filename("image_footer.png").as_deref(), Some("Footer"));
    }

    #[test]
    fn test_percent_encoded_names() {
        assert_eq!(alt_from_filename("spring%20promo.png").as_deref(), Some("Spring Promo"));
    }

    #[test]
    fn test_hash_names_yield_nothing() {
        assert_eq!(alt_from_filename("a8f3c9e1d2b4.png"), None);
        assert_eq!(alt_from_filename(""), None);
        assert_eq!(alt_from_filename("slice.png"), None);
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(
            alt_from_excerpt("Fresh picks for spring, delivered to your door today!", 0).as_deref(),
            Some("Fresh picks for spring, delivered to 1")
        );
        assert_eq!(alt_from_excerpt("   ", 2), None);
    }

    #[test]
    fn test_positional() {
        assert_eq!(positional_alt(0), "Email content image 1");
    }

    #[test]
    fn test_registry_explicit_collisions() {
        let mut registry = AltTextRegistry::new();
        assert_eq!(registry.claim_explicit("Logo", 0), "Logo");
        assert_eq!(registry.claim_explicit("logo", 3), "logo 4");
        assert_eq!(registry.claim_explicit("LOGO", 3), "LOGO 5");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_registry_generated_collisions() {
        let mut registry = AltTextRegistry::new();
        assert_eq!(registry.claim_generated("Email section 01"), "Email section 01");
        assert_eq!(registry.claim_generated("Email section 01"), "Email section 01 variant 2");
        assert_eq!(registry.claim_generated("email SECTION 01"), "email SECTION 01 variant 3");
    }
}
