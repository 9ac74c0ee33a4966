//! Text primitives shared by the transformers
//!
//! Escaping, URL joining and span splicing. Splicing is the only way the
//! transformers write back into the document: they collect `(range,
//! replacement)` edits against the scanned input and apply them in one pass,
//! so bytes outside the edited spans are never touched.

use std::borrow::Cow;
use std::ops::Range;

/// A replacement of `range` in the source with `text`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub text: String,
}

impl Edit {
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    /// Insert `text` at byte offset `at`
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at..at, text)
    }
}

/// Apply edits to `source`
///
/// Edits are applied in order of their start offset; an edit overlapping an
/// earlier accepted one is dropped. Returns the source borrowed when there is
/// nothing to apply.
pub fn splice(source: &str, mut edits: Vec<Edit>) -> Cow<'_, str> {
    if edits.is_empty() {
        return Cow::Borrowed(source);
    }

    // Stable sort keeps insertion order for edits at the same offset
    edits.sort_by_key(|e| (e.range.start, e.range.end));

    let extra: usize = edits.iter().map(|e| e.text.len()).sum();
    let mut output = String::with_capacity(source.len() + extra);
    let mut cursor = 0;

    for edit in edits {
        if edit.range.start < cursor || edit.range.end > source.len() {
            continue;
        }
        output.push_str(&source[cursor..edit.range.start]);
        output.push_str(&edit.text);
        cursor = edit.range.end;
    }
    output.push_str(&source[cursor..]);

    Cow::Owned(output)
}

/// Escape text content for insertion between tags
pub fn escape_text(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Escape a value for a double-quoted attribute
pub fn escape_attribute(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}

/// Whether an image/link reference is already absolute
///
/// `http(s)://`, `data:`, `cid:` and protocol-relative `//` references are
/// left alone by base URL joining.
pub fn is_absolute_reference(reference: &str) -> bool {
    let lower = reference.trim_start().to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("data:")
        || lower.starts_with("cid:")
        || lower.starts_with("//")
}

/// Join a base URL and a relative path with exactly one slash
///
/// # Examples
///
/// ```rust
/// use email_html_formatter::text::join_url;
///
/// assert_eq!(join_url("https://cdn.x.com/img/", "/pic.png"), "https://cdn.x.com/img/pic.png");
/// assert_eq!(join_url("https://cdn.x.com/img", "./a/b.png"), "https://cdn.x.com/img/a/b.png");
/// ```
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim().trim_end_matches('/');
    let mut path = path.trim();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        return format!("{base}/");
    }
    format!("{base}/{path}")
}
