//! Source charset detection and decoding
//!
//! Exported email HTML is not always UTF-8: design tools on Windows still
//! write `windows-1252` and some ESP exports declare `ISO-8859-1`. The byte
//! entry point resolves the charset with this cascade:
//!
//! 1. a byte order mark
//! 2. the `charset` parameter of a Content-Type value
//! 3. a `<meta charset>` or `<meta http-equiv="Content-Type">` declaration
//!    within the first 1024 bytes
//! 4. UTF-8
//!
//! and transcodes with `encoding_rs`. Malformed byte sequences are an error,
//! never silently replaced.
//!
//! # Examples
//!
//! ```rust
//! use email_html_formatter::charset::{decode_source, detect_charset};
//!
//! assert_eq!(detect_charset(Some("text/html; charset=iso-8859-1"), b"<p>x</p>"), "ISO-8859-1");
//! assert_eq!(detect_charset(None, b"<meta charset=\"utf-8\"><p>x</p>"), "UTF-8");
//! assert_eq!(detect_charset(None, b"<p>x</p>"), "UTF-8");
//!
//! let decoded = decode_source(b"<p>caf\xe9</p>", Some("text/html; charset=windows-1252")).unwrap();
//! assert_eq!(decoded, "<p>café</p>");
//! ```

use encoding_rs::Encoding;
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

use crate::error::FormatError;

const DEFAULT_CHARSET: &str = "UTF-8";

/// Only the start of the document is searched for a meta declaration
const META_SCAN_LIMIT: usize = 1024;

fn content_type_regex() -> Option<&'static Regex> {
    static CONTENT_TYPE: OnceLock<Option<Regex>> = OnceLock::new();
    CONTENT_TYPE
        .get_or_init(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"';,\s]+)"#).ok())
        .as_ref()
}

/// Either meta form: `charset=` directly on the tag or inside `content`
fn meta_regex() -> Option<&'static Regex> {
    static META: OnceLock<Option<Regex>> = OnceLock::new();
    META.get_or_init(|| {
        Regex::new(r#"(?i)<meta\b[^>]*?\bcharset\s*=\s*["']?([A-Za-z0-9._:-]+)"#).ok()
    })
    .as_ref()
}

/// Resolve the declared charset, uppercased
pub fn detect_charset(content_type: Option<&str>, html: &[u8]) -> String {
    content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(html))
        .map(|charset| charset.to_ascii_uppercase())
        .unwrap_or_else(|| DEFAULT_CHARSET.to_string())
}

/// `charset` parameter of a Content-Type value
///
/// ```rust
/// use email_html_formatter::charset::charset_from_content_type;
///
/// assert_eq!(charset_from_content_type("text/html; charset=\"UTF-8\"").as_deref(), Some("UTF-8"));
/// assert_eq!(charset_from_content_type("text/html"), None);
/// ```
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type_regex()?
        .captures(content_type)?
        .get(1)
        .map(|m| m.as_str().to_string())
}

/// Charset declared by a `<meta>` tag near the start of the document
pub fn charset_from_meta(html: &[u8]) -> Option<String> {
    let prefix = &html[..html.len().min(META_SCAN_LIMIT)];
    let text = String::from_utf8_lossy(prefix);

    meta_regex()?
        .captures(&text)?
        .get(1)
        .map(|m| m.as_str().to_string())
}

/// Decode source bytes to UTF-8
///
/// Valid UTF-8 input without a BOM is borrowed, not copied.
pub fn decode_source<'a>(
    bytes: &'a [u8],
    content_type: Option<&str>,
) -> Result<Cow<'a, str>, FormatError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        log::debug!("decoding source as {} (byte order mark)", encoding.name());
        return decode_with(encoding, &bytes[bom_len..]);
    }

    let charset = detect_charset(content_type, bytes);
    if charset == DEFAULT_CHARSET || charset == "UTF8" {
        return std::str::from_utf8(bytes).map(Cow::Borrowed).map_err(|e| {
            FormatError::Encoding(format!(
                "invalid UTF-8 at byte {}: {}",
                e.valid_up_to(),
                e
            ))
        });
    }

    let encoding = Encoding::for_label(charset.as_bytes())
        .ok_or_else(|| FormatError::Encoding(format!("unsupported charset '{charset}'")))?;
    log::debug!("decoding source as {} (declared {charset})", encoding.name());
    decode_with(encoding, bytes)
}

fn decode_with<'a>(
    encoding: &'static Encoding,
    bytes: &'a [u8],
) -> Result<Cow<'a, str>, FormatError> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| {
            FormatError::Encoding(format!(
                "invalid byte sequence for charset '{}'",
                encoding.name()
            ))
        })
}
