//! Email HTML Formatter
//!
//! Rewrites raw exported HTML (typically a design mockup sliced into a table
//! layout) into a normalized document that survives Outlook, Gmail and Apple
//! Mail. The work is done by a fixed sequence of text transformations over a
//! tolerant tag scanner; there is no DOM, so malformed markup, MSO
//! conditional comments and VML pass through intact.
//!
//! # Architecture
//!
//! - `scanner`: tag tokenizer, attribute model, protected ranges
//! - `style`: inline `style` as an ordered declaration list
//! - `text`: span splicing, escaping, URL joining
//! - `transform`: the individual rewriting steps
//! - `pipeline`: fixed-order composition of the steps
//! - `validation`: rejects unusable input before the pipeline runs
//! - `charset`: byte-level entry point with charset detection
//! - `fingerprint`: stable BLAKE3 digest of the output
//! - `ffi`: C ABI for preview/clipboard hosts
//!
//! # Examples
//!
//! ```rust
//! use email_html_formatter::{format, FormatOptions};
//!
//! let options = FormatOptions::default()
//!     .with_image_base_url("https://cdn.example.com/img")
//!     .with_utm("email", "spring");
//! let html = format(
//!     r#"<table height="400"><tr><td><a href="/shop"><img src="slice_01.png"></a></td></tr></table>"#,
//!     &options,
//! )
//! .unwrap();
//!
//! assert!(html.contains(r#"src="https://cdn.example.com/img/slice_01.png""#));
//! assert!(html.contains(r#"href="/shop?utm_medium=email&utm_campaign=spring""#));
//! assert!(html.contains(r#"alt="Email section 01""#));
//! ```
//!
//! # Logging
//!
//! Steps report through the `log` facade; install any logger (the demos use
//! `env_logger`) to see them.

pub mod charset;
pub mod error;
pub mod ffi;
pub mod fingerprint;
pub mod options;
pub mod pipeline;
pub mod scanner;
pub mod style;
pub mod text;
pub mod transform;
pub mod validation;

pub use error::FormatError;
pub use fingerprint::Fingerprint;
pub use options::{FormatOptions, TargetWidth};
pub use pipeline::{EmailFormatter, PipelineStep};
pub use validation::InputValidator;

/// Format `source` with `options`
///
/// Shorthand for `EmailFormatter::new(options.clone()).format(source)`.
pub fn format(source: &str, options: &FormatOptions) -> Result<String, FormatError> {
    EmailFormatter::new(options.clone()).format(source)
}

/// Decode `bytes` using `content_type` or an in-document declaration, then format
pub fn format_bytes(
    bytes: &[u8],
    content_type: Option<&str>,
    options: &FormatOptions,
) -> Result<String, FormatError> {
    EmailFormatter::new(options.clone()).format_bytes(bytes, content_type)
}
