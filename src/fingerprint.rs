//! Output fingerprints
//!
//! A preview or clipboard host re-renders only when the formatted document
//! actually changed. The fingerprint is the first 128 bits of the BLAKE3
//! hash of the output, as 32 lowercase hex characters.
//!
//! ```
//! use email_html_formatter::fingerprint::Fingerprint;
//!
//! let a = Fingerprint::of("<p>x</p>");
//! assert_eq!(a.as_str().len(), 32);
//! assert_eq!(a, Fingerprint::of("<p>x</p>"));
//! assert_ne!(a, Fingerprint::of("<p>y</p>"));
//! ```

use std::fmt;

/// Number of hash bytes kept
const FINGERPRINT_BYTES: usize = 16;

/// Stable digest of a formatted document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(html: &str) -> Self {
        let hash = blake3::hash(html.as_bytes());
        Self(hex::encode(&hash.as_bytes()[..FINGERPRINT_BYTES]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
