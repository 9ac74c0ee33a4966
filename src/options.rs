//! Formatting options
//!
//! `FormatOptions` is the single immutable configuration record passed to
//! every pipeline run. Nothing is read from ambient state: two runs with equal
//! options and equal input produce byte-identical output.
//!
//! # Examples
//!
//! ```rust
//! use email_html_formatter::options::{FormatOptions, TargetWidth};
//!
//! let options = FormatOptions::default()
//!     .with_image_base_url("https://cdn.example.com/img")
//!     .with_preheader("Spring sale starts today")
//!     .with_utm("email", "spring")
//!     .responsive(true)
//!     .with_target_width(TargetWidth::W650);
//!
//! assert_eq!(options.target_width.pixels(), 650);
//! assert_eq!(options.utm_medium(), Some("email"));
//! ```

use std::fmt;

/// Nominal email container width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetWidth {
    /// 600 pixels, the common default
    #[default]
    W600,
    /// 650 pixels
    W650,
}

impl TargetWidth {
    /// Width in CSS pixels
    pub fn pixels(self) -> u32 {
        match self {
            TargetWidth::W600 => 600,
            TargetWidth::W650 => 650,
        }
    }

    /// Map a pixel count back to a supported width
    pub fn from_pixels(pixels: u32) -> Option<Self> {
        match pixels {
            600 => Some(TargetWidth::W600),
            650 => Some(TargetWidth::W650),
            _ => None,
        }
    }
}

impl fmt::Display for TargetWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.pixels())
    }
}

/// Configuration for one formatting run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Absolute prefix for relative image paths
    pub image_base_url: Option<String>,
    /// Hidden inbox preview text
    pub preheader_text: Option<String>,
    /// Hidden filler text balancing the image/text ratio
    pub balance_text: Option<String>,
    /// `utm_medium` query parameter for outbound links
    pub utm_medium: Option<String>,
    /// `utm_campaign` query parameter for outbound links
    pub utm_campaign: Option<String>,
    /// Fluid (`width="100%"` + `max-width`) instead of fixed table width
    pub responsive: bool,
    /// Container width
    pub target_width: TargetWidth,
    /// Wrap multi-column rows of mixed tables into nested tables
    pub wrap_columns: bool,
    /// Title of a freshly built document shell
    pub title: Option<String>,
}

/// Treat empty and whitespace-only strings as absent
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl FormatOptions {
    /// Set the image base URL
    pub fn with_image_base_url(mut self, url: impl Into<String>) -> Self {
        self.image_base_url = Some(url.into());
        self
    }

    /// Set the preheader text
    pub fn with_preheader(mut self, text: impl Into<String>) -> Self {
        self.preheader_text = Some(text.into());
        self
    }

    /// Set the hidden balance text
    pub fn with_balance_text(mut self, text: impl Into<String>) -> Self {
        self.balance_text = Some(text.into());
        self
    }

    /// Set both UTM parameters
    pub fn with_utm(mut self, medium: impl Into<String>, campaign: impl Into<String>) -> Self {
        self.utm_medium = Some(medium.into());
        self.utm_campaign = Some(campaign.into());
        self
    }

    /// Set the container width
    pub fn with_target_width(mut self, width: TargetWidth) -> Self {
        self.target_width = width;
        self
    }

    /// Set the document title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Toggle fluid table widths
    pub fn responsive(mut self, responsive: bool) -> Self {
        self.responsive = responsive;
        self
    }

    /// Toggle multi-column row wrapping
    pub fn wrap_columns(mut self, wrap: bool) -> Self {
        self.wrap_columns = wrap;
        self
    }

    pub fn image_base_url(&self) -> Option<&str> {
        non_blank(&self.image_base_url)
    }

    pub fn preheader_text(&self) -> Option<&str> {
        non_blank(&self.preheader_text)
    }

    pub fn balance_text(&self) -> Option<&str> {
        non_blank(&self.balance_text)
    }

    pub fn utm_medium(&self) -> Option<&str> {
        non_blank(&self.utm_medium)
    }

    pub fn utm_campaign(&self) -> Option<&str> {
        non_blank(&self.utm_campaign)
    }

    pub fn title(&self) -> Option<&str> {
        non_blank(&self.title)
    }

    /// Whether link tagging has anything to write
    pub fn has_utm(&self) -> bool {
        self.utm_medium().is_some() || self.utm_campaign().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = FormatOptions::default();
        assert!(!options.responsive);
        assert!(!options.wrap_columns);
        assert_eq!(options.target_width, TargetWidth::W600);
        assert!(!options.has_utm());
    }

    #[test]
    fn test_blank_strings_are_absent() {
        let options = FormatOptions::default()
            .with_preheader("   ")
            .with_balance_text("")
            .with_utm("", " spring ");
        assert_eq!(options.preheader_text(), None);
        assert_eq!(options.balance_text(), None);
        assert_eq!(options.utm_medium(), None);
        assert_eq!(options.utm_campaign(), Some("spring"));
        assert!(options.has_utm());
    }

    #[test]
    fn test_target_width_round_trip() {
        assert_eq!(TargetWidth::from_pixels(650), Some(TargetWidth::W650));
        assert_eq!(TargetWidth::from_pixels(700), None);
        assert_eq!(TargetWidth::W600.to_string(), "600px");
    }
}
