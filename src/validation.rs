//! Up-front validation of source HTML and options
//!
//! The pipeline never fails once it starts, so everything that can be
//! rejected is rejected here first:
//!
//! - empty or whitespace-only source
//! - source larger than the configured limit (10 MiB by default)
//! - an image base URL that is not an absolute `http(s)` URL
//! - a missing image base URL, when the caller requires one

use url::Url;

use crate::error::FormatError;
use crate::options::FormatOptions;

/// Default maximum accepted source size
pub const DEFAULT_MAX_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Validator applied before the pipeline runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputValidator {
    max_input_bytes: usize,
    require_image_base_url: bool,
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl InputValidator {
    /// Create a validator with default settings
    pub fn new() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            require_image_base_url: false,
        }
    }

    /// Create a validator with a custom size limit
    pub fn with_max_input_bytes(max_input_bytes: usize) -> Self {
        Self {
            max_input_bytes,
            ..Self::new()
        }
    }

    /// Require an image base URL to be configured
    pub fn require_image_base_url(mut self, required: bool) -> Self {
        self.require_image_base_url = required;
        self
    }

    pub fn max_input_bytes(&self) -> usize {
        self.max_input_bytes
    }

    /// Validate the source HTML
    ///
    /// # Examples
    ///
    /// ```
    /// use email_html_formatter::validation::InputValidator;
    ///
    /// let validator = InputValidator::with_max_input_bytes(16);
    /// assert!(validator.validate_source("<table></table>").is_ok());
    /// assert!(validator.validate_source("   ").is_err());
    /// assert!(validator.validate_source("<table><tr></tr></table>").is_err());
    /// ```
    pub fn validate_source(&self, source: &str) -> Result<(), FormatError> {
        if source.trim().is_empty() {
            return Err(FormatError::InvalidInput(
                "source HTML is empty".to_string(),
            ));
        }
        if source.len() > self.max_input_bytes {
            return Err(FormatError::InvalidInput(format!(
                "source HTML is {} bytes, exceeding the limit of {} bytes",
                source.len(),
                self.max_input_bytes
            )));
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate_options(&self, options: &FormatOptions) -> Result<(), FormatError> {
        match options.image_base_url() {
            Some(base) => check_image_base_url(base),
            None if self.require_image_base_url => Err(FormatError::InvalidOption {
                field: "image_base_url",
                reason: "an image base URL is required".to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Validate source and configuration, source first
    pub fn validate(&self, source: &str, options: &FormatOptions) -> Result<(), FormatError> {
        self.validate_source(source)?;
        self.validate_options(options)
    }
}

fn check_image_base_url(base: &str) -> Result<(), FormatError> {
    let invalid = |reason: String| FormatError::InvalidOption {
        field: "image_base_url",
        reason,
    };

    let url = Url::parse(base).map_err(|e| invalid(format!("'{base}' is not a URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "scheme '{}' is not http or https",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid(format!("'{base}' has no host")));
    }
    Ok(())
}
