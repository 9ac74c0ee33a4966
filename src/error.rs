//! Error types for formatting operations

use thiserror::Error;

/// Errors that can occur before or around the formatting pipeline
///
/// The pipeline itself never fails: every transformer degrades to a
/// pass-through. These variants cover input rejected up front and failures
/// at the byte/C boundaries.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Source HTML rejected before the pipeline ran
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A configuration field is unusable
    #[error("Invalid option '{field}': {reason}")]
    InvalidOption {
        /// Name of the offending option
        field: &'static str,
        /// Human-readable reason
        reason: String,
    },
    /// Character encoding error
    #[error("Encoding error: {0}")]
    Encoding(String),
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FormatError {
    /// Get numeric error code for FFI
    pub fn code(&self) -> u32 {
        match self {
            FormatError::Encoding(_) => 2,
            FormatError::InvalidInput(_) => 5,
            FormatError::InvalidOption { .. } => 6,
            FormatError::Internal(_) => 99,
        }
    }

    /// Name of the option that failed validation, if any
    ///
    /// Form front-ends use this to focus the offending field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            FormatError::InvalidOption { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            FormatError::Encoding("x".into()),
            FormatError::InvalidInput("x".into()),
            FormatError::InvalidOption {
                field: "image_base_url",
                reason: "x".into(),
            },
            FormatError::Internal("x".into()),
        ];
        let mut codes: Vec<u32> = errors.iter().map(FormatError::code).collect();
        codes.dedup();
        assert_eq!(codes.len(), 4);
    }

    #[test]
    fn test_display_includes_field_name() {
        let err = FormatError::InvalidOption {
            field: "image_base_url",
            reason: "must be an absolute http(s) URL".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid option 'image_base_url': must be an absolute http(s) URL"
        );
        assert_eq!(err.field(), Some("image_base_url"));
        assert_eq!(FormatError::InvalidInput("empty".into()).field(), None);
    }
}
