//! Formatting pipeline
//!
//! Composes the transformers in one fixed order:
//!
//! 1. strip table heights
//! 2. normalize tables
//! 3. inject the preheader
//! 4. inject balance text
//! 5. enhance images
//! 6. collapse image-only cells
//! 7. clean colspans
//! 8. wrap multi-column rows (only with `wrap_columns`)
//! 9. tag links with UTM parameters
//! 10. tidy whitespace
//! 11. propagate cell backgrounds
//! 12. wrap the document
//!
//! Order matters: heights go before normalization so no author `height`
//! survives on a table, hidden rows are injected into an already normalized
//! table, colspans are cleaned before column wrapping looks at them, and the
//! document shell is built last so no other step touches it.
//!
//! Input and configuration are validated before the first step. Once the
//! pipeline starts it cannot fail: each step passes through what it cannot
//! handle.
//!
//! # Examples
//!
//! ```rust
//! use email_html_formatter::{EmailFormatter, FormatOptions};
//!
//! let formatter = EmailFormatter::new(FormatOptions::default().with_preheader("Hello"));
//! let html = formatter.format("<table><tr><td>Hi</td></tr></table>").unwrap();
//!
//! assert!(html.starts_with("<!DOCTYPE"));
//! assert!(html.contains(r#"role="presentation""#));
//! assert!(html.contains("mso-hide:all"));
//! ```

use std::borrow::Cow;

use crate::charset::decode_source;
use crate::error::FormatError;
use crate::options::FormatOptions;
use crate::transform::{
    background, cells, colspan, columns, document, hidden_text, images, links, table, whitespace,
};
use crate::validation::InputValidator;

/// One pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    StripTableHeights,
    NormalizeTables,
    InjectPreheader,
    InjectBalanceText,
    EnhanceImages,
    CollapseImageCells,
    CleanColspans,
    WrapColumns,
    TagLinks,
    TidyWhitespace,
    PropagateBackgrounds,
    WrapDocument,
}

impl PipelineStep {
    /// Every step, in execution order
    pub const ALL: [PipelineStep; 12] = [
        PipelineStep::StripTableHeights,
        PipelineStep::NormalizeTables,
        PipelineStep::InjectPreheader,
        PipelineStep::InjectBalanceText,
        PipelineStep::EnhanceImages,
        PipelineStep::CollapseImageCells,
        PipelineStep::CleanColspans,
        PipelineStep::WrapColumns,
        PipelineStep::TagLinks,
        PipelineStep::TidyWhitespace,
        PipelineStep::PropagateBackgrounds,
        PipelineStep::WrapDocument,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PipelineStep::StripTableHeights => "height-strip",
            PipelineStep::NormalizeTables => "table-normalize",
            PipelineStep::InjectPreheader => "preheader-inject",
            PipelineStep::InjectBalanceText => "balance-text-inject",
            PipelineStep::EnhanceImages => "image-enhance",
            PipelineStep::CollapseImageCells => "image-only-cell-collapse",
            PipelineStep::CleanColspans => "colspan-clean",
            PipelineStep::WrapColumns => "column-wrap",
            PipelineStep::TagLinks => "link-utm-tag",
            PipelineStep::TidyWhitespace => "whitespace-tidy",
            PipelineStep::PropagateBackgrounds => "background-propagate",
            PipelineStep::WrapDocument => "document-wrap",
        }
    }

    /// Whether the step runs under `options`
    pub fn is_enabled(self, options: &FormatOptions) -> bool {
        match self {
            PipelineStep::WrapColumns => options.wrap_columns,
            _ => true,
        }
    }

    /// Apply this step alone
    pub fn apply<'a>(self, html: &'a str, options: &FormatOptions) -> Cow<'a, str> {
        match self {
            PipelineStep::StripTableHeights => table::strip_table_heights(html),
            PipelineStep::NormalizeTables => table::normalize_tables(html, options),
            PipelineStep::InjectPreheader => {
                hidden_text::inject_preheader(html, options.preheader_text())
            }
            PipelineStep::InjectBalanceText => {
                hidden_text::inject_balance_text(html, options.balance_text())
            }
            PipelineStep::EnhanceImages => images::enhance_images(html, options),
            PipelineStep::CollapseImageCells => cells::collapse_image_only_cells(html),
            PipelineStep::CleanColspans => colspan::clean_colspans(html),
            PipelineStep::WrapColumns => columns::wrap_multi_column_rows(html, options),
            PipelineStep::TagLinks => links::tag_links(html, options),
            PipelineStep::TidyWhitespace => whitespace::tidy_whitespace(html),
            PipelineStep::PropagateBackgrounds => background::propagate_backgrounds(html),
            PipelineStep::WrapDocument => document::wrap_document(html, options),
        }
    }
}

/// Reusable formatter bound to one configuration
#[derive(Debug, Clone, Default)]
pub struct EmailFormatter {
    options: FormatOptions,
    validator: InputValidator,
}

impl EmailFormatter {
    pub fn new(options: FormatOptions) -> Self {
        Self {
            options,
            validator: InputValidator::new(),
        }
    }

    /// Replace the default validator
    pub fn with_validator(mut self, validator: InputValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    /// Steps that run under this formatter's options, in order
    pub fn steps(&self) -> impl Iterator<Item = PipelineStep> + '_ {
        PipelineStep::ALL
            .into_iter()
            .filter(|step| step.is_enabled(&self.options))
    }

    /// Validate `source` and run the whole pipeline
    pub fn format(&self, source: &str) -> Result<String, FormatError> {
        self.validator.validate(source, &self.options)?;
        Ok(self.run(source))
    }

    /// Decode `bytes` (see [`decode_source`]) and format the result
    pub fn format_bytes(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<String, FormatError> {
        if bytes.len() > self.validator.max_input_bytes() {
            return Err(FormatError::InvalidInput(format!(
                "source HTML is {} bytes, exceeding the limit of {} bytes",
                bytes.len(),
                self.validator.max_input_bytes()
            )));
        }
        let source = decode_source(bytes, content_type)?;
        self.format(&source)
    }

    fn run(&self, source: &str) -> String {
        let mut html = source.to_string();

        for step in self.steps() {
            let before = html.len();
            let next = match step.apply(&html, &self.options) {
                Cow::Borrowed(_) => None,
                Cow::Owned(next) => Some(next),
            };
            match next {
                Some(next) => {
                    log::debug!("{}: {} -> {} bytes", step.name(), before, next.len());
                    html = next;
                }
                None => log::debug!("{}: unchanged", step.name()),
            }
        }

        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_order() {
        let names: Vec<_> = PipelineStep::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "height-strip",
                "table-normalize",
                "preheader-inject",
                "balance-text-inject",
                "image-enhance",
                "image-only-cell-collapse",
                "colspan-clean",
                "column-wrap",
                "link-utm-tag",
                "whitespace-tidy",
                "background-propagate",
                "document-wrap",
            ]
        );
    }

    #[test]
    fn test_column_wrap_is_opt_in() {
        let default = EmailFormatter::default();
        assert!(!default.steps().any(|s| s == PipelineStep::WrapColumns));
        assert_eq!(default.steps().count(), 11);

        let wrapping = EmailFormatter::new(FormatOptions::default().wrap_columns(true));
        assert!(wrapping.steps().any(|s| s == PipelineStep::WrapColumns));
    }

    #[test]
    fn test_validation_runs_first() {
        let err = EmailFormatter::default().format("  \n ").unwrap_err();
        assert!(matches!(err, FormatError::InvalidInput(_)));

        let options = FormatOptions::default().with_image_base_url("not a url");
        let err = EmailFormatter::new(options).format("<p>x</p>").unwrap_err();
        assert_eq!(err.field(), Some("image_base_url"));
    }

    #[test]
    fn test_height_stripped_before_normalization() {
        let html = EmailFormatter::default()
            .format(r#"<table height="400"><tr><td>x</td></tr></table>"#)
            .unwrap();
        assert!(!html.contains("height=\"400\""));
        assert!(html.contains(r#"width="600""#));
    }

    #[test]
    fn test_format_bytes_decodes_and_checks_size() {
        let formatter = EmailFormatter::default();
        let html = formatter
            .format_bytes(b"<p>caf\xe9</p>", Some("text/html; charset=iso-8859-1"))
            .unwrap();
        assert!(html.contains("<p>café</p>"));

        let small = EmailFormatter::default().with_validator(InputValidator::with_max_input_bytes(4));
        let err = small.format_bytes(b"<p>x</p>", None).unwrap_err();
        assert_eq!(err.code(), 5);
    }
}
