//! Inline style model
//!
//! An inline `style` attribute is held as an ordered list of
//! property/value declarations. Injecting a block is a map operation on that
//! list, so chaining transformers can never double-insert a property the way
//! string-level concatenation would.
//!
//! # Examples
//!
//! ```rust
//! use email_html_formatter::style::{MergeMode, StyleBlock};
//!
//! let author = StyleBlock::parse("color:#333; padding: 4px");
//! let forced = StyleBlock::parse("padding:0; font-size:0;");
//! let merged = author.merged_with(&forced, MergeMode::Override);
//!
//! assert_eq!(merged.to_string(), "padding:0; font-size:0; color:#333;");
//! // Merging again changes nothing
//! assert_eq!(merged.merged_with(&forced, MergeMode::Override), merged);
//! ```

use std::fmt;

/// One `property:value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Lower-cased property name
    pub property: String,
    /// Trimmed value, `!important` included
    pub value: String,
}

/// How an injected block treats properties the author already set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Injected value wins; the author's declaration of that property is dropped
    Override,
    /// Author value wins; injected declaration is only added when absent
    KeepExisting,
}

/// Ordered inline style declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleBlock {
    declarations: Vec<Declaration>,
}

impl StyleBlock {
    /// Parse the text of a `style` attribute
    ///
    /// Semicolons inside parentheses or quotes (`url(data:...;base64,...)`)
    /// do not split declarations. Fragments without a colon are dropped.
    pub fn parse(text: &str) -> Self {
        let declarations = split_declarations(text)
            .into_iter()
            .filter_map(|chunk| {
                let (property, value) = chunk.split_once(':')?;
                let property = property.trim().to_ascii_lowercase();
                let value = value.trim();
                if property.is_empty() || value.is_empty() {
                    return None;
                }
                Some(Declaration {
                    property,
                    value: value.to_string(),
                })
            })
            .collect();

        Self { declarations }
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Value of the last declaration of `property`
    ///
    /// The last one is what the cascade applies.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|d| d.property.eq_ignore_ascii_case(property))
            .map(|d| d.value.as_str())
    }

    pub fn contains(&self, property: &str) -> bool {
        self.get(property).is_some()
    }

    /// Count declarations of `property`
    pub fn count(&self, property: &str) -> usize {
        self.declarations
            .iter()
            .filter(|d| d.property.eq_ignore_ascii_case(property))
            .count()
    }

    /// Remove every declaration of `property`
    pub fn remove(&mut self, property: &str) -> bool {
        let before = self.declarations.len();
        self.declarations
            .retain(|d| !d.property.eq_ignore_ascii_case(property));
        before != self.declarations.len()
    }

    /// Produce a new block with `injected` placed ahead of these declarations
    pub fn merged_with(&self, injected: &StyleBlock, mode: MergeMode) -> StyleBlock {
        let mut declarations: Vec<Declaration> = Vec::with_capacity(
            self.declarations.len() + injected.declarations.len(),
        );

        for decl in &injected.declarations {
            let taken = declarations
                .iter()
                .any(|d| d.property == decl.property);
            let authored = mode == MergeMode::KeepExisting && self.contains(&decl.property);
            if !taken && !authored {
                declarations.push(decl.clone());
            }
        }

        for decl in &self.declarations {
            let overridden =
                mode == MergeMode::Override && injected.contains(&decl.property);
            if !overridden {
                declarations.push(decl.clone());
            }
        }

        StyleBlock { declarations }
    }
}

impl fmt::Display for StyleBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, decl) in self.declarations.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}:{};", decl.property, decl.value)?;
        }
        Ok(())
    }
}

fn split_declarations(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, ch) in text.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                chunks.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    chunks.push(&text[start..]);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_basic() {
        let block = StyleBlock::parse("Color: red ; padding:0;;  margin :  1px 2px");
        assert_eq!(block.declarations().len(), 3);
        assert_eq!(block.get("color"), Some("red"));
        assert_eq!(block.get("MARGIN"), Some("1px 2px"));
    }

    #[test]
    fn test_parse_empty_and_whitespace() {
        assert!(StyleBlock::parse("").is_empty());
        assert!(StyleBlock::parse("   ").is_empty());
        assert!(StyleBlock::parse("garbage").is_empty());
    }

    #[test]
    fn test_parse_keeps_semicolons_inside_url() {
        let block = StyleBlock::parse(
            "background:url('data:image/png;base64,AAA=') no-repeat; color:#fff",
        );
        assert_eq!(block.declarations().len(), 2);
        assert_eq!(
            block.get("background"),
            Some("url('data:image/png;base64,AAA=') no-repeat")
        );
    }

    #[test]
    fn test_important_is_kept() {
        let block = StyleBlock::parse("display:none !important");
        assert_eq!(block.get("display"), Some("none !important"));
    }

    #[test]
    fn test_display_format() {
        let block = StyleBlock::parse("mso-table-lspace:0pt;mso-table-rspace:0pt; border-collapse:collapse");
        assert_eq!(
            block.to_string(),
            "mso-table-lspace:0pt; mso-table-rspace:0pt; border-collapse:collapse;"
        );
    }

    #[test]
    fn test_merge_override_drops_author_duplicate() {
        let author = StyleBlock::parse("border-collapse:separate; color:red");
        let injected = StyleBlock::parse("border-collapse:collapse");
        let merged = author.merged_with(&injected, MergeMode::Override);
        assert_eq!(merged.to_string(), "border-collapse:collapse; color:red;");
        assert_eq!(merged.count("border-collapse"), 1);
    }

    #[test]
    fn test_merge_keep_existing() {
        let author = StyleBlock::parse("margin:10px");
        let injected = StyleBlock::parse("margin:0; padding:0");
        let merged = author.merged_with(&injected, MergeMode::KeepExisting);
        assert_eq!(merged.to_string(), "padding:0; margin:10px;");
    }

    #[test]
    fn test_merge_into_empty() {
        let merged = StyleBlock::default()
            .merged_with(&StyleBlock::parse("padding:0"), MergeMode::Override);
        assert_eq!(merged.to_string(), "padding:0;");
    }

    #[test]
    fn test_remove() {
        let mut block = StyleBlock::parse("max-width:600px; color:red; max-width:650px");
        assert!(block.remove("max-width"));
        assert!(!block.remove("max-width"));
        assert_eq!(block.to_string(), "color:red;");
    }

    proptest! {
        #[test]
        fn prop_override_merge_is_idempotent(
            author in prop::collection::vec(("[a-z]{1,3}", "[a-z0-9]{1,4}"), 0..6),
            injected in prop::collection::vec(("[a-z]{1,3}", "[a-z0-9]{1,4}"), 1..4),
        ) {
            let to_text = |decls: &Vec<(String, String)>| {
                decls.iter().map(|(p, v)| format!("{p}:{v}")).collect::<Vec<_>>().join(";")
            };
            let author = StyleBlock::parse(&to_text(&author));
            let injected = StyleBlock::parse(&to_text(&injected));

            let once = author.merged_with(&injected, MergeMode::Override);
            let twice = StyleBlock::parse(&once.to_string())
                .merged_with(&injected, MergeMode::Override);
            prop_assert_eq!(once.to_string(), twice.to_string());

            for decl in injected.declarations() {
                prop_assert_eq!(once.count(&decl.property), 1);
            }
        }
    }
}
