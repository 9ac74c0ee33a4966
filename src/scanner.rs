//! Tolerant tag scanner
//!
//! Email exports are routinely malformed, so the transformers never build a
//! tree. Instead this module finds tag boundaries and attribute lists and
//! leaves everything else alone:
//!
//! - Comments, including MSO conditional comments (`<!--[if mso]>...<![endif]-->`),
//!   are scanned as opaque tokens; tags inside them are never reported.
//! - A tag with an unterminated quote simply does not match and passes through.
//! - Nesting is not validated; [`find_closing`] counts depth on demand.
//!
//! Matching uses the `regex` crate, whose automata run in linear time, so
//! pathological input cannot trigger catastrophic backtracking.
//!
//! # Examples
//!
//! ```rust
//! use email_html_formatter::scanner::{scan_tags, TagKind};
//!
//! let html = r#"<!--[if mso]><table><![endif]--><table width="600"><tr></tr></table>"#;
//! let tags = scan_tags(html);
//!
//! assert_eq!(tags.len(), 4);
//! assert_eq!(tags[0].name, "table");
//! assert_eq!(tags[0].kind, TagKind::Open);
//! assert_eq!(tags[0].attributes().get("width"), Some("600"));
//! ```

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

use crate::style::StyleBlock;

/// Comment or tag; the alternation order makes comments swallow their contents
const TOKEN_PATTERN: &str =
    r#"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9:_-]*)(\s(?:[^>"']|"[^"]*"|'[^']*')*|/)?>"#;

/// Attribute name with an optional double-, single- or unquoted value
const ATTRIBUTE_PATTERN: &str =
    r#"([^\s"'=<>/]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#;

/// Namespace prefixes of Office/VML markup that passes through untouched
const VENDOR_PREFIXES: &[&str] = &["v:", "o:", "w:"];

fn token_regex() -> Option<&'static Regex> {
    static TOKEN_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    TOKEN_REGEX
        .get_or_init(|| Regex::new(TOKEN_PATTERN).ok())
        .as_ref()
}

fn attribute_regex() -> Option<&'static Regex> {
    static ATTRIBUTE_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    ATTRIBUTE_REGEX
        .get_or_init(|| Regex::new(ATTRIBUTE_PATTERN).ok())
        .as_ref()
}

/// Open, close or self-closing tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Open,
    Close,
    SelfClosing,
}

/// One scanned tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    /// Lower-cased element name (`v:roundrect` keeps its prefix)
    pub name: String,
    pub kind: TagKind,
    /// Byte span of the whole tag, `<` through `>`
    pub span: Range<usize>,
    raw_attributes: &'a str,
}

impl<'a> Tag<'a> {
    /// Opening (or self-closing) tag named `name`
    pub fn is_start(&self, name: &str) -> bool {
        self.kind != TagKind::Close && self.name == name
    }

    /// Closing tag named `name`
    pub fn is_end(&self, name: &str) -> bool {
        self.kind == TagKind::Close && self.name == name
    }

    /// Parse the attribute list
    pub fn attributes(&self) -> Attributes {
        Attributes::parse(self.raw_attributes)
    }

    /// Render this tag with a new attribute list, keeping its name and kind
    pub fn render(&self, attributes: &Attributes) -> String {
        render_tag(&self.name, attributes, self.kind == TagKind::SelfClosing)
    }
}

/// Scanned token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Comment(Range<usize>),
    Tag(Tag<'a>),
}

/// Scan comments and tags in document order
pub fn scan(html: &str) -> Vec<Token<'_>> {
    let Some(regex) = token_regex() else {
        return Vec::new();
    };

    regex
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let Some(name) = caps.get(2) else {
                return Some(Token::Comment(whole.range()));
            };

            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let raw = caps.get(3).map_or("", |m| m.as_str());
            let trimmed = raw.trim_end();
            let (raw_attributes, self_closing) = match trimmed.strip_suffix('/') {
                Some(rest) => (rest, true),
                None => (raw, false),
            };

            let kind = if closing {
                TagKind::Close
            } else if self_closing {
                TagKind::SelfClosing
            } else {
                TagKind::Open
            };

            Some(Token::Tag(Tag {
                name: name.as_str().to_ascii_lowercase(),
                kind,
                span: whole.range(),
                raw_attributes,
            }))
        })
        .collect()
}

/// Scan tags only, skipping comments
pub fn scan_tags(html: &str) -> Vec<Tag<'_>> {
    scan(html)
        .into_iter()
        .filter_map(|token| match token {
            Token::Tag(tag) => Some(tag),
            Token::Comment(_) => None,
        })
        .collect()
}

/// Index of the tag closing `tags[open]`, counting nested tags of the same name
pub fn find_closing(tags: &[Tag<'_>], open: usize) -> Option<usize> {
    let name = tags.get(open)?.name.as_str();
    let mut depth = 0usize;

    for (i, tag) in tags.iter().enumerate().skip(open + 1) {
        if tag.name != name {
            continue;
        }
        match tag.kind {
            TagKind::Open => depth += 1,
            TagKind::Close if depth == 0 => return Some(i),
            TagKind::Close => depth -= 1,
            TagKind::SelfClosing => {}
        }
    }
    None
}

/// Byte ranges that no whitespace or structural pass may rewrite
///
/// Covers comments (conditional comments included), vendor-prefixed
/// VML/Office elements with their content, and `<pre>` blocks. Returned
/// sorted and non-overlapping.
pub fn protected_ranges(html: &str) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    let mut tags: Vec<Tag<'_>> = Vec::new();
    for token in scan(html) {
        match token {
            Token::Comment(range) => ranges.push(range),
            Token::Tag(tag) => tags.push(tag),
        }
    }

    let mut i = 0;
    while i < tags.len() {
        let tag = &tags[i];
        let guarded = tag.name == "pre"
            || VENDOR_PREFIXES.iter().any(|p| tag.name.starts_with(p));

        if guarded && tag.kind == TagKind::Open {
            match find_closing(&tags, i) {
                Some(j) => {
                    ranges.push(tag.span.start..tags[j].span.end);
                    i = j + 1;
                    continue;
                }
                None => ranges.push(tag.span.clone()),
            }
        } else if guarded {
            ranges.push(tag.span.clone());
        }
        i += 1;
    }

    ranges.sort_by_key(|r| r.start);
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

/// One attribute; `value` is `None` for bare attributes like `nowrap`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Raw value text; entities are not decoded
    pub value: Option<String>,
}

/// Ordered attribute list of a tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    items: Vec<Attribute>,
}

impl Attributes {
    pub fn parse(raw: &str) -> Self {
        let Some(regex) = attribute_regex() else {
            return Self::default();
        };

        let items = regex
            .captures_iter(raw)
            .filter_map(|caps| {
                let name = caps.get(1)?.as_str().to_string();
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .or_else(|| caps.get(4))
                    .map(|m| m.as_str().to_string());
                Some(Attribute { name, value })
            })
            .collect();

        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.items.iter()
    }

    /// Value of the first attribute named `name` (case-insensitive)
    ///
    /// Bare attributes yield `Some("")`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set `name` exactly once
    ///
    /// The first occurrence is updated in place and later duplicates are
    /// dropped; a missing attribute is appended.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = Some(value.into());
        match self
            .items
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(first) => {
                self.items[first].value = value;
                let mut seen = 0;
                self.items.retain(|a| {
                    if a.name.eq_ignore_ascii_case(name) {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.items.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Remove every attribute named `name`
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|a| !a.name.eq_ignore_ascii_case(name));
        before != self.items.len()
    }

    pub fn push(&mut self, attribute: Attribute) {
        self.items.push(attribute);
    }

    /// Inline style as a structured block; empty when absent or blank
    pub fn style(&self) -> StyleBlock {
        self.get("style").map(StyleBlock::parse).unwrap_or_default()
    }

    /// Replace the `style` attribute; an empty block removes it
    pub fn set_style(&mut self, style: &StyleBlock) {
        if style.is_empty() {
            self.remove("style");
        } else {
            self.set("style", style.to_string());
        }
    }

    /// Serialize with a leading space before each attribute
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for attr in &self.items {
            out.push(' ');
            out.push_str(&attr.name);
            if let Some(value) = &attr.value {
                if value.contains('"') && !value.contains('\'') {
                    out.push_str("='");
                    out.push_str(value);
                    out.push('\'');
                } else {
                    out.push_str("=\"");
                    out.push_str(&value.replace('"', "&quot;"));
                    out.push('"');
                }
            }
        }
        out
    }
}

/// Render an opening tag
pub fn render_tag(name: &str, attributes: &Attributes, self_closing: bool) -> String {
    let slash = if self_closing { " /" } else { "" };
    format!("<{}{}{}>", name, attributes.to_html(), slash)
}
