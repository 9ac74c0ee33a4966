//! Outlook background propagation
//!
//! Outlook's Word renderer ignores CSS backgrounds on table cells but honours
//! the legacy `bgcolor` attribute. Every `<td>` with a resolvable CSS
//! background color and no `bgcolor` gets one.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

use crate::style::StyleBlock;
use crate::transform::rewrite_start_tags;

/// Bare words of the `background` shorthand that are not colors
const NON_COLOR_KEYWORDS: &[&str] = &[
    "transparent",
    "none",
    "inherit",
    "initial",
    "unset",
    "revert",
    "currentcolor",
    "url",
    "repeat",
    "no-repeat",
    "repeat-x",
    "repeat-y",
    "space",
    "round",
    "center",
    "top",
    "bottom",
    "left",
    "right",
    "cover",
    "contain",
    "auto",
    "fixed",
    "scroll",
    "local",
    "border-box",
    "padding-box",
    "content-box",
];

fn hex_regex() -> Option<&'static Regex> {
    static HEX: OnceLock<Option<Regex>> = OnceLock::new();
    HEX.get_or_init(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").ok())
        .as_ref()
}

fn rgb_regex() -> Option<&'static Regex> {
    static RGB: OnceLock<Option<Regex>> = OnceLock::new();
    RGB.get_or_init(|| {
        Regex::new(
            r"(?i)^rgba?\(\s*(\d{1,3})\s*[,\s]\s*(\d{1,3})\s*[,\s]\s*(\d{1,3})\s*(?:[,/]\s*[\d.]+%?\s*)?\)$",
        )
        .ok()
    })
    .as_ref()
}

/// Split a CSS value on whitespace, keeping parenthesised groups together
fn value_tokens(value: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;

    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    tokens.push(&value[s..i]);
                }
                continue;
            }
            _ => {}
        }
        if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(&value[s..]);
    }
    tokens
}

/// Resolve one token to a color usable as `bgcolor`
///
/// # Examples
///
/// ```rust
/// use email_html_formatter::transform::background::resolve_color;
///
/// assert_eq!(resolve_color("#FFF").as_deref(), Some("#fff"));
/// assert_eq!(resolve_color("rgb(255, 0, 16)").as_deref(), Some("#ff0010"));
/// assert_eq!(resolve_color("Teal").as_deref(), Some("teal"));
/// assert_eq!(resolve_color("transparent"), None);
/// ```
pub fn resolve_color(token: &str) -> Option<String> {
    let token = token.trim();

    if hex_regex().is_some_and(|re| re.is_match(token)) {
        return Some(token.to_ascii_lowercase());
    }

    if let Some(captures) = rgb_regex().and_then(|re| re.captures(token)) {
        let mut hex = String::from("#");
        for group in 1..=3 {
            let channel: u32 = captures.get(group)?.as_str().parse().ok()?;
            hex.push_str(&format!("{:02x}", channel.min(255)));
        }
        return Some(hex);
    }

    let lower = token.to_ascii_lowercase();
    let is_word = !lower.is_empty() && lower.chars().all(|c| c.is_ascii_alphabetic());
    (is_word && !NON_COLOR_KEYWORDS.contains(&lower.as_str())).then_some(lower)
}

/// Background color of an inline style
///
/// The cascade decides between `background-color` and the `background`
/// shorthand: an `!important` declaration beats a normal one, otherwise the
/// last one declared wins. In the shorthand the first token that resolves to
/// a color is used; a winning shorthand without a color resolves to `None`.
pub fn resolve_background(style: &StyleBlock) -> Option<String> {
    let candidates: Vec<&str> = style
        .declarations()
        .iter()
        .filter(|d| d.property == "background-color" || d.property == "background")
        .map(|d| d.value.as_str())
        .collect();
    let value = candidates
        .iter()
        .rev()
        .find(|v| v.ends_with("!important"))
        .or_else(|| candidates.last())?;
    let value = value.trim_end_matches("!important").trim();

    value_tokens(value).into_iter().find_map(resolve_color)
}

/// Add `bgcolor` to every `<td>` whose inline background resolves to a color
pub fn propagate_backgrounds(html: &str) -> Cow<'_, str> {
    rewrite_start_tags(html, "td", |_, attributes| {
        if attributes.contains("bgcolor") {
            return None;
        }
        let color = resolve_background(&attributes.style())?;
        let mut updated = attributes.clone();
        updated.set("bgcolor", color);
        Some(updated)
    })
}
