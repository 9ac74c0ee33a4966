//! Preheader and balance-text injection
//!
//! Both blocks are table rows holding a single invisible `<div>`. The
//! preheader goes right after the first `<table>` opening tag so mail clients
//! pick it up as the inbox snippet; the balance text goes after the first
//! `</tr>` (which is the preheader row when one was injected).
//!
//! Pre-existing hidden rows are not detected; running the injection on a
//! document that already has a preheader adds a second one.

use std::borrow::Cow;

use crate::scanner::{scan_tags, TagKind};
use crate::text::{escape_text, splice, Edit};

/// Style hiding a block in every major mail client
pub const HIDDEN_BLOCK_CSS: &str = "display:none !important; font-size:1px; line-height:1px; max-height:0; max-width:0; opacity:0; overflow:hidden; mso-hide:all; visibility:hidden;";

/// Hidden row carrying `text`
pub fn hidden_row(text: &str) -> String {
    format!(
        "<tr><td><div style=\"{}\">{}</div></td></tr>",
        HIDDEN_BLOCK_CSS,
        escape_text(text)
    )
}

/// Insert the preheader after the first `<table>` opening tag
pub fn inject_preheader<'a>(html: &'a str, text: Option<&str>) -> Cow<'a, str> {
    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return Cow::Borrowed(html);
    };

    match first_table_end(html) {
        Some(at) => splice(html, vec![Edit::insert(at, hidden_row(text.trim()))]),
        None => {
            log::warn!("preheader skipped: document has no <table>");
            Cow::Borrowed(html)
        }
    }
}

/// Insert the balance text after the first `</tr>`, else after the first `<table>`
pub fn inject_balance_text<'a>(html: &'a str, text: Option<&str>) -> Cow<'a, str> {
    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return Cow::Borrowed(html);
    };

    let after_row = scan_tags(html)
        .iter()
        .find(|tag| tag.is_end("tr"))
        .map(|tag| tag.span.end);

    match after_row.or_else(|| first_table_end(html)) {
        Some(at) => splice(html, vec![Edit::insert(at, hidden_row(text.trim()))]),
        None => {
            log::warn!("balance text skipped: document has no <table>");
            Cow::Borrowed(html)
        }
    }
}

fn first_table_end(html: &str) -> Option<usize> {
    scan_tags(html)
        .iter()
        .find(|tag| tag.name == "table" && tag.kind == TagKind::Open)
        .map(|tag| tag.span.end)
}
