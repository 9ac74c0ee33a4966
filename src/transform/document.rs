//! Document wrapper
//!
//! Guarantees the output is one complete email document: it opens with a
//! doctype and holds exactly one `<html>`, `<head>` and `<body>`. An input
//! already shaped like that only has its `<body>` tag fixed up (and a head
//! added when it has none). Anything else, including a document preceded by
//! a comment or carrying a second `<body>`, is unwrapped down to its body
//! content and placed in a fresh XHTML transitional shell with Office
//! namespaces and the usual client-compatibility head.

use regex::Regex;
use std::borrow::Cow;
use std::ops::Range;
use std::sync::OnceLock;

use crate::options::FormatOptions;
use crate::scanner::{find_closing, render_tag, scan, scan_tags, Attributes, Tag, TagKind, Token};
use crate::style::{MergeMode, StyleBlock};
use crate::text::{escape_text, splice, Edit};
use crate::transform::background::resolve_background;

/// Style every email `<body>` carries
pub const BODY_CSS: &str =
    "margin:0; padding:0; width:100%; -webkit-text-size-adjust:100%; -ms-text-size-adjust:100%;";

const DOCTYPE: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">"#;

const HTML_OPEN: &str = r#"<html xmlns="http://www.w3.org/1999/xhtml" xmlns:v="urn:schemas-microsoft-com:vml" xmlns:o="urn:schemas-microsoft-com:office:office" lang="en">"#;

const META_TAGS: &str = r#"<meta http-equiv="Content-Type" content="text/html; charset=UTF-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<meta http-equiv="X-UA-Compatible" content="IE=edge" />
<meta name="x-apple-disable-message-reformatting" />
<meta name="format-detection" content="telephone=no, date=no, address=no, email=no" />"#;

const OFFICE_SETTINGS: &str = r#"<!--[if mso]>
<xml>
<o:OfficeDocumentSettings>
<o:AllowPNG/>
<o:PixelsPerInch>96</o:PixelsPerInch>
</o:OfficeDocumentSettings>
</xml>
<![endif]-->"#;

const BASELINE_STYLE: &str = "body, table, td, a { -webkit-text-size-adjust:100%; -ms-text-size-adjust:100%; }
table, td { mso-table-lspace:0pt; mso-table-rspace:0pt; }
img { -ms-interpolation-mode:bicubic; border:0; outline:none; text-decoration:none; }
body { margin:0 !important; padding:0 !important; width:100% !important; }";

pub const DEFAULT_TITLE: &str = "Email";

/// Document structure tags dropped from extracted content
const SHELL_TAGS: &[&str] = &["html", "head", "body"];

fn prolog_regex() -> Option<&'static Regex> {
    static PROLOG: OnceLock<Option<Regex>> = OnceLock::new();
    PROLOG
        .get_or_init(|| Regex::new(r"(?i)<!doctype[^>]*>|<\?xml[^>]*\?>").ok())
        .as_ref()
}

/// End offset of the doctype opening `html`, ignoring whitespace before it
fn leading_doctype(html: &str) -> Option<usize> {
    let start = html.len() - html.trim_start().len();
    let found = prolog_regex()?.find_at(html, start)?;
    (found.start() == start && found.as_str().starts_with("<!")).then_some(found.end())
}

fn count_starts(tags: &[Tag<'_>], name: &str) -> usize {
    tags.iter().filter(|t| t.is_start(name)).count()
}

/// Make sure the output is a complete document
///
/// Input that already opens with a doctype and has exactly one `<html>`,
/// at most one `<head>` and exactly one `<body>` is kept as it is: leading
/// whitespace is dropped, a minimal head is added when missing and the body
/// tag is fixed up. Everything else is rebuilt around its body content.
pub fn wrap_document<'a>(html: &'a str, options: &FormatOptions) -> Cow<'a, str> {
    let tags = scan_tags(html);

    if let Some(doctype_end) = leading_doctype(html)
        && count_starts(&tags, "html") == 1
        && count_starts(&tags, "head") <= 1
        && count_starts(&tags, "body") == 1
        && let Some(html_tag) = tags.iter().find(|t| t.is_start("html"))
        && let Some(body_tag) = tags.iter().find(|t| t.is_start("body"))
        && doctype_end <= html_tag.span.start
        && html_tag.span.end <= body_tag.span.start
    {
        log::debug!("complete document, fixing up <body> only");
        let mut edits = Vec::new();
        let leading = html.len() - html.trim_start().len();
        if leading > 0 {
            edits.push(Edit::replace(0..leading, ""));
        }
        if count_starts(&tags, "head") == 0 {
            edits.push(Edit::insert(html_tag.span.end, minimal_head(options)));
        }
        let attributes = body_tag.attributes();
        let updated = body_attributes(&attributes);
        if updated != attributes {
            edits.push(Edit::replace(body_tag.span.clone(), body_tag.render(&updated)));
        }
        return splice(html, edits);
    }

    let extracted = extract(html, &tags);
    log::debug!(
        "building document shell around {} byte(s) of content, {} carried style block(s)",
        extracted.content.len(),
        extracted.styles.len()
    );
    Cow::Owned(build_shell(&extracted, options))
}

fn minimal_head(options: &FormatOptions) -> String {
    let title = escape_text(options.title().unwrap_or(DEFAULT_TITLE));
    format!("\n<head>\n{META_TAGS}\n<title>{title}</title>\n</head>")
}

/// Body attributes with the email body style and a `bgcolor`
///
/// Author attributes are kept; the body style overrides same-named
/// declarations. `bgcolor` is derived from the background style when absent.
pub fn body_attributes(attributes: &Attributes) -> Attributes {
    let mut updated = attributes.clone();
    let author = attributes.style();

    if !attributes.contains("bgcolor")
        && let Some(color) = resolve_background(&author)
    {
        updated.set("bgcolor", color);
    }

    let style = author.merged_with(&StyleBlock::parse(BODY_CSS), MergeMode::Override);
    updated.set_style(&style);
    updated
}

/// Pieces of an incomplete document that survive into the new shell
#[derive(Debug)]
struct Extracted<'a> {
    content: String,
    styles: Vec<&'a str>,
    body: Attributes,
}

fn extract<'a>(html: &'a str, tags: &[Tag<'a>]) -> Extracted<'a> {
    let mut removals: Vec<Range<usize>> = Vec::new();
    let mut styles = Vec::new();

    let heads = tags
        .iter()
        .enumerate()
        .filter(|(_, t)| t.name == "head" && t.kind == TagKind::Open)
        .map(|(h, _)| h);
    for h in heads {
        let Some(head_close) = find_closing(tags, h) else {
            continue;
        };
        let mut i = h + 1;
        while i < head_close {
            if tags[i].name == "style" && tags[i].kind == TagKind::Open
                && let Some(end) = find_closing(tags, i).filter(|&end| end < head_close)
            {
                styles.push(&html[tags[i].span.start..tags[end].span.end]);
                i = end + 1;
                continue;
            }
            i += 1;
        }
        removals.push(tags[h].span.start..tags[head_close].span.end);
    }

    // Every body's content is kept, up to the last `</body>`
    let body = tags.iter().position(|t| t.is_start("body"));
    let keep = match body {
        Some(b) => {
            let end = tags[b..]
                .iter()
                .rev()
                .find(|t| t.is_end("body"))
                .or_else(|| tags[b..].iter().rev().find(|t| t.is_end("html")))
                .map_or(html.len(), |t| t.span.start);
            tags[b].span.end..end.max(tags[b].span.end)
        }
        None => 0..html.len(),
    };

    removals.extend(
        tags.iter()
            .filter(|t| SHELL_TAGS.contains(&t.name.as_str()))
            .map(|t| t.span.clone()),
    );
    if let Some(re) = prolog_regex() {
        let comments: Vec<Range<usize>> = scan(html)
            .into_iter()
            .filter_map(|token| match token {
                Token::Comment(range) => Some(range),
                Token::Tag(_) => None,
            })
            .collect();
        removals.extend(
            re.find_iter(html)
                .map(|m| m.range())
                .filter(|m| !comments.iter().any(|c| c.start <= m.start && m.end <= c.end)),
        );
    }

    Extracted {
        content: cut(html, keep, removals).trim().to_string(),
        styles,
        body: body.map(|b| tags[b].attributes()).unwrap_or_default(),
    }
}

/// Text of `keep` with every removal range left out
fn cut(html: &str, keep: Range<usize>, mut removals: Vec<Range<usize>>) -> String {
    removals.sort_by_key(|r| r.start);
    let mut out = String::with_capacity(keep.len());
    let mut cursor = keep.start;

    for removal in removals {
        let start = removal.start.clamp(keep.start, keep.end);
        let end = removal.end.clamp(keep.start, keep.end);
        if end <= cursor {
            continue;
        }
        if start > cursor {
            out.push_str(&html[cursor..start]);
        }
        cursor = end;
    }
    if cursor < keep.end {
        out.push_str(&html[cursor..keep.end]);
    }
    out
}

fn build_shell(extracted: &Extracted<'_>, options: &FormatOptions) -> String {
    let title = escape_text(options.title().unwrap_or(DEFAULT_TITLE));
    let body = render_tag("body", &body_attributes(&extracted.body), false);

    let mut style = String::from(BASELINE_STYLE);
    if options.responsive {
        style.push_str(&format!(
            "\n@media only screen and (max-width:{}px) {{ table[role=presentation] {{ width:100% !important; }} }}",
            options.target_width.pixels()
        ));
    }

    let mut out = String::with_capacity(extracted.content.len() + 2048);
    out.push_str(DOCTYPE);
    out.push('\n');
    out.push_str(HTML_OPEN);
    out.push_str("\n<head>\n");
    out.push_str(META_TAGS);
    out.push_str(&format!("\n<title>{title}</title>\n"));
    out.push_str(OFFICE_SETTINGS);
    out.push_str(&format!("\n<style type=\"text/css\">\n{style}\n</style>\n"));
    for carried in &extracted.styles {
        out.push_str(carried);
        out.push('\n');
    }
    out.push_str("</head>\n");
    out.push_str(&body);
    out.push('\n');
    out.push_str(&extracted.content);
    out.push_str("\n</body>\n</html>\n");
    out
}
