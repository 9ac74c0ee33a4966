//! Whitespace tidy
//!
//! Collapses runs of spaces and strips trailing whitespace from lines, but
//! only between [`protected_ranges`]: comments, VML/Office elements and
//! `<pre>` blocks come out byte-identical.
//!
//! Everything else is plain text to this pass, so quoted attribute values
//! and the bodies of `<style>` and `<script>` elements are collapsed as well.
//! Steps that need values to stay distinct afterwards (image alts) store them
//! already collapsed.

use regex::Regex;
use std::borrow::Cow;
use std::ops::Range;
use std::sync::OnceLock;

use crate::scanner::protected_ranges;
use crate::text::{splice, Edit};

fn trailing_regex() -> Option<&'static Regex> {
    static TRAILING: OnceLock<Option<Regex>> = OnceLock::new();
    TRAILING
        .get_or_init(|| Regex::new(r"[ \t]+(\r?\n)").ok())
        .as_ref()
}

fn space_run_regex() -> Option<&'static Regex> {
    static SPACE_RUN: OnceLock<Option<Regex>> = OnceLock::new();
    SPACE_RUN.get_or_init(|| Regex::new(r" {2,}").ok()).as_ref()
}

/// Tidy one unprotected segment; `at_end` when it runs to the end of input
fn tidy_segment(segment: &str, at_end: bool) -> Cow<'_, str> {
    let (Some(trailing), Some(space_run)) = (trailing_regex(), space_run_regex()) else {
        return Cow::Borrowed(segment);
    };

    let trimmed = trailing.replace_all(segment, "$1");
    let mut tidy = space_run.replace_all(&trimmed, " ").into_owned();

    if at_end {
        let kept = tidy.trim_end_matches([' ', '\t']).len();
        tidy.truncate(kept);
    }

    if tidy == segment {
        Cow::Borrowed(segment)
    } else {
        Cow::Owned(tidy)
    }
}

/// Collapse space runs and trim trailing line whitespace outside protected markup
pub fn tidy_whitespace(html: &str) -> Cow<'_, str> {
    let mut edits = Vec::new();
    let mut cursor = 0;

    let visit = |range: Range<usize>, edits: &mut Vec<Edit>| {
        if range.is_empty() {
            return;
        }
        let at_end = range.end == html.len();
        if let Cow::Owned(tidy) = tidy_segment(&html[range.clone()], at_end) {
            edits.push(Edit::replace(range, tidy));
        }
    };

    for protected in protected_ranges(html) {
        visit(cursor..protected.start, &mut edits);
        cursor = protected.end;
    }
    visit(cursor..html.len(), &mut edits);

    splice(html, edits)
}
