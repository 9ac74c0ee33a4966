//! Multi-column row wrapping
//!
//! Sliced layouts often mix full-width rows (one cell) with rows split into
//! several cells. Without colspans Outlook squeezes the single-cell rows into
//! the first column. When enabled, each multi-cell row of such a mixed table
//! is rewritten so its cells live in a nested presentation table inside a
//! single cell:
//!
//! ```html
//! <tr><td>{nested table}<tr><td>A</td><td>B</td></tr></table></td></tr>
//! ```
//!
//! Any row whose cells carry a `colspan` is left alone: the author already
//! took care of the layout.

use std::borrow::Cow;
use std::ops::Range;

use crate::options::FormatOptions;
use crate::scanner::{find_closing, scan_tags, Tag, TagKind};
use crate::text::{splice, Edit};
use crate::transform::table::presentation_table_tag;

/// A direct row of a table
#[derive(Debug)]
struct Row {
    /// Span from the first cell's `<td>` to the last cell's `</td>`
    cells: Option<Range<usize>>,
    cell_count: usize,
    has_colspan: bool,
    complete: bool,
}

/// Wrap multi-cell rows of tables that also have single-cell rows
pub fn wrap_multi_column_rows<'a>(html: &'a str, options: &FormatOptions) -> Cow<'a, str> {
    let tags = scan_tags(html);
    let table_open = presentation_table_tag(options);
    let mut edits = Vec::new();

    for (t, tag) in tags.iter().enumerate() {
        if tag.name != "table" || tag.kind != TagKind::Open {
            continue;
        }
        let Some(close) = find_closing(&tags, t) else {
            continue;
        };

        let rows = direct_rows(&tags, t + 1, close);
        let single = rows.iter().any(|r| r.complete && r.cell_count == 1);
        if !single {
            continue;
        }

        for row in rows {
            if row.cell_count < 2 || !row.complete || row.has_colspan {
                continue;
            }
            let Some(cells) = row.cells else {
                continue;
            };
            let wrapped = format!(
                "<td>{}<tr>{}</tr></table></td>",
                table_open,
                &html[cells.clone()]
            );
            edits.push(Edit::replace(cells, wrapped));
        }
    }

    if !edits.is_empty() {
        log::debug!("wrapping {} multi-column row(s)", edits.len());
    }
    splice(html, edits)
}

/// Rows between `from` and `to` (tag indices) that belong to this table,
/// skipping rows of nested tables
fn direct_rows(tags: &[Tag<'_>], from: usize, to: usize) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut depth = 0usize;
    let mut i = from;

    while i < to {
        let tag = &tags[i];
        match (tag.name.as_str(), tag.kind) {
            ("table", TagKind::Open) => depth += 1,
            ("table", TagKind::Close) => depth = depth.saturating_sub(1),
            ("tr", TagKind::Open) if depth == 0 => {
                let Some(end) = find_closing(tags, i).filter(|&end| end < to) else {
                    rows.push(Row {
                        cells: None,
                        cell_count: 0,
                        has_colspan: false,
                        complete: false,
                    });
                    i += 1;
                    continue;
                };
                rows.push(row_cells(tags, i + 1, end));
                i = end + 1;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    rows
}

fn row_cells(tags: &[Tag<'_>], from: usize, to: usize) -> Row {
    let mut row = Row {
        cells: None,
        cell_count: 0,
        has_colspan: false,
        complete: true,
    };
    let mut i = from;

    while i < to {
        let tag = &tags[i];
        let is_cell = tag.name == "td" || tag.name == "th";
        if is_cell && tag.kind == TagKind::Open {
            let Some(end) = find_closing(tags, i).filter(|&end| end < to) else {
                row.complete = false;
                return row;
            };
            row.cell_count += 1;
            row.has_colspan |= tag.attributes().contains("colspan");
            let start = row.cells.as_ref().map_or(tag.span.start, |r| r.start);
            row.cells = Some(start..tags[end].span.end);
            i = end + 1;
            continue;
        }
        i += 1;
    }
    row
}
