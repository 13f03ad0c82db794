//! Screen geometry of the rendered grid, used to map mouse positions back to
//! headers, resize handles and body lines.

use crate::domain::GridOptions;

/// Cells reserved at the left of every line for the selection marker.
pub const MARKER_WIDTH: u16 = 4;
/// Blank cells between adjacent columns. The cell right after a column is
/// its resize handle.
pub const COLUMN_SPACING: u16 = 1;
/// Rows taken by the table border and header.
pub const GRID_CHROME: u16 = 3;

/// Horizontal extent of one rendered header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSpan {
    pub key: String,
    /// Position of the column in display order
    pub index: usize,
    pub start: u16,
    pub width: u16,
}

impl HeaderSpan {
    /// First cell after the column, which acts as its resize handle.
    pub fn end(&self) -> u16 {
        self.start.saturating_add(self.width)
    }
}

/// What a pointer position on the header row refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderHit<'a> {
    Label(&'a HeaderSpan),
    Border(&'a HeaderSpan),
}

/// Where the last frame placed the grid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GridGeometry {
    pub header_y: u16,
    pub body_top: u16,
    pub body_height: u16,
    /// First cell of the selection marker column
    pub marker_x: u16,
    pub spans: Vec<HeaderSpan>,
}

impl GridGeometry {
    pub fn hit_header(&self, x: u16, y: u16) -> Option<HeaderHit<'_>> {
        if y != self.header_y {
            return None;
        }
        self.spans.iter().find_map(|span| {
            if x >= span.start && x < span.end() {
                Some(HeaderHit::Label(span))
            } else if x == span.end() {
                Some(HeaderHit::Border(span))
            } else {
                None
            }
        })
    }

    /// Column whose label or handle lies under `x`, on any row.
    pub fn column_at(&self, x: u16) -> Option<&HeaderSpan> {
        self.spans.iter().find(|span| x >= span.start && x <= span.end())
    }

    /// Offset of the body line at `y` from the top of the viewport.
    pub fn body_offset(&self, y: u16) -> Option<usize> {
        if y >= self.body_top && y < self.body_top.saturating_add(self.body_height) {
            Some(usize::from(y - self.body_top))
        } else {
            None
        }
    }

    pub fn is_marker(&self, x: u16) -> bool {
        x >= self.marker_x && x < self.marker_x + MARKER_WIDTH
    }
}

/// Terminal cells used to draw a column `width` units wide.
pub fn cells_for_width(width: u32, pixels_per_cell: u32) -> u16 {
    let cells = width / pixels_per_cell.max(1);
    cells.clamp(1, u32::from(u16::MAX)) as u16
}

/// Lays out columns left to right from `origin_x`, stopping at the first
/// one that would not fit into `available` cells.
///
/// A first column wider than the whole area is truncated rather than
/// dropped.
pub fn layout_headers(columns: &[(usize, &str, u16)], origin_x: u16, available: u16) -> Vec<HeaderSpan> {
    let mut spans = Vec::new();
    let mut used: u16 = 0;

    for &(index, key, width) in columns {
        let needed = width.saturating_add(COLUMN_SPACING);
        if used.saturating_add(needed) > available {
            if spans.is_empty() && available > COLUMN_SPACING {
                spans.push(HeaderSpan {
                    key: key.to_string(),
                    index,
                    start: origin_x,
                    width: available - COLUMN_SPACING,
                });
            }
            break;
        }
        spans.push(HeaderSpan {
            key: key.to_string(),
            index,
            start: origin_x + used,
            width,
        });
        used += needed;
    }
    spans
}

/// Total height of the bordered grid, honouring the body height bounds.
pub fn grid_height(options: &GridOptions, available: u16) -> u16 {
    let mut body = available.saturating_sub(GRID_CHROME);
    if let Some(max) = options.max_height {
        body = body.min(max);
    }
    if let Some(min) = options.min_height {
        body = body.max(min);
    }
    body.saturating_add(GRID_CHROME).min(available)
}
