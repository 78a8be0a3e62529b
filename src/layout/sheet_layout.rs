//! Pre-computed extents for a sheet.
//!
//! Column and row edges are accumulated once per sheet so any span's
//! page-local rectangle is two subtractions per axis.

use serde::{Deserialize, Serialize};

use crate::types::PageTile;

/// Cumulative edge positions for a sheet
#[derive(Clone, Debug)]
pub struct SheetLayout {
    /// Cumulative column positions (`col_positions[i]` = x of column i's left edge)
    pub col_positions: Vec<f32>,
    /// Cumulative row positions (`row_positions[i]` = y of row i's top edge)
    pub row_positions: Vec<f32>,
}

/// Rectangle in page coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellRect {
    /// X position (left edge)
    pub x: f32,
    /// Y position (top edge)
    pub y: f32,
    /// Width of the cell
    pub width: f32,
    /// Height of the cell
    pub height: f32,
}

impl CellRect {
    /// True when the rectangle has no drawable area.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

impl SheetLayout {
    /// Accumulate edges from raw extents.
    pub fn new(col_widths: &[f32], row_heights: &[f32]) -> Self {
        SheetLayout {
            col_positions: edges(col_widths),
            row_positions: edges(row_heights),
        }
    }

    /// X of column `col`'s left edge; indices past the end clamp to the last edge.
    pub fn col_x(&self, col: u32) -> f32 {
        edge_at(&self.col_positions, col)
    }

    /// Y of row `row`'s top edge; indices past the end clamp to the last edge.
    pub fn row_y(&self, row: u32) -> f32 {
        edge_at(&self.row_positions, row)
    }

    /// Rectangle of a span relative to a tile whose content box starts at `origin`.
    pub fn span_rect(
        &self,
        tile: &PageTile,
        origin: (f32, f32),
        (row, col): (u32, u32),
        (row_span, col_span): (u32, u32),
    ) -> CellRect {
        let x = self.col_x(col);
        let y = self.row_y(row);
        CellRect {
            x: origin.0 + x - self.col_x(tile.start_col),
            y: origin.1 + y - self.row_y(tile.start_row),
            width: self.col_x(col.saturating_add(col_span)) - x,
            height: self.row_y(row.saturating_add(row_span)) - y,
        }
    }
}

fn edges(extents: &[f32]) -> Vec<f32> {
    let mut positions = Vec::with_capacity(extents.len() + 1);
    let mut pos: f32 = 0.0;
    for extent in extents {
        positions.push(pos);
        pos += extent;
    }
    positions.push(pos); // Final edge
    positions
}

fn edge_at(positions: &[f32], idx: u32) -> f32 {
    positions
        .get(idx as usize)
        .or_else(|| positions.last())
        .copied()
        .unwrap_or(0.0)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn tile(start_row: u32, start_col: u32) -> PageTile {
        PageTile {
            page_index: 0,
            start_row,
            row_count: 10,
            start_col,
            col_count: 10,
        }
    }

    #[test]
    fn test_basic_layout() {
        let layout = SheetLayout::new(&[64.0; 6], &[20.0; 11]);
        assert_eq!(layout.col_positions.len(), 7);
        assert_eq!(layout.col_x(6), 64.0 * 6.0);
        assert_eq!(layout.row_y(11), 20.0 * 11.0);
        // Past the end clamps to the far edge
        assert_eq!(layout.row_y(40), 20.0 * 11.0);
    }

    #[test]
    fn test_span_rect_from_sheet_origin() {
        let layout = SheetLayout::new(&[10.0, 20.0, 30.0], &[5.0, 15.0]);
        let rect = layout.span_rect(&tile(0, 0), (0.0, 0.0), (1, 1), (1, 1));
        assert_eq!(
            rect,
            CellRect {
                x: 10.0,
                y: 5.0,
                width: 20.0,
                height: 15.0
            }
        );
    }

    #[test]
    fn test_span_rect_is_page_local() {
        let layout = SheetLayout::new(&[10.0, 20.0, 30.0], &[5.0, 15.0, 25.0]);
        // Tile starts at row 1, column 1; content box at (7, 3)
        let rect = layout.span_rect(&tile(1, 1), (7.0, 3.0), (1, 1), (2, 2));
        assert_eq!(
            rect,
            CellRect {
                x: 7.0,
                y: 3.0,
                width: 50.0,
                height: 40.0
            }
        );
    }

    #[test]
    fn test_hidden_extent_is_degenerate() {
        let layout = SheetLayout::new(&[10.0, 0.0], &[5.0]);
        let rect = layout.span_rect(&tile(0, 0), (0.0, 0.0), (0, 1), (1, 1));
        assert!(rect.is_degenerate());
        let rect = layout.span_rect(&tile(0, 0), (0.0, 0.0), (0, 0), (1, 2));
        assert!(!rect.is_degenerate());
    }

    #[test]
    fn test_span_past_end_clamps() {
        let layout = SheetLayout::new(&[10.0, 10.0], &[5.0]);
        let rect = layout.span_rect(&tile(0, 0), (0.0, 0.0), (0, 1), (1, 5));
        assert_eq!(rect.width, 10.0);
    }
}
