use serde::{Deserialize, Serialize};

use super::{Cell, CellData, Font, FontRef, PageSetup};

/// A workbook reduced to what pagination needs: its sheets in tab order.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Workbook {
    pub sheets: Vec<SheetGrid>,
}

/// A merged cell range, inclusive on both ends (0-indexed)
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct MergeRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl MergeRange {
    pub fn new(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self {
            start_row,
            start_col,
            end_row,
            end_col,
        }
    }

    /// Number of rows covered (0 for an inverted range).
    #[must_use]
    pub fn row_span(&self) -> u32 {
        if self.end_row < self.start_row {
            0
        } else {
            self.end_row - self.start_row + 1
        }
    }

    /// Number of columns covered (0 for an inverted range).
    #[must_use]
    pub fn col_span(&self) -> u32 {
        if self.end_col < self.start_col {
            0
        } else {
            self.end_col - self.start_col + 1
        }
    }

    #[must_use]
    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.start_row..=self.end_row).contains(&row)
            && (self.start_col..=self.end_col).contains(&col)
    }

    #[must_use]
    pub fn is_anchor(&self, row: u32, col: u32) -> bool {
        row == self.start_row && col == self.start_col
    }
}

/// One sheet's grid: dense rows of optional cells plus extents in points.
///
/// `rows` may be shorter than `row_heights` (and each row shorter than
/// `col_widths`); anything not stored is a blank cell.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SheetGrid {
    pub name: String,
    /// Column widths in points (0 for hidden columns)
    pub col_widths: Vec<f32>,
    /// Row heights in points (0 for hidden rows)
    pub row_heights: Vec<f32>,
    #[serde(default)]
    pub rows: Vec<Vec<Option<Cell>>>,
    #[serde(default)]
    pub merges: Vec<MergeRange>,
    /// Font table referenced by `Cell::font`; empty means every cell uses the default font
    #[serde(default)]
    pub fonts: Vec<Font>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_setup: Option<PageSetup>,
}

impl SheetGrid {
    /// Create a blank grid with the given extents.
    pub fn new(name: impl Into<String>, col_widths: Vec<f32>, row_heights: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            col_widths,
            row_heights,
            ..Self::default()
        }
    }

    /// Create a grid and place positioned cells into it.
    ///
    /// Cells outside the extents are dropped.
    pub fn from_cells(
        name: impl Into<String>,
        col_widths: Vec<f32>,
        row_heights: Vec<f32>,
        cells: Vec<CellData>,
    ) -> Self {
        let mut grid = Self::new(name, col_widths, row_heights);
        for data in cells {
            grid.set_cell(data.r, data.c, data.cell);
        }
        grid
    }

    /// Store a cell, growing the dense row storage as needed.
    ///
    /// Returns false (and stores nothing) when the position is outside the extents.
    pub fn set_cell(&mut self, row: u32, col: u32, cell: Cell) -> bool {
        let (r, c) = (row as usize, col as usize);
        if r >= self.row_heights.len() || c >= self.col_widths.len() {
            return false;
        }
        if self.rows.len() <= r {
            self.rows.resize_with(r + 1, Vec::new);
        }
        let Some(cells) = self.rows.get_mut(r) else {
            return false;
        };
        if cells.len() <= c {
            cells.resize(c + 1, None);
        }
        match cells.get_mut(c) {
            Some(slot) => {
                *slot = Some(cell);
                true
            }
            None => false,
        }
    }

    /// Register a font and return its reference.
    pub fn add_font(&mut self, font: Font) -> FontRef {
        if let Some(idx) = self.fonts.iter().position(|f| *f == font) {
            return FontRef(u32::try_from(idx).unwrap_or(0));
        }
        self.fonts.push(font);
        FontRef(u32::try_from(self.fonts.len() - 1).unwrap_or(0))
    }

    pub fn add_merge(&mut self, range: MergeRange) {
        self.merges.push(range);
    }

    #[must_use]
    pub fn with_merge(mut self, range: MergeRange) -> Self {
        self.add_merge(range);
        self
    }
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

    #[test]
    fn test_merge_range_spans() {
        let range = MergeRange::new(2, 1, 3, 2);
        assert_eq!(range.row_span(), 2);
        assert_eq!(range.col_span(), 2);
        assert!(range.contains(3, 2));
        assert!(!range.contains(4, 2));
        assert!(range.is_anchor(2, 1));
        assert!(!range.is_anchor(2, 2));

        let inverted = MergeRange::new(5, 5, 4, 4);
        assert_eq!(inverted.row_span(), 0);
        assert_eq!(inverted.col_span(), 0);
    }

    #[test]
    fn test_set_cell_grows_rows() {
        let mut grid = SheetGrid::new("S", vec![10.0; 3], vec![10.0; 4]);
        assert!(grid.set_cell(2, 1, Cell::text("x")));
        assert_eq!(grid.rows.len(), 3);
        assert_eq!(grid.rows[2].len(), 2);
        assert_eq!(grid.rows[2][1].as_ref().unwrap().v, "x");
        assert!(grid.rows[0].is_empty());
    }

    #[test]
    fn test_set_cell_out_of_bounds() {
        let mut grid = SheetGrid::new("S", vec![10.0; 2], vec![10.0; 2]);
        assert!(!grid.set_cell(2, 0, Cell::text("x")));
        assert!(!grid.set_cell(0, 5, Cell::text("x")));
        assert!(grid.rows.is_empty());
    }

    #[test]
    fn test_add_font_dedups() {
        let mut grid = SheetGrid::default();
        let bold = Font {
            bold: true,
            ..Font::default()
        };
        assert_eq!(grid.add_font(Font::default()), FontRef(0));
        assert_eq!(grid.add_font(bold.clone()), FontRef(1));
        assert_eq!(grid.add_font(bold), FontRef(1));
        assert_eq!(grid.fonts.len(), 2);
    }

    #[test]
    fn test_grid_deserializes_with_defaults() {
        let json = r#"{"name":"S","colWidths":[50.0],"rowHeights":[20.0],
            "rows":[[{"v":"hi","borders":{"top":true}}]]}"#;
        let grid: SheetGrid = serde_json::from_str(json).unwrap();
        let cell = grid.rows[0][0].as_ref().unwrap();
        assert_eq!(cell.v, "hi");
        assert!(cell.borders.top);
        assert!(!cell.borders.left);
        assert!(grid.merges.is_empty());
    }
}
