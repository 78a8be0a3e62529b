//! Capability traits the layout engine is written against.
//!
//! The engine never sees a file format. Readers build something that
//! implements [`GridProvider`]; font measurement comes from a
//! [`MetricsProvider`].

use crate::error::MetricsError;
use crate::types::{Cell, CellBorders, Font, FontRef, MergeRange, SheetGrid};

/// Read-only view of one sheet's grid.
pub trait GridProvider {
    /// Display name of the sheet, used to label its pages.
    fn sheet_name(&self) -> &str {
        ""
    }

    /// Number of rows (row heights available).
    fn row_count(&self) -> u32;

    /// Number of columns (column widths available).
    fn col_count(&self) -> u32;

    /// Row height in points; 0 for rows past the end.
    fn row_height(&self, row: u32) -> f32;

    /// Column width in points; 0 for columns past the end.
    fn col_width(&self, col: u32) -> f32;

    /// The cell at (row, col), or `None` for a blank cell.
    fn cell(&self, row: u32, col: u32) -> Option<&Cell>;

    /// Resolve a font reference; `None` falls back to the default font.
    fn font(&self, font: FontRef) -> Option<&Font>;

    /// Merged regions in source order.
    fn merged_regions(&self) -> &[MergeRange];

    /// The cell's display value, empty for blank cells.
    fn cell_value(&self, row: u32, col: u32) -> &str {
        self.cell(row, col).map_or("", |c| c.v.as_str())
    }

    /// The cell's own borders, none for blank cells.
    fn cell_borders(&self, row: u32, col: u32) -> CellBorders {
        self.cell(row, col).map(|c| c.borders).unwrap_or_default()
    }
}

impl GridProvider for SheetGrid {
    fn sheet_name(&self) -> &str {
        &self.name
    }

    fn row_count(&self) -> u32 {
        u32::try_from(self.row_heights.len()).unwrap_or(u32::MAX)
    }

    fn col_count(&self) -> u32 {
        u32::try_from(self.col_widths.len()).unwrap_or(u32::MAX)
    }

    fn row_height(&self, row: u32) -> f32 {
        self.row_heights.get(row as usize).copied().unwrap_or(0.0)
    }

    fn col_width(&self, col: u32) -> f32 {
        self.col_widths.get(col as usize).copied().unwrap_or(0.0)
    }

    fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.rows
            .get(row as usize)
            .and_then(|cells| cells.get(col as usize))
            .and_then(Option::as_ref)
    }

    fn font(&self, font: FontRef) -> Option<&Font> {
        self.fonts.get(font.0 as usize)
    }

    fn merged_regions(&self) -> &[MergeRange] {
        &self.merges
    }
}

/// Measures rendered text width for a font.
///
/// Widths are in points, the same unit as column widths.
pub trait MetricsProvider {
    fn measure_width(&self, text: &str, font: &Font, font_size: f32)
        -> Result<f32, MetricsError>;
}

impl<F> MetricsProvider for F
where
    F: Fn(&str, &Font, f32) -> Result<f32, MetricsError>,
{
    fn measure_width(
        &self,
        text: &str,
        font: &Font,
        font_size: f32,
    ) -> Result<f32, MetricsError> {
        self(text, font, font_size)
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

    fn sample() -> SheetGrid {
        let mut grid = SheetGrid::new("S", vec![40.0, 60.0], vec![15.0, 20.0, 25.0]);
        grid.set_cell(
            1,
            1,
            Cell::text("hello").with_borders(CellBorders {
                left: true,
                ..CellBorders::default()
            }),
        );
        grid
    }

    #[test]
    fn test_sheet_grid_extents() {
        let grid = sample();
        assert_eq!(grid.sheet_name(), "S");
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.col_count(), 2);
        assert_eq!(grid.row_height(2), 25.0);
        assert_eq!(grid.col_width(1), 60.0);
        assert_eq!(grid.row_height(9), 0.0);
        assert_eq!(grid.col_width(9), 0.0);
    }

    #[test]
    fn test_missing_cell_defaults() {
        let grid = sample();
        assert!(grid.cell(0, 0).is_none());
        assert_eq!(grid.cell_value(0, 0), "");
        assert_eq!(grid.cell_borders(0, 0), CellBorders::default());
        assert_eq!(grid.cell_value(1, 1), "hello");
        assert!(grid.cell_borders(1, 1).left);
    }

    #[test]
    fn test_closure_metrics_provider() {
        let metrics = |text: &str, _font: &Font, size: f32| -> Result<f32, MetricsError> {
            Ok(text.chars().count() as f32 * size * 0.5)
        };
        let width = metrics
            .measure_width("abcd", &Font::default(), 10.0)
            .unwrap();
        assert_eq!(width, 20.0);
    }
}
