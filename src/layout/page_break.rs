//! Splits a grid into page-sized tiles.
//!
//! Rows are grouped into bands that fit the content height, and each band's
//! columns are grouped into chunks that fit the content width. A boundary is
//! only inserted where the accumulated extent would overflow, so cell order
//! is never reshuffled. Tiles are emitted band by band, left to right.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Axis, Result, XlpagerError};
use crate::types::PageTile;

/// How the final row band and trailing column chunks are handled.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BreakMode {
    /// Every band and chunk is flushed; the tiles partition the grid.
    #[default]
    Complete,
    /// Only emit tiles when a row overflow triggers a column pass, and only
    /// for column chunks that themselves overflow. Rows after the last
    /// overflow and the rightmost chunk of each band are never emitted.
    Legacy,
}

/// Partition the grid into page tiles.
///
/// Extents and the content box are in the same unit (points). Fails on an
/// empty grid, a negative or non-finite extent, or a content box without area.
pub fn break_into_pages(
    row_heights: &[f32],
    col_widths: &[f32],
    content_width: f32,
    content_height: f32,
    mode: BreakMode,
) -> Result<Vec<PageTile>> {
    validate(row_heights, col_widths, content_width, content_height)?;

    let tiles = match mode {
        BreakMode::Complete => {
            let bands = greedy_runs(row_heights, content_height);
            let chunks = greedy_runs(col_widths, content_width);
            let mut tiles = Vec::with_capacity(bands.len() * chunks.len());
            for band in &bands {
                for chunk in &chunks {
                    let page_index = u32::try_from(tiles.len()).unwrap_or(u32::MAX);
                    tiles.push(PageTile {
                        page_index,
                        start_row: band.start,
                        row_count: band.end - band.start,
                        start_col: chunk.start,
                        col_count: chunk.end - chunk.start,
                    });
                }
            }
            tiles
        }
        BreakMode::Legacy => legacy_tiles(row_heights, col_widths, content_width, content_height),
    };

    log::debug!(
        "paginated {}x{} grid into {} tiles ({mode:?})",
        row_heights.len(),
        col_widths.len(),
        tiles.len()
    );
    Ok(tiles)
}

fn validate(
    row_heights: &[f32],
    col_widths: &[f32],
    content_width: f32,
    content_height: f32,
) -> Result<()> {
    if row_heights.is_empty() || col_widths.is_empty() {
        return Err(XlpagerError::EmptyGrid {
            rows: u32::try_from(row_heights.len()).unwrap_or(u32::MAX),
            cols: u32::try_from(col_widths.len()).unwrap_or(u32::MAX),
        });
    }
    if !(content_width.is_finite() && content_width > 0.0)
        || !(content_height.is_finite() && content_height > 0.0)
    {
        return Err(XlpagerError::InvalidPageArea {
            width: content_width,
            height: content_height,
        });
    }
    check_extents(Axis::Row, row_heights)?;
    check_extents(Axis::Column, col_widths)
}

fn check_extents(axis: Axis, extents: &[f32]) -> Result<()> {
    match extents
        .iter()
        .position(|v| !v.is_finite() || *v < 0.0)
    {
        Some(idx) => Err(XlpagerError::InvalidExtent {
            axis,
            index: u32::try_from(idx).unwrap_or(u32::MAX),
            value: extents.get(idx).copied().unwrap_or(f32::NAN),
        }),
        None => Ok(()),
    }
}

/// Group consecutive extents into runs that fit within `limit`.
///
/// The entry that overflows a run starts the next one. An entry larger than
/// `limit` on its own still forms a run, so no run is ever empty.
fn greedy_runs(extents: &[f32], limit: f32) -> Vec<Range<u32>> {
    let len = u32::try_from(extents.len()).unwrap_or(u32::MAX);
    let mut runs = Vec::new();
    let mut start: u32 = 0;
    let mut accumulated = 0.0_f32;

    for (idx, &extent) in (0..len).zip(extents) {
        accumulated += extent;
        if accumulated > limit && idx > start {
            runs.push(start..idx);
            start = idx;
            accumulated = extent;
        }
    }
    runs.push(start..len);
    runs
}

/// Row-outer, column-inner accumulation that only flushes on overflow.
///
/// A row overflow arms a column pass that runs at the *next* row, so the
/// closing band includes the overflowing row while the next band's height
/// accumulation also starts from it.
fn legacy_tiles(
    row_heights: &[f32],
    col_widths: &[f32],
    content_width: f32,
    content_height: f32,
) -> Vec<PageTile> {
    let mut tiles = Vec::new();
    let mut accumulated_width = 0.0_f32;
    let mut accumulated_height = 0.0_f32;
    let mut row_break_pending = false;
    let mut start_row: u32 = 0;
    let mut start_col: u32 = 0;

    let rows = u32::try_from(row_heights.len()).unwrap_or(u32::MAX);
    let cols = u32::try_from(col_widths.len()).unwrap_or(u32::MAX);

    for (i, &height) in (0..rows).zip(row_heights) {
        if row_break_pending {
            for (j, &width) in (0..cols).zip(col_widths) {
                accumulated_width += width;
                if accumulated_width > content_width {
                    let page_index = u32::try_from(tiles.len()).unwrap_or(u32::MAX);
                    tiles.push(PageTile {
                        page_index,
                        start_row,
                        row_count: i - start_row,
                        start_col,
                        col_count: j - start_col,
                    });
                    accumulated_width = width;
                    start_col = j;
                }
            }
            row_break_pending = false;
            start_row = i;
            start_col = 0;
            accumulated_width = 0.0;
        }

        accumulated_height += height;
        if accumulated_height > content_height {
            row_break_pending = true;
            accumulated_height = height;
        }
    }

    tiles
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
    use test_case::test_case;

    fn tile(page_index: u32, start_row: u32, row_count: u32, start_col: u32, col_count: u32) -> PageTile {
        PageTile {
            page_index,
            start_row,
            row_count,
            start_col,
            col_count,
        }
    }

    #[test]
    fn test_single_cell_fits_one_page() {
        let tiles = break_into_pages(&[20.0], &[50.0], 90.0, 19.0, BreakMode::Complete).unwrap();
        assert_eq!(tiles, vec![tile(0, 0, 1, 0, 1)]);
    }

    #[test]
    fn test_everything_fits() {
        let tiles = break_into_pages(&[10.0; 5], &[10.0; 4], 100.0, 100.0, BreakMode::Complete)
            .unwrap();
        assert_eq!(tiles, vec![tile(0, 0, 5, 0, 4)]);
    }

    #[test]
    fn test_overflowing_row_starts_next_band() {
        // 30 + 30 + 30 > 80, so row 2 opens the second band
        let tiles = break_into_pages(&[30.0; 5], &[10.0], 100.0, 80.0, BreakMode::Complete)
            .unwrap();
        assert_eq!(tiles, vec![tile(0, 0, 2, 0, 1), tile(1, 2, 2, 0, 1), tile(2, 4, 1, 0, 1)]);
    }

    #[test]
    fn test_exact_fit_does_not_break() {
        let tiles = break_into_pages(&[25.0; 4], &[50.0; 2], 100.0, 100.0, BreakMode::Complete)
            .unwrap();
        assert_eq!(tiles.len(), 1);
    }

    #[test]
    fn test_columns_split_within_each_band() {
        let tiles = break_into_pages(&[60.0; 3], &[40.0; 5], 100.0, 100.0, BreakMode::Complete)
            .unwrap();
        assert_eq!(
            tiles,
            vec![
                tile(0, 0, 1, 0, 2),
                tile(1, 0, 1, 2, 2),
                tile(2, 0, 1, 4, 1),
                tile(3, 1, 1, 0, 2),
                tile(4, 1, 1, 2, 2),
                tile(5, 1, 1, 4, 1),
                tile(6, 2, 1, 0, 2),
                tile(7, 2, 1, 2, 2),
                tile(8, 2, 1, 4, 1),
            ]
        );
    }

    #[test]
    fn test_oversized_column_gets_its_own_tile() {
        let tiles = break_into_pages(&[10.0], &[30.0, 150.0, 30.0], 100.0, 100.0, BreakMode::Complete)
            .unwrap();
        assert_eq!(
            tiles,
            vec![tile(0, 0, 1, 0, 1), tile(1, 0, 1, 1, 1), tile(2, 0, 1, 2, 1)]
        );
    }

    #[test]
    fn test_oversized_first_row_gets_its_own_band() {
        let tiles = break_into_pages(&[500.0, 10.0], &[10.0], 100.0, 100.0, BreakMode::Complete)
            .unwrap();
        assert_eq!(tiles, vec![tile(0, 0, 1, 0, 1), tile(1, 1, 1, 0, 1)]);
    }

    #[test]
    fn test_hidden_rows_ride_along() {
        let tiles = break_into_pages(&[60.0, 0.0, 0.0, 60.0], &[10.0], 100.0, 100.0, BreakMode::Complete)
            .unwrap();
        assert_eq!(tiles, vec![tile(0, 0, 3, 0, 1), tile(1, 3, 1, 0, 1)]);
    }

    #[test]
    fn test_legacy_single_band_emits_nothing() {
        // Without a row overflow no column pass ever runs
        let tiles = break_into_pages(&[20.0], &[50.0], 90.0, 19.0, BreakMode::Legacy).unwrap();
        assert!(tiles.is_empty());
    }

    #[test]
    fn test_legacy_drops_trailing_band_and_chunk() {
        // Rows: 30,30,30 overflows 80 at row 2; column pass runs at row 3.
        // Columns: 60,60 overflows 100 at column 1; chunk [1,2) is never flushed.
        let tiles = break_into_pages(&[30.0; 5], &[60.0, 60.0], 100.0, 80.0, BreakMode::Legacy)
            .unwrap();
        assert_eq!(tiles, vec![tile(0, 0, 3, 0, 1)]);
    }

    #[test]
    fn test_legacy_oversized_first_column_yields_empty_tile() {
        let tiles = break_into_pages(&[60.0, 60.0, 60.0], &[150.0], 100.0, 100.0, BreakMode::Legacy)
            .unwrap();
        assert_eq!(tiles, vec![tile(0, 0, 2, 0, 0)]);
    }

    #[test_case(&[], &[10.0] ; "no rows")]
    #[test_case(&[10.0], &[] ; "no columns")]
    fn test_empty_grid_is_fatal(rows: &[f32], cols: &[f32]) {
        let err = break_into_pages(rows, cols, 100.0, 100.0, BreakMode::Complete).unwrap_err();
        assert!(matches!(err, XlpagerError::EmptyGrid { .. }));
    }

    #[test_case(0.0, 100.0 ; "zero width")]
    #[test_case(100.0, -1.0 ; "negative height")]
    #[test_case(f32::NAN, 100.0 ; "nan width")]
    fn test_invalid_page_area(width: f32, height: f32) {
        let err = break_into_pages(&[10.0], &[10.0], width, height, BreakMode::Complete).unwrap_err();
        assert!(matches!(err, XlpagerError::InvalidPageArea { .. }));
    }

    #[test]
    fn test_invalid_extent_reports_axis_and_index() {
        let err = break_into_pages(&[10.0, 10.0], &[10.0, -3.0], 100.0, 100.0, BreakMode::Complete)
            .unwrap_err();
        match err {
            XlpagerError::InvalidExtent { axis, index, .. } => {
                assert_eq!(axis, Axis::Column);
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_greedy_runs_never_empty() {
        assert_eq!(greedy_runs(&[5.0, 5.0, 5.0], 4.0), vec![0..1, 1..2, 2..3]);
        assert_eq!(greedy_runs(&[1.0, 2.0, 3.0], 3.0), vec![0..2, 2..3]);
    }
}
