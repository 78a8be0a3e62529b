//! Property tests for page breaking, wrapping and the per-page plan.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

use proptest::prelude::*;
use xlpager::layout::{break_into_pages, line_baseline_offset, wrap};
use xlpager::{
    layout_sheet, BreakMode, Cell, CellBorders, DrawCommand, Font, LayoutConfig, MergeRange,
    MetricsError, PageGeometry, PageMargins, SheetGrid,
};

/// Half an em per character.
fn proportional(text: &str) -> f32 {
    text.chars().count() as f32 * 5.0
}

fn half_em(text: &str, _font: &Font, size: f32) -> Result<f32, MetricsError> {
    Ok(text.chars().count() as f32 * size * 0.5)
}

fn extents() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(0.0_f32..120.0, 1..40)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn complete_tiles_partition_the_grid(
        rows in extents(),
        cols in extents(),
        width in 50.0_f32..400.0,
        height in 50.0_f32..400.0,
    ) {
        let tiles = break_into_pages(&rows, &cols, width, height, BreakMode::Complete).unwrap();

        let mut covered = vec![0_u32; rows.len() * cols.len()];
        for (idx, tile) in tiles.iter().enumerate() {
            prop_assert_eq!(tile.page_index as usize, idx);
            prop_assert!(tile.row_count > 0 && tile.col_count > 0);
            for r in tile.start_row..tile.end_row() {
                for c in tile.start_col..tile.end_col() {
                    covered[r as usize * cols.len() + c as usize] += 1;
                }
            }

            // A band or chunk only overflows when it is a single oversized entry
            let band: f32 = rows[tile.start_row as usize..tile.end_row() as usize].iter().sum();
            prop_assert!(band <= height + 1e-3 || tile.row_count == 1);
            let chunk: f32 = cols[tile.start_col as usize..tile.end_col() as usize].iter().sum();
            prop_assert!(chunk <= width + 1e-3 || tile.col_count == 1);
        }
        prop_assert!(covered.iter().all(|&n| n == 1));
    }

    #[test]
    fn legacy_tiles_never_overlap(
        rows in extents(),
        cols in extents(),
        width in 50.0_f32..400.0,
        height in 50.0_f32..400.0,
    ) {
        let tiles = break_into_pages(&rows, &cols, width, height, BreakMode::Legacy).unwrap();
        for tile in &tiles {
            prop_assert!(tile.end_row() as usize <= rows.len());
            prop_assert!(tile.end_col() as usize <= cols.len());
        }
        for (i, a) in tiles.iter().enumerate() {
            for b in tiles.iter().skip(i + 1) {
                let rows_overlap = a.start_row < b.end_row() && b.start_row < a.end_row();
                let cols_overlap = a.start_col < b.end_col() && b.start_col < a.end_col();
                prop_assert!(!(rows_overlap && cols_overlap), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn wrapped_lines_fit_unless_unsplittable(
        words in prop::collection::vec("[a-z]{1,12}", 1..20),
        max_width in 20.0_f32..200.0,
    ) {
        let text = words.join(" ");
        for line in wrap(&text, max_width, proportional) {
            prop_assert_eq!(line.text.trim(), line.text.as_str());
            if line.width > max_width {
                // Only a single token with no break opportunity may overflow
                prop_assert!(!line.text.contains(' '));
            }
        }
    }

    #[test]
    fn wrapping_a_wrapped_line_is_stable(
        words in prop::collection::vec("[a-z]{1,8}", 1..12),
        max_width in 40.0_f32..200.0,
    ) {
        let text = words.join(" ");
        for line in wrap(&text, max_width, proportional) {
            if line.width <= max_width {
                let again = wrap(&line.text, max_width, proportional);
                prop_assert_eq!(again.len(), 1);
                prop_assert_eq!(&again[0].text, &line.text);
            }
        }
    }

    #[test]
    fn single_line_is_vertically_centered(
        height in 1.0_f32..200.0,
        font_size in 4.0_f32..40.0,
    ) {
        let baseline = line_baseline_offset(0, 1, height, font_size);
        prop_assert!((baseline - font_size / 2.0 - height / 2.0).abs() < 1e-3);
    }

    #[test]
    fn layout_commands_stay_on_the_page(
        rows in prop::collection::vec(5.0_f32..40.0, 1..30),
        cols in prop::collection::vec(20.0_f32..120.0, 1..12),
        merges in prop::collection::vec((0_u32..30, 0_u32..12, 1_u32..5, 1_u32..4), 0..6),
    ) {
        let row_count = rows.len() as u32;
        let col_count = cols.len() as u32;
        let mut grid = SheetGrid::new("prop", cols, rows);
        for r in 0..row_count {
            for c in 0..col_count {
                grid.set_cell(r, c, Cell::text(format!("{r}:{c}")).with_borders(CellBorders::BOXED));
            }
        }
        for (r, c, h, w) in merges {
            grid.add_merge(MergeRange::new(r, c, r + h - 1, c + w - 1));
        }

        let geometry = PageGeometry {
            width: 320.0,
            height: 260.0,
            margins: PageMargins::uniform(10.0),
        };
        let plan = layout_sheet(&grid, &half_em, &geometry, &LayoutConfig::default()).unwrap();

        for page in &plan.pages {
            for command in &page.commands {
                if let DrawCommand::Border(b) = command {
                    prop_assert!(b.x >= 10.0 - 1e-3 && b.y >= 10.0 - 1e-3);
                    prop_assert!(b.width > 0.0 && b.height > 0.0);
                    prop_assert!(!b.borders.is_empty());
                }
            }
        }
    }
}
