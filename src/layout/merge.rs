//! Merged-region lookup for one sheet.
//!
//! The table is built once per sheet from the grid's region list and then
//! passed by reference to everything that needs it.

use crate::grid::GridProvider;
use crate::types::{BorderFlags, MergeRange};

use super::LayoutIssue;

/// Immutable index of a sheet's merged regions.
#[derive(Debug, Clone, Default)]
pub struct MergeTable {
    /// Regions after clamping, in source order
    regions: Vec<MergeRange>,
    /// Sorted row boundaries; rows `band_starts[i]..band_starts[i + 1]` are
    /// crossed by the same regions
    band_starts: Vec<u32>,
    /// Indices into `regions` crossing each band, ascending so the first region listed wins
    band_regions: Vec<Vec<usize>>,
}

impl MergeTable {
    /// Build the table, clamping regions to a `row_count` x `col_count` grid.
    ///
    /// Regions that are inverted or start outside the grid are dropped.
    /// Every adjustment is returned as a [`LayoutIssue`].
    pub fn new(
        regions: &[MergeRange],
        row_count: u32,
        col_count: u32,
    ) -> (Self, Vec<LayoutIssue>) {
        let mut table = Self::default();
        let mut issues = Vec::new();

        for &region in regions {
            let Some(clamped) = clamp_region(region, row_count, col_count) else {
                log::warn!("skipping merged region {region:?} outside {row_count}x{col_count} grid");
                issues.push(LayoutIssue::RegionSkipped { region });
                continue;
            };
            if clamped != region {
                log::warn!("clamping merged region {region:?} to {clamped:?}");
                issues.push(LayoutIssue::RegionClamped {
                    original: region,
                    clamped,
                });
            }

            table.regions.push(clamped);
        }

        table.index_bands();
        (table, issues)
    }

    /// Split the rows at every region edge and record which regions cross each band.
    fn index_bands(&mut self) {
        let mut starts: Vec<u32> = self
            .regions
            .iter()
            .flat_map(|r| [r.start_row, r.end_row.saturating_add(1)])
            .collect();
        starts.sort_unstable();
        starts.dedup();

        let mut bands = vec![Vec::new(); starts.len().saturating_sub(1)];
        for (idx, region) in self.regions.iter().enumerate() {
            let first = starts.partition_point(|&s| s < region.start_row);
            let last = starts.partition_point(|&s| s <= region.end_row);
            for band in bands.iter_mut().take(last).skip(first) {
                band.push(idx);
            }
        }

        self.band_starts = starts;
        self.band_regions = bands;
    }

    /// Convenience constructor that sizes the table from a grid.
    pub fn for_grid<G: GridProvider + ?Sized>(grid: &G) -> (Self, Vec<LayoutIssue>) {
        Self::new(grid.merged_regions(), grid.row_count(), grid.col_count())
    }

    /// Regions kept after clamping, in source order.
    pub fn regions(&self) -> &[MergeRange] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// The region covering (row, col), if any.
    pub fn region_at(&self, row: u32, col: u32) -> Option<&MergeRange> {
        let band = self.band_starts.partition_point(|&s| s <= row).checked_sub(1)?;
        self.band_regions
            .get(band)?
            .iter()
            .filter_map(|&idx| self.regions.get(idx))
            .find(|region| region.start_col <= col && col <= region.end_col)
    }

    /// True if the cell lies inside a region and is not its anchor.
    pub fn is_member(&self, row: u32, col: u32) -> bool {
        self.region_at(row, col)
            .is_some_and(|region| !region.is_anchor(row, col))
    }

    /// True if a region is anchored at (row, col), including 1x1 regions.
    pub fn is_anchor(&self, row: u32, col: u32) -> bool {
        self.region_at(row, col)
            .is_some_and(|region| region.is_anchor(row, col))
    }

    /// Anchor coordinate of the region covering (row, col).
    pub fn anchor_of(&self, row: u32, col: u32) -> Option<(u32, u32)> {
        self.region_at(row, col)
            .map(|region| (region.start_row, region.start_col))
    }

    /// (row_span, col_span) of the region anchored at (row, col); (1, 1) otherwise.
    pub fn span_at(&self, row: u32, col: u32) -> (u32, u32) {
        match self.region_at(row, col) {
            Some(region) if region.is_anchor(row, col) => (region.row_span(), region.col_span()),
            _ => (1, 1),
        }
    }

    /// Border flags for a span, read from its four corner cells.
    ///
    /// TOP comes from the top-left cell, RIGHT from the top-right, BOTTOM
    /// from the bottom-right and LEFT from the bottom-left. A 1x1 span
    /// yields the cell's own borders. Blank corner cells contribute nothing.
    pub fn composite_border<G: GridProvider + ?Sized>(
        grid: &G,
        row: u32,
        col: u32,
        row_span: u32,
        col_span: u32,
    ) -> BorderFlags {
        let last_row = row.saturating_add(row_span.max(1) - 1);
        let last_col = col.saturating_add(col_span.max(1) - 1);

        let mut flags = BorderFlags::NONE;
        flags.set(BorderFlags::TOP, grid.cell_borders(row, col).top);
        flags.set(BorderFlags::RIGHT, grid.cell_borders(row, last_col).right);
        flags.set(
            BorderFlags::BOTTOM,
            grid.cell_borders(last_row, last_col).bottom,
        );
        flags.set(BorderFlags::LEFT, grid.cell_borders(last_row, col).left);
        flags
    }
}

fn clamp_region(region: MergeRange, row_count: u32, col_count: u32) -> Option<MergeRange> {
    if region.start_row > region.end_row || region.start_col > region.end_col {
        return None;
    }
    if region.start_row >= row_count || region.start_col >= col_count {
        return None;
    }
    Some(MergeRange {
        end_row: region.end_row.min(row_count - 1),
        end_col: region.end_col.min(col_count - 1),
        ..region
    })
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
    use crate::types::{Cell, CellBorders, SheetGrid};

    fn grid(rows: usize, cols: usize) -> SheetGrid {
        SheetGrid::new("S", vec![10.0; cols], vec![10.0; rows])
    }

    fn bordered(top: bool, right: bool, bottom: bool, left: bool) -> Cell {
        Cell::text("").with_borders(CellBorders {
            top,
            right,
            bottom,
            left,
        })
    }

    #[test]
    fn test_member_and_anchor() {
        let (table, issues) = MergeTable::new(&[MergeRange::new(0, 0, 1, 1)], 10, 5);
        assert!(issues.is_empty());

        assert!(!table.is_member(0, 0));
        assert!(table.is_anchor(0, 0));
        assert!(table.is_member(0, 1));
        assert!(table.is_member(1, 0));
        assert!(table.is_member(1, 1));
        assert!(!table.is_member(2, 2));
        assert_eq!(table.anchor_of(1, 1), Some((0, 0)));
        assert_eq!(table.anchor_of(3, 3), None);
    }

    #[test]
    fn test_span_at() {
        let (table, _) = MergeTable::new(&[MergeRange::new(2, 1, 3, 2)], 10, 5);
        assert_eq!(table.span_at(2, 1), (2, 2));
        // Members and unrelated cells report a 1x1 span
        assert_eq!(table.span_at(3, 2), (1, 1));
        assert_eq!(table.span_at(0, 0), (1, 1));
    }

    #[test]
    fn test_single_cell_region_is_anchor_with_unit_span() {
        let (table, _) = MergeTable::new(&[MergeRange::new(4, 4, 4, 4)], 10, 10);
        assert!(table.is_anchor(4, 4));
        assert!(!table.is_member(4, 4));
        assert_eq!(table.span_at(4, 4), (1, 1));
    }

    #[test]
    fn test_out_of_bounds_region_is_clamped() {
        let region = MergeRange::new(1, 1, 20, 20);
        let (table, issues) = MergeTable::new(&[region], 5, 4);
        assert_eq!(table.regions(), &[MergeRange::new(1, 1, 4, 3)]);
        assert_eq!(
            issues,
            vec![LayoutIssue::RegionClamped {
                original: region,
                clamped: MergeRange::new(1, 1, 4, 3),
            }]
        );
        assert_eq!(table.span_at(1, 1), (4, 3));
    }

    #[test]
    fn test_unusable_regions_are_skipped() {
        let outside = MergeRange::new(7, 0, 8, 1);
        let inverted = MergeRange::new(3, 3, 1, 1);
        let (table, issues) = MergeTable::new(&[outside, inverted], 5, 5);
        assert!(table.is_empty());
        assert_eq!(issues.len(), 2);
        assert!(matches!(issues[0], LayoutIssue::RegionSkipped { .. }));
    }

    #[test]
    fn test_overlapping_regions_first_wins() {
        let first = MergeRange::new(0, 0, 1, 1);
        let second = MergeRange::new(1, 1, 2, 2);
        let (table, _) = MergeTable::new(&[first, second], 5, 5);
        assert_eq!(table.len(), 2);
        assert_eq!(table.region_at(1, 1), Some(&first));
        assert_eq!(table.region_at(2, 2), Some(&second));
        assert!(table.is_member(1, 1));
    }

    #[test]
    fn test_large_region_is_indexed_by_row_bands() {
        let huge = MergeRange::new(0, 0, 999_999, 999);
        let strip = MergeRange::new(2_000_000, 3, 2_000_000, 6);
        let (table, issues) = MergeTable::new(&[huge, strip], 5_000_000, 1_000);
        assert!(issues.is_empty());
        // Storage follows the region count, not the covered area
        assert_eq!(table.band_starts, vec![0, 1_000_000, 2_000_000, 2_000_001]);
        assert_eq!(table.band_regions, vec![vec![0], vec![], vec![1]]);

        assert_eq!(table.region_at(999_999, 999), Some(&huge));
        assert_eq!(table.region_at(1_000_000, 0), None);
        assert_eq!(table.region_at(1_500_000, 5), None);
        assert_eq!(table.region_at(2_000_000, 2), None);
        assert_eq!(table.region_at(2_000_000, 6), Some(&strip));
        assert_eq!(table.region_at(2_000_001, 6), None);
        assert_eq!(table.anchor_of(654_321, 321), Some((0, 0)));
        assert_eq!(table.span_at(0, 0), (1_000_000, 1_000));
    }

    #[test]
    fn test_nested_and_side_by_side_regions() {
        let left = MergeRange::new(1, 0, 4, 1);
        let right = MergeRange::new(2, 3, 3, 4);
        let inner = MergeRange::new(2, 0, 2, 0);
        let (table, _) = MergeTable::new(&[left, right, inner], 10, 10);

        assert_eq!(table.region_at(0, 0), None);
        assert_eq!(table.region_at(3, 1), Some(&left));
        assert_eq!(table.region_at(3, 2), None);
        assert_eq!(table.region_at(3, 4), Some(&right));
        // Listed after `left`, so `left` still owns the cell
        assert_eq!(table.region_at(2, 0), Some(&left));
        assert_eq!(table.region_at(5, 0), None);
    }

    #[test]
    fn test_empty_table_finds_nothing() {
        let (table, _) = MergeTable::new(&[], 10, 10);
        assert_eq!(table.region_at(0, 0), None);
        assert!(!table.is_anchor(0, 0));
    }

    #[test]
    fn test_composite_border_uses_corners_only() {
        // Region rows 2-3, cols 1-2; only the top-left cell has a top border
        let mut g = grid(5, 4);
        g.set_cell(2, 1, bordered(true, false, false, false));
        // Member cells with other borders must not leak into the result
        g.set_cell(2, 2, bordered(true, false, true, true));
        g.set_cell(3, 1, bordered(true, true, true, false));
        g.set_cell(3, 2, bordered(true, false, false, true));

        let flags = MergeTable::composite_border(&g, 2, 1, 2, 2);
        assert_eq!(flags, BorderFlags::TOP);
    }

    #[test]
    fn test_composite_border_each_corner() {
        let mut g = grid(5, 5);
        g.set_cell(0, 0, bordered(true, false, false, false));
        g.set_cell(0, 2, bordered(false, true, false, false));
        g.set_cell(2, 2, bordered(false, false, true, false));
        g.set_cell(2, 0, bordered(false, false, false, true));

        let flags = MergeTable::composite_border(&g, 0, 0, 3, 3);
        assert_eq!(flags, BorderFlags::ALL);
    }

    #[test]
    fn test_composite_border_single_cell_matches_own_borders() {
        let mut g = grid(2, 2);
        let borders = CellBorders {
            top: false,
            right: true,
            bottom: true,
            left: false,
        };
        g.set_cell(1, 1, Cell::text("x").with_borders(borders));

        assert_eq!(MergeTable::composite_border(&g, 1, 1, 1, 1), borders.flags());
        assert_eq!(MergeTable::composite_border(&g, 0, 0, 1, 1), BorderFlags::NONE);
    }
}
