//! Turns page tiles into ordered draw commands.
//!
//! For every tile the cells are visited row by row, left to right. Merged
//! members are skipped, anchors draw their whole span (clipped to the tile),
//! and every drawn span gets one optional border box followed by its text
//! lines.

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::error::{MetricsError, Result};
use crate::grid::{GridProvider, MetricsProvider};
use crate::page_setup::PageGeometry;
use crate::render::{BorderBox, Renderer, TextRun};
use crate::types::{BorderFlags, Font, MergeRange, PageTile};

use super::{
    break_into_pages, centered_x, line_baseline_offset, CellRect, LayoutIssue, MergeTable,
    SheetLayout, TextWrapper,
};

/// A single drawing instruction in page-local points
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    Border(BorderBox),
    Text(TextRun),
}

/// Everything drawn on one page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePlan {
    pub tile: PageTile,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    pub commands: Vec<DrawCommand>,
}

impl PagePlan {
    pub fn borders(&self) -> impl Iterator<Item = &BorderBox> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Border(b) => Some(b),
            DrawCommand::Text(_) => None,
        })
    }

    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Text(t) => Some(t),
            DrawCommand::Border(_) => None,
        })
    }
}

/// Laid-out pages for one sheet plus the problems absorbed on the way
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetPlan {
    pub name: String,
    pub pages: Vec<PagePlan>,
    pub issues: Vec<LayoutIssue>,
}

impl SheetPlan {
    /// Send every page to `renderer` in order.
    pub fn replay<R: Renderer + ?Sized>(&self, renderer: &mut R) -> Result<()> {
        renderer.begin_sheet(&self.name)?;
        for page in &self.pages {
            renderer.begin_page(&page.tile, page.width, page.height)?;
            for command in &page.commands {
                match command {
                    DrawCommand::Border(border) => renderer.draw_border(border)?,
                    DrawCommand::Text(run) => renderer.draw_text_line(run)?,
                }
            }
            renderer.end_page()?;
        }
        renderer.end_sheet()
    }
}

/// Lay out one sheet onto pages of the given geometry.
///
/// Fails without a partial plan when the grid is empty, an extent is invalid
/// or the content box has no area. Everything else is absorbed and listed in
/// [`SheetPlan::issues`].
pub fn layout_sheet<G, M>(
    grid: &G,
    metrics: &M,
    geometry: &PageGeometry,
    config: &LayoutConfig,
) -> Result<SheetPlan>
where
    G: GridProvider + ?Sized,
    M: MetricsProvider + ?Sized,
{
    let row_heights: Vec<f32> = (0..grid.row_count()).map(|r| grid.row_height(r)).collect();
    let col_widths: Vec<f32> = (0..grid.col_count()).map(|c| grid.col_width(c)).collect();

    let tiles = break_into_pages(
        &row_heights,
        &col_widths,
        geometry.content_width(),
        geometry.content_height(),
        config.break_mode,
    )?;

    let (merges, issues) = MergeTable::for_grid(grid);
    let mut planner = Planner {
        grid,
        metrics,
        config,
        layout: SheetLayout::new(&col_widths, &row_heights),
        merges,
        origin: geometry.content_origin(),
        issues,
    };

    let pages = tiles
        .into_iter()
        .map(|tile| PagePlan {
            commands: planner.plan_tile(&tile),
            tile,
            width: geometry.width,
            height: geometry.height,
        })
        .collect();

    Ok(SheetPlan {
        name: grid.sheet_name().to_string(),
        pages,
        issues: planner.issues,
    })
}

/// Lay out one sheet and send it straight to `renderer`.
pub fn render_sheet<G, M, R>(
    grid: &G,
    metrics: &M,
    geometry: &PageGeometry,
    config: &LayoutConfig,
    renderer: &mut R,
) -> Result<SheetPlan>
where
    G: GridProvider + ?Sized,
    M: MetricsProvider + ?Sized,
    R: Renderer + ?Sized,
{
    let plan = layout_sheet(grid, metrics, geometry, config)?;
    plan.replay(renderer)?;
    Ok(plan)
}

/// What a visited cell draws.
struct Span {
    /// Cell whose value, font and borders are used
    source: (u32, u32),
    /// Top-left cell of the drawn rectangle
    start: (u32, u32),
    /// (rows, cols) from `start`, before clipping to the tile
    size: (u32, u32),
    borders: BorderFlags,
}

struct Planner<'a, G: ?Sized, M: ?Sized> {
    grid: &'a G,
    metrics: &'a M,
    config: &'a LayoutConfig,
    layout: SheetLayout,
    merges: MergeTable,
    origin: (f32, f32),
    issues: Vec<LayoutIssue>,
}

impl<G, M> Planner<'_, G, M>
where
    G: GridProvider + ?Sized,
    M: MetricsProvider + ?Sized,
{
    fn plan_tile(&mut self, tile: &PageTile) -> Vec<DrawCommand> {
        let mut commands = Vec::new();

        for row in tile.start_row..tile.end_row() {
            let mut col = tile.start_col;
            while col < tile.end_col() {
                let advance = match self.span_at(tile, row, col) {
                    Some(span) => self.plan_span(tile, &span, &mut commands),
                    None => 1,
                };
                col = col.saturating_add(advance.max(1));
            }
        }

        commands
    }

    /// Resolve what (row, col) draws on this tile; `None` means skip it.
    fn span_at(&self, tile: &PageTile, row: u32, col: u32) -> Option<Span> {
        let Some(region) = self.merges.region_at(row, col) else {
            return Some(Span {
                source: (row, col),
                start: (row, col),
                size: (1, 1),
                borders: MergeTable::composite_border(self.grid, row, col, 1, 1),
            });
        };

        if region.is_anchor(row, col) {
            if region.row_span() == 1 && region.col_span() == 1 {
                return None;
            }
            return Some(Span {
                source: (row, col),
                start: (row, col),
                size: (region.row_span(), region.col_span()),
                borders: self.region_border(region),
            });
        }

        if !self.config.continue_split_regions
            || tile.contains(region.start_row, region.start_col)
        {
            return None;
        }
        // The anchor sits on an earlier page; only the region's first visible cell draws.
        let visible = (
            region.start_row.max(tile.start_row),
            region.start_col.max(tile.start_col),
        );
        if visible != (row, col) {
            return None;
        }
        Some(Span {
            source: (region.start_row, region.start_col),
            start: visible,
            size: (region.end_row - row + 1, region.end_col - col + 1),
            borders: self.region_border(region),
        })
    }

    fn region_border(&self, region: &MergeRange) -> BorderFlags {
        MergeTable::composite_border(
            self.grid,
            region.start_row,
            region.start_col,
            region.row_span(),
            region.col_span(),
        )
    }

    /// Emit commands for one span and return how many columns it covers on this tile.
    fn plan_span(
        &mut self,
        tile: &PageTile,
        span: &Span,
        commands: &mut Vec<DrawCommand>,
    ) -> u32 {
        let (row, col) = span.start;
        let row_span = span.size.0.min(tile.end_row().saturating_sub(row));
        let col_span = span.size.1.min(tile.end_col().saturating_sub(col));

        let rect = self
            .layout
            .span_rect(tile, self.origin, span.start, (row_span, col_span));
        if rect.is_degenerate() {
            // Hidden blank cells are routine; only spans that would draw something are reported
            let (src_row, src_col) = span.source;
            if !span.borders.is_empty() || !self.grid.cell_value(src_row, src_col).is_empty() {
                log::debug!(
                    "skipping {row_span}x{col_span} span at ({row}, {col}) with no area on page {}",
                    tile.page_index
                );
                self.issues.push(LayoutIssue::DegenerateSpan {
                    row,
                    col,
                    width: rect.width,
                    height: rect.height,
                });
            }
            return col_span;
        }

        if !span.borders.is_empty() {
            commands.push(DrawCommand::Border(BorderBox {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                borders: span.borders,
            }));
        }

        self.plan_text(span.source, &rect, commands);
        col_span
    }

    fn plan_text(&mut self, (row, col): (u32, u32), rect: &CellRect, commands: &mut Vec<DrawCommand>) {
        let grid = self.grid;
        let value = grid.cell_value(row, col);
        if value.is_empty() {
            return;
        }

        let default_font;
        let font = match grid.cell(row, col).and_then(|cell| grid.font(cell.font)) {
            Some(font) => font,
            None => {
                default_font = Font::default();
                &default_font
            }
        };
        let font_size = if font.size.is_finite() && font.size > 0.0 {
            font.size
        } else {
            self.config.default_font_size
        };
        let margin = self.config.text_margin.unwrap_or(font_size);

        let metrics = self.metrics;
        let mut failure: Option<MetricsError> = None;
        let lines = TextWrapper::new(rect.width)
            .with_margin(margin)
            .wrap(value, |text| {
                match metrics.measure_width(text, font, font_size) {
                    Ok(width) => width,
                    Err(err) => {
                        failure.get_or_insert(err);
                        worst_case_width(text, font_size)
                    }
                }
            });

        if let Some(error) = failure {
            log::warn!(
                "could not measure text in cell ({row}, {col}) with font {:?}: {error}; using estimate",
                font.name
            );
            self.issues
                .push(LayoutIssue::UnmeasurableText { row, col, error });
        }

        let line_count = lines.len();
        for (index, line) in lines.into_iter().enumerate() {
            if line.text.is_empty() {
                continue;
            }
            commands.push(DrawCommand::Text(TextRun {
                x: centered_x(rect.x, rect.width, line.width),
                y: rect.y + line_baseline_offset(index, line_count, rect.height, font_size),
                text: line.text,
                font: font.name.clone(),
                font_size,
                bold: font.bold,
            }));
        }
    }
}

/// Width estimate when the metrics provider fails: every character a full em.
#[allow(clippy::cast_precision_loss)]
fn worst_case_width(text: &str, font_size: f32) -> f32 {
    font_size * text.chars().count() as f32
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_precision_loss
)]
mod tests {
    use super::*;
    use crate::layout::BreakMode;
    use crate::render::RecordingRenderer;
    use crate::types::{Cell, CellBorders, Font, PageMargins, SheetGrid};

    /// Half a point per character per point of font size.
    fn half_em(text: &str, _font: &Font, size: f32) -> std::result::Result<f32, MetricsError> {
        Ok(text.chars().count() as f32 * size * 0.5)
    }

    fn failing(text: &str, _font: &Font, _size: f32) -> std::result::Result<f32, MetricsError> {
        Err(MetricsError::UnsupportedGlyph(text.chars().next().unwrap_or('?')))
    }

    /// Page with a content box of `width` x `height` at (10, 20).
    fn geometry(width: f32, height: f32) -> PageGeometry {
        PageGeometry {
            width: width + 20.0,
            height: height + 40.0,
            margins: PageMargins {
                left: 10.0,
                right: 10.0,
                top: 20.0,
                bottom: 20.0,
            },
        }
    }

    fn config() -> LayoutConfig {
        LayoutConfig {
            text_margin: Some(0.0),
            ..LayoutConfig::default()
        }
    }

    fn boxed(value: &str) -> Cell {
        Cell::text(value).with_borders(CellBorders::BOXED)
    }

    #[test]
    fn test_single_cell_page() {
        let mut grid = SheetGrid::new("S", vec![50.0], vec![20.0]);
        grid.set_cell(0, 0, boxed("hi"));

        let plan = layout_sheet(&grid, &half_em, &geometry(90.0, 19.0), &config()).unwrap();
        assert_eq!(plan.name, "S");
        assert_eq!(plan.pages.len(), 1);
        let page = &plan.pages[0];
        assert_eq!((page.width, page.height), (110.0, 59.0));

        let borders: Vec<_> = page.borders().collect();
        assert_eq!(
            borders,
            vec![&BorderBox {
                x: 10.0,
                y: 20.0,
                width: 50.0,
                height: 20.0,
                borders: BorderFlags::ALL,
            }]
        );

        let runs: Vec<_> = page.text_runs().collect();
        assert_eq!(runs.len(), 1);
        // "hi" at 11pt is 11 wide; centered in 50 starting at 10
        assert_eq!(runs[0].x, 10.0 + 0.5 * (50.0 - 11.0));
        // Single line baseline: half of (height + font size) below the top
        assert_eq!(runs[0].y, 20.0 + 0.5 * (20.0 + 11.0));
        assert_eq!(runs[0].font, "Calibri");
        assert!(plan.issues.is_empty());
    }

    #[test]
    fn test_border_precedes_text_and_unbordered_cells_emit_only_text() {
        let mut grid = SheetGrid::new("S", vec![40.0, 40.0], vec![20.0]);
        grid.set_cell(0, 0, boxed("a"));
        grid.set_cell(0, 1, Cell::text("b"));

        let plan = layout_sheet(&grid, &half_em, &geometry(200.0, 200.0), &config()).unwrap();
        let ops: Vec<&str> = plan.pages[0]
            .commands
            .iter()
            .map(|c| match c {
                DrawCommand::Border(_) => "border",
                DrawCommand::Text(_) => "text",
            })
            .collect();
        assert_eq!(ops, vec!["border", "text", "text"]);
    }

    #[test]
    fn test_merged_anchor_draws_whole_span_and_members_are_skipped() {
        let mut grid = SheetGrid::new("S", vec![30.0; 3], vec![10.0; 3])
            .with_merge(MergeRange::new(0, 0, 1, 1));
        grid.set_cell(0, 0, boxed("title"));
        grid.set_cell(1, 1, boxed("hidden"));
        grid.set_cell(2, 2, boxed("c"));

        let plan = layout_sheet(&grid, &half_em, &geometry(200.0, 200.0), &config()).unwrap();
        let page = &plan.pages[0];
        let borders: Vec<_> = page.borders().collect();
        assert_eq!(borders.len(), 2);
        assert_eq!((borders[0].width, borders[0].height), (60.0, 20.0));
        // Composite border reads corners: (0,0) top, (0,1) right, (1,1) bottom, (1,0) left
        assert_eq!(
            borders[0].borders,
            BorderFlags::TOP | BorderFlags::BOTTOM
        );
        let texts: Vec<_> = page.text_runs().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["title", "c"]);
    }

    #[test]
    fn test_single_cell_region_is_not_drawn() {
        let mut grid = SheetGrid::new("S", vec![30.0; 2], vec![10.0])
            .with_merge(MergeRange::new(0, 0, 0, 0));
        grid.set_cell(0, 0, boxed("skipped"));
        grid.set_cell(0, 1, boxed("kept"));

        let plan = layout_sheet(&grid, &half_em, &geometry(200.0, 200.0), &config()).unwrap();
        let texts: Vec<_> = plan.pages[0].text_runs().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["kept"]);
        assert_eq!(plan.pages[0].borders().count(), 1);
    }

    #[test]
    fn test_region_split_across_pages_continues() {
        // Two 60pt columns on a 100pt wide page: the region is cut in half
        let mut grid = SheetGrid::new("S", vec![60.0, 60.0], vec![10.0])
            .with_merge(MergeRange::new(0, 0, 0, 1));
        grid.set_cell(0, 0, boxed("wide"));

        let plan = layout_sheet(&grid, &half_em, &geometry(100.0, 100.0), &config()).unwrap();
        assert_eq!(plan.pages.len(), 2);

        let first: Vec<_> = plan.pages[0].borders().collect();
        assert_eq!(first[0].width, 60.0);
        let second: Vec<_> = plan.pages[1].borders().collect();
        assert_eq!(second.len(), 1);
        assert_eq!((second[0].x, second[0].width), (10.0, 60.0));
        let texts: Vec<_> = plan.pages[1].text_runs().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["wide"]);
    }

    #[test]
    fn test_split_region_dropped_without_continuation() {
        let mut grid = SheetGrid::new("S", vec![60.0, 60.0], vec![10.0])
            .with_merge(MergeRange::new(0, 0, 0, 1));
        grid.set_cell(0, 0, boxed("wide"));
        let config = LayoutConfig {
            continue_split_regions: false,
            ..config()
        };

        let plan = layout_sheet(&grid, &half_em, &geometry(100.0, 100.0), &config).unwrap();
        assert_eq!(plan.pages.len(), 2);
        assert!(plan.pages[1].commands.is_empty());
    }

    #[test]
    fn test_missing_cells_draw_nothing() {
        let grid = SheetGrid::new("S", vec![30.0; 4], vec![10.0; 4]);
        let plan = layout_sheet(&grid, &half_em, &geometry(200.0, 200.0), &config()).unwrap();
        assert_eq!(plan.pages.len(), 1);
        assert!(plan.pages[0].commands.is_empty());
        assert!(plan.issues.is_empty());
    }

    #[test]
    fn test_hidden_column_is_degenerate() {
        let mut grid = SheetGrid::new("S", vec![30.0, 0.0, 30.0], vec![10.0]);
        grid.set_cell(0, 1, boxed("hidden"));
        let plan = layout_sheet(&grid, &half_em, &geometry(200.0, 200.0), &config()).unwrap();
        assert!(plan.pages[0].text_runs().all(|t| t.text != "hidden"));
        assert_eq!(
            plan.issues,
            vec![LayoutIssue::DegenerateSpan {
                row: 0,
                col: 1,
                width: 0.0,
                height: 10.0,
            }]
        );
    }

    #[test]
    fn test_hidden_blank_cells_are_not_reported() {
        // Row 1 is hidden: (1, 0) is blank, (1, 1) has only borders, (1, 2) has text
        let mut grid = SheetGrid::new("S", vec![30.0; 4], vec![10.0, 0.0, 10.0]);
        grid.set_cell(1, 1, boxed(""));
        grid.set_cell(1, 2, Cell::text("note"));
        grid.set_cell(2, 0, Cell::text("after"));

        let plan = layout_sheet(&grid, &half_em, &geometry(200.0, 200.0), &config()).unwrap();
        let cols: Vec<u32> = plan
            .issues
            .iter()
            .map(|issue| match issue {
                LayoutIssue::DegenerateSpan { row: 1, col, .. } => *col,
                other => panic!("unexpected issue {other:?}"),
            })
            .collect();
        assert_eq!(cols, vec![1, 2]);
        let texts: Vec<_> = plan.pages[0].text_runs().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["after"]);
    }

    #[test]
    fn test_metrics_failure_uses_estimate_and_is_reported_once() {
        let mut grid = SheetGrid::new("S", vec![100.0], vec![40.0]);
        grid.set_cell(0, 0, Cell::text("ab cd"));

        let plan = layout_sheet(&grid, &failing, &geometry(200.0, 200.0), &config()).unwrap();
        assert_eq!(
            plan.issues,
            vec![LayoutIssue::UnmeasurableText {
                row: 0,
                col: 0,
                error: MetricsError::UnsupportedGlyph('a'),
            }]
        );
        // 5 chars * 11pt = 55 wide, fits in 100
        let runs: Vec<_> = plan.pages[0].text_runs().collect();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].x, 10.0 + 0.5 * (100.0 - 55.0));
    }

    #[test]
    fn test_cell_font_drives_size_and_weight() {
        let mut grid = SheetGrid::new("S", vec![100.0], vec![40.0]);
        let font = grid.add_font(Font {
            name: "Arial".into(),
            size: 20.0,
            bold: true,
        });
        grid.set_cell(0, 0, Cell::text("x").with_font(font));

        let plan = layout_sheet(&grid, &half_em, &geometry(200.0, 200.0), &config()).unwrap();
        let run = plan.pages[0].text_runs().next().unwrap();
        assert_eq!(run.font, "Arial");
        assert_eq!(run.font_size, 20.0);
        assert!(run.bold);
    }

    #[test]
    fn test_blank_lines_take_space_but_draw_nothing() {
        let mut grid = SheetGrid::new("S", vec![100.0], vec![60.0]);
        grid.set_cell(0, 0, Cell::text("a\n\nb"));

        let plan = layout_sheet(&grid, &half_em, &geometry(200.0, 200.0), &config()).unwrap();
        let ys: Vec<f32> = plan.pages[0].text_runs().map(|t| t.y).collect();
        assert_eq!(ys.len(), 2);
        // Three lines 16.5pt apart; the middle one is blank
        assert_eq!(ys[1] - ys[0], 2.0 * 1.5 * 11.0);
    }

    #[test]
    fn test_empty_grid_is_fatal() {
        let grid = SheetGrid::new("S", vec![], vec![]);
        assert!(layout_sheet(&grid, &half_em, &geometry(100.0, 100.0), &config()).is_err());
    }

    #[test]
    fn test_legacy_mode_can_yield_no_pages() {
        let mut grid = SheetGrid::new("S", vec![50.0], vec![20.0]);
        grid.set_cell(0, 0, boxed("x"));
        let config = LayoutConfig {
            break_mode: BreakMode::Legacy,
            ..config()
        };
        let plan = layout_sheet(&grid, &half_em, &geometry(90.0, 19.0), &config).unwrap();
        assert!(plan.pages.is_empty());
    }

    #[test]
    fn test_render_sheet_replays_in_order() {
        let mut grid = SheetGrid::new("S", vec![60.0, 60.0], vec![10.0]);
        grid.set_cell(0, 0, boxed("a"));
        grid.set_cell(0, 1, boxed("b"));

        let mut recorder = RecordingRenderer::new();
        let plan = render_sheet(
            &grid,
            &half_em,
            &geometry(100.0, 100.0),
            &config(),
            &mut recorder,
        )
        .unwrap();

        let sheets = recorder.into_sheets();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "S");
        assert_eq!(sheets[0].pages, plan.pages);
    }
}
