//! Whole-workbook driver.
//!
//! Sheets are independent, so they are laid out in parallel. Rendering is a
//! single ordered sink and stays sequential: one sheet's pages are fully
//! flushed before the next sheet begins.

use rayon::prelude::*;

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::grid::{GridProvider, MetricsProvider};
use crate::layout::{layout_sheet, SheetPlan};
use crate::render::Renderer;
use crate::types::{SheetGrid, Workbook};

fn is_empty_sheet(sheet: &SheetGrid) -> bool {
    sheet.row_count() == 0 || sheet.col_count() == 0
}

/// Lay out every non-empty sheet, in sheet order.
///
/// Sheets without rows or columns are skipped rather than failing the whole
/// workbook. Any other sheet error is returned.
pub fn layout_workbook<M>(
    workbook: &Workbook,
    metrics: &M,
    config: &LayoutConfig,
) -> Result<Vec<SheetPlan>>
where
    M: MetricsProvider + Sync + ?Sized,
{
    config.validate()?;

    workbook
        .sheets
        .par_iter()
        .filter(|sheet| {
            let empty = is_empty_sheet(sheet);
            if empty {
                log::debug!("skipping empty sheet {:?}", sheet.name);
            }
            !empty
        })
        .map(|sheet| {
            let geometry = config.geometry_for(sheet.page_setup.as_ref());
            let plan = layout_sheet(sheet, metrics, &geometry, config)?;
            log::debug!(
                "sheet {:?}: {} pages, {} issues",
                plan.name,
                plan.pages.len(),
                plan.issues.len()
            );
            Ok(plan)
        })
        .collect()
}

/// Lay out the workbook and replay every sheet into `renderer`.
pub fn render_workbook<M, R>(
    workbook: &Workbook,
    metrics: &M,
    config: &LayoutConfig,
    renderer: &mut R,
) -> Result<Vec<SheetPlan>>
where
    M: MetricsProvider + Sync + ?Sized,
    R: Renderer + ?Sized,
{
    let plans = layout_workbook(workbook, metrics, config)?;
    for plan in &plans {
        plan.replay(renderer)?;
    }
    Ok(plans)
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
    use crate::metrics::CharWidthMetrics;
    use crate::render::RecordingRenderer;
    use crate::types::{Cell, Orientation, PageMargins, PageSetup};

    fn sheet(name: &str, rows: usize) -> SheetGrid {
        let mut grid = SheetGrid::new(name, vec![64.0; 3], vec![15.0; rows]);
        if rows > 0 {
            grid.set_cell(0, 0, Cell::text(name));
        }
        grid
    }

    #[test]
    fn test_plans_keep_sheet_order_and_skip_empty() {
        let workbook = Workbook {
            sheets: vec![
                sheet("a", 200),
                sheet("empty", 0),
                sheet("b", 3),
                sheet("c", 120),
            ],
        };
        let plans =
            layout_workbook(&workbook, &CharWidthMetrics::new(), &LayoutConfig::default())
                .unwrap();
        let names: Vec<_> = plans.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(plans[0].pages.len() > 1);
        assert_eq!(plans[1].pages.len(), 1);
    }

    #[test]
    fn test_sheet_page_setup_is_honored() {
        let mut landscape = sheet("wide", 2);
        landscape.page_setup = Some(PageSetup {
            paper_size: Some(9),
            orientation: Some(Orientation::Landscape),
            margins: None,
        });
        let workbook = Workbook {
            sheets: vec![sheet("tall", 2), landscape],
        };
        let plans =
            layout_workbook(&workbook, &CharWidthMetrics::new(), &LayoutConfig::default())
                .unwrap();
        assert!(plans[0].pages[0].width < plans[0].pages[0].height);
        assert!(plans[1].pages[0].width > plans[1].pages[0].height);
    }

    #[test]
    fn test_sheet_with_oversized_margins_still_lays_out() {
        let mut cramped = sheet("cramped", 2);
        cramped.page_setup = Some(PageSetup {
            margins: Some(PageMargins::uniform(400.0)),
            ..PageSetup::default()
        });
        let workbook = Workbook {
            sheets: vec![sheet("fine", 2), cramped],
        };
        let plans =
            layout_workbook(&workbook, &CharWidthMetrics::new(), &LayoutConfig::default())
                .unwrap();
        let names: Vec<_> = plans.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["fine", "cramped"]);
        assert_eq!(plans[1].pages.len(), 1);
        assert_eq!(plans[1].pages[0].text_runs().count(), 1);
    }

    #[test]
    fn test_render_workbook_flushes_sheets_in_order() {
        let workbook = Workbook {
            sheets: vec![sheet("first", 100), sheet("second", 2)],
        };
        let mut recorder = RecordingRenderer::new();
        let plans = render_workbook(
            &workbook,
            &CharWidthMetrics::new(),
            &LayoutConfig::default(),
            &mut recorder,
        )
        .unwrap();

        let sheets = recorder.into_sheets();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].name, "first");
        assert_eq!(sheets[0].pages, plans[0].pages);
        assert_eq!(sheets[1].pages, plans[1].pages);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = LayoutConfig {
            default_font_size: -1.0,
            ..LayoutConfig::default()
        };
        let workbook = Workbook {
            sheets: vec![sheet("a", 1)],
        };
        assert!(layout_workbook(&workbook, &CharWidthMetrics::new(), &config).is_err());
    }
}
