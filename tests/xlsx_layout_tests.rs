//! End-to-end tests: XLSX bytes built in memory, parsed into grids, laid out
//! onto pages and replayed into renderers.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

mod fixtures;

use fixtures::{CellValue, SheetBuilder, StyleBuilder, XlsxBuilder};
use xlpager::render::{RecordingRenderer, SvgRenderer};
use xlpager::{
    layout_workbook, parse, render_workbook, BorderFlags, CellBorders, CharWidthMetrics,
    GridProvider, LayoutConfig, LayoutIssue, MergeRange, Orientation, PageMargins, PageSetup,
    SheetGrid, SheetPlan, Workbook, XlpagerError,
};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

fn parse_single(sheet: SheetBuilder) -> SheetGrid {
    let xlsx = XlsxBuilder::new().sheet(sheet).build();
    let mut workbook = parse(&xlsx).unwrap();
    assert_eq!(workbook.sheets.len(), 1);
    workbook.sheets.remove(0)
}

fn layout(workbook: &Workbook) -> Vec<SheetPlan> {
    layout_workbook(workbook, &CharWidthMetrics::new(), &LayoutConfig::default()).unwrap()
}

fn texts(plan: &SheetPlan, page: usize) -> Vec<String> {
    plan.pages[page]
        .text_runs()
        .map(|run| run.text.clone())
        .collect()
}

// ============================================================================
// PARSING
// ============================================================================

#[test]
fn test_cell_values_by_type() {
    let grid = parse_single(
        SheetBuilder::new("Values")
            .cell("A1", "Hello", None)
            .cell("B1", 42.5, None)
            .cell("C1", true, None)
            .cell("D1", CellValue::Inline("a & b".into()), None)
            .cell("A2", "Hello", None),
    );

    assert_eq!(grid.name, "Values");
    assert_eq!(grid.row_count(), 2);
    assert_eq!(grid.col_count(), 4);
    assert_eq!(grid.cell_value(0, 0), "Hello");
    assert_eq!(grid.cell_value(0, 1), "42.5");
    assert_eq!(grid.cell_value(0, 2), "TRUE");
    assert_eq!(grid.cell_value(0, 3), "a & b");
    assert_eq!(grid.cell_value(1, 0), "Hello");
    assert_eq!(grid.cell_value(1, 3), "");
}

#[test]
fn test_number_formats_shape_cell_text() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Formats")
                .cell("A1", 0.5, Some(StyleBuilder::new().builtin_format(9)))
                .cell("B1", 1234.5, Some(StyleBuilder::new().number_format("#,##0.00")))
                .cell("C1", 45306.0, Some(StyleBuilder::new().number_format("yyyy-mm-dd")))
                .cell("D1", -3.0, Some(StyleBuilder::new().number_format("0.0;(0.0)")))
                .cell("E1", 7.25, None)
                .cell("F1", "12", Some(StyleBuilder::new().builtin_format(9))),
        )
        .build();
    let workbook = parse(&xlsx).unwrap();
    let grid = &workbook.sheets[0];

    assert_eq!(grid.cell_value(0, 0), "50%");
    assert_eq!(grid.cell_value(0, 1), "1,234.50");
    assert_eq!(grid.cell_value(0, 2), "2024-01-15");
    assert_eq!(grid.cell_value(0, 3), "(3.0)");
    assert_eq!(grid.cell_value(0, 4), "7.25");
    // Shared strings are text even when they look numeric
    assert_eq!(grid.cell_value(0, 5), "12");

    let plans = layout(&workbook);
    assert!(texts(&plans[0], 0).contains(&"2024-01-15".to_string()));
}

#[test]
fn test_dates_follow_the_1904_system() {
    let xlsx = XlsxBuilder::new()
        .date1904()
        .sheet(
            SheetBuilder::new("Mac")
                .cell("A1", 43844.0, Some(StyleBuilder::new().number_format("yyyy-mm-dd"))),
        )
        .build();
    let workbook = parse(&xlsx).unwrap();
    assert_eq!(workbook.sheets[0].cell_value(0, 0), "2024-01-15");
}

#[test]
fn test_default_extents_in_points() {
    let grid = parse_single(SheetBuilder::new("S").cell("B3", "x", None));
    assert_eq!(grid.row_count(), 3);
    assert_eq!(grid.col_count(), 2);
    // 64px default columns and 20px default rows
    assert_eq!(grid.col_width(0), 48.0);
    assert_eq!(grid.row_height(2), 15.0);
}

#[test]
fn test_column_widths_and_hidden_columns() {
    let grid = parse_single(
        SheetBuilder::new("Cols")
            .cell("C1", "x", None)
            .col_width(2, 2, 20.0)
            .hide_cols(3, 3),
    );
    assert_eq!(grid.col_widths, vec![48.0, 105.0, 0.0]);
}

#[test]
fn test_sheet_default_column_width() {
    let grid = parse_single(
        SheetBuilder::new("Wide")
            .cell("A1", "x", None)
            .default_col_width(10.0),
    );
    // 10 characters of Calibri plus padding is 75px
    assert_eq!(grid.col_width(0), 56.25);
}

#[test]
fn test_row_heights_and_hidden_rows() {
    let grid = parse_single(
        SheetBuilder::new("Rows")
            .cell("A1", "a", None)
            .cell("A3", "c", None)
            .row_height(1, 30.0)
            .hide_row(2)
            .row_height(5, 22.5),
    );
    // Row 5 only carries a height but still extends the grid
    assert_eq!(grid.row_heights, vec![30.0, 0.0, 15.0, 15.0, 22.5]);
}

#[test]
fn test_borders_and_fonts_from_styles() {
    let grid = parse_single(
        SheetBuilder::new("Styled")
            .cell(
                "A1",
                "Head",
                Some(
                    StyleBuilder::new()
                        .font_name("Arial")
                        .font_size(14.0)
                        .bold()
                        .border_all("thin"),
                ),
            )
            .cell(
                "B1",
                "Side",
                Some(StyleBuilder::new().border_left("medium").border_bottom("none")),
            )
            .styled_cell("C1", StyleBuilder::new().border_top("thin")),
    );

    assert_eq!(grid.cell_borders(0, 0), CellBorders::BOXED);
    assert_eq!(
        grid.cell_borders(0, 1),
        CellBorders {
            left: true,
            ..CellBorders::default()
        }
    );

    // Styled empty cells keep their borders
    let empty = grid.cell(0, 2).unwrap();
    assert_eq!(empty.v, "");
    assert!(empty.borders.top);

    let head = grid.cell(0, 0).unwrap();
    let font = grid.font(head.font).unwrap();
    assert_eq!(font.name, "Arial");
    assert_eq!(font.size, 14.0);
    assert!(font.bold);

    let side_font = grid.font(grid.cell(0, 1).unwrap().font).unwrap();
    assert_eq!(side_font.name, "Calibri");
    assert!(!side_font.bold);
}

#[test]
fn test_merges_and_page_setup() {
    let grid = parse_single(
        SheetBuilder::new("Setup")
            .cell("A1", "Title", None)
            .merge("A1:C2")
            .page_setup(9, "landscape")
            .margins(0.5, 0.5, 1.0, 1.0),
    );

    assert_eq!(grid.merged_regions(), &[MergeRange::new(0, 0, 1, 2)]);
    // Merged members are not written, the region still sizes the grid
    assert_eq!(grid.row_count(), 2);
    assert_eq!(grid.col_count(), 3);
    assert_eq!(
        grid.page_setup,
        Some(PageSetup {
            paper_size: Some(9),
            orientation: Some(Orientation::Landscape),
            margins: Some(PageMargins {
                left: 36.0,
                right: 36.0,
                top: 72.0,
                bottom: 72.0,
            }),
        })
    );
}

#[test]
fn test_raw_sheet_without_cell_references() {
    let grid = parse_single(SheetBuilder::new("Raw").raw_xml(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1"><c t="inlineStr"><is><t>x</t></is></c><c><v>5</v></c></row>
    <row><c t="e"><v>#N/A</v></c></row>
  </sheetData>
  <mergeCells count="2"><mergeCell ref="bogus"/><mergeCell ref="B2:C3"/></mergeCells>
</worksheet>"#,
    ));

    assert_eq!(grid.cell_value(0, 0), "x");
    assert_eq!(grid.cell_value(0, 1), "5");
    assert_eq!(grid.cell_value(1, 0), "#N/A");
    assert_eq!(grid.merged_regions(), &[MergeRange::new(1, 1, 2, 2)]);
    assert_eq!(grid.row_count(), 3);
    assert_eq!(grid.col_count(), 3);
}

#[test]
fn test_sheet_order_and_names() {
    let xlsx = XlsxBuilder::new()
        .sheet(SheetBuilder::new("P&L").cell("A1", 1.0, None))
        .sheet(SheetBuilder::new("Empty"))
        .sheet(SheetBuilder::new("Notes").cell("A1", "n", None))
        .build();
    let workbook = parse(&xlsx).unwrap();
    let names: Vec<_> = workbook.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["P&L", "Empty", "Notes"]);
    assert_eq!(workbook.sheets[1].row_count(), 0);

    // The empty sheet is skipped during layout
    let plans = layout(&workbook);
    let laid_out: Vec<_> = plans.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(laid_out, vec!["P&L", "Notes"]);
}

#[test]
fn test_invalid_archive_is_an_error() {
    let err = parse(b"definitely not a zip").unwrap_err();
    assert!(matches!(err, XlpagerError::Zip(_)));
}

// ============================================================================
// LAYOUT
// ============================================================================

#[test]
fn test_merged_title_draws_once_with_composite_border() {
    let boxed = StyleBuilder::new().border_all("thin");
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Report")
                .cell("A1", "Quarterly", Some(boxed.clone()))
                .styled_cell("B1", boxed.clone())
                .styled_cell("C1", boxed)
                .merge("A1:C1")
                .cell("A2", 1.0, None)
                .cell("B2", 2.0, None)
                .cell("C2", 3.0, None),
        )
        .build();
    let plans = layout(&parse(&xlsx).unwrap());

    assert_eq!(plans.len(), 1);
    let plan = &plans[0];
    assert_eq!(plan.pages.len(), 1);
    assert!(plan.issues.is_empty());

    let page = &plan.pages[0];
    let borders: Vec<_> = page.borders().collect();
    assert_eq!(borders.len(), 1);
    assert_eq!(borders[0].borders, BorderFlags::ALL);
    assert!(approx(borders[0].x, 17.86));
    assert!(approx(borders[0].y, 15.0));
    assert!(approx(borders[0].width, 144.0));
    assert!(approx(borders[0].height, 15.0));

    assert_eq!(texts(plan, 0), vec!["Quarterly", "1", "2", "3"]);

    // Single line baseline: 0.5 * (15 + 11) below the row top
    let title = page.text_runs().next().unwrap();
    assert!(approx(title.y, 28.0));
    assert!(title.x > 17.86 && title.x < 17.86 + 72.0);
}

#[test]
fn test_long_sheet_breaks_into_row_bands() {
    let mut sheet = SheetBuilder::new("Long");
    for row in 1..=100 {
        sheet = sheet.cell(&format!("A{row}"), f64::from(row), None);
    }
    let xlsx = XlsxBuilder::new().sheet(sheet).build();
    let plans = layout(&parse(&xlsx).unwrap());

    let pages = &plans[0].pages;
    assert_eq!(pages.len(), 2);
    // A4 content height is 811.89pt: 54 rows of 15pt fit
    assert_eq!(pages[0].tile.row_count, 54);
    assert_eq!(pages[1].tile.start_row, 54);
    assert_eq!(pages[1].tile.row_count, 46);
    assert_eq!(texts(&plans[0], 1).first().map(String::as_str), Some("55"));
}

#[test]
fn test_region_split_across_pages_continues() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Split")
                .cell("A50", "Tall", None)
                .cell("A60", "end", None)
                .merge("A50:A59"),
        )
        .build();
    let workbook = parse(&xlsx).unwrap();

    let plans = layout(&workbook);
    assert_eq!(plans[0].pages.len(), 2);
    assert_eq!(texts(&plans[0], 0), vec!["Tall"]);
    assert_eq!(texts(&plans[0], 1), vec!["Tall", "end"]);

    let config = LayoutConfig {
        continue_split_regions: false,
        ..LayoutConfig::default()
    };
    let plans = layout_workbook(&workbook, &CharWidthMetrics::new(), &config).unwrap();
    assert_eq!(texts(&plans[0], 1), vec!["end"]);
}

#[test]
fn test_hidden_row_is_reported_not_drawn() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Hidden")
                .cell("A1", "a", None)
                .cell("A2", "secret", None)
                .cell("A3", "c", None)
                .hide_row(2),
        )
        .build();
    let plans = layout(&parse(&xlsx).unwrap());

    assert_eq!(texts(&plans[0], 0), vec!["a", "c"]);
    assert!(plans[0]
        .issues
        .iter()
        .any(|issue| matches!(issue, LayoutIssue::DegenerateSpan { row: 1, col: 0, .. })));
}

#[test]
fn test_styled_font_reaches_text_runs() {
    let xlsx = XlsxBuilder::new()
        .sheet(SheetBuilder::new("Fonts").cell(
            "A1",
            "Bold",
            Some(StyleBuilder::new().font_name("Arial").font_size(14.0).bold()),
        ))
        .build();
    let plans = layout(&parse(&xlsx).unwrap());
    let run = plans[0].pages[0].text_runs().next().unwrap();
    assert_eq!(run.font, "Arial");
    assert_eq!(run.font_size, 14.0);
    assert!(run.bold);
}

#[test]
fn test_sheet_page_setup_and_config_override() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Landscape")
                .cell("A1", "x", None)
                .page_setup(9, "landscape"),
        )
        .build();
    let workbook = parse(&xlsx).unwrap();

    let page = &layout(&workbook)[0].pages[0];
    assert!(approx(page.width, 841.89));
    assert!(approx(page.height, 595.28));

    let config = LayoutConfig {
        ignore_sheet_setup: true,
        ..LayoutConfig::default()
    };
    let plans = layout_workbook(&workbook, &CharWidthMetrics::new(), &config).unwrap();
    assert!(approx(plans[0].pages[0].width, 595.28));
}

#[test]
fn test_sheet_margins_wider_than_the_paper_are_ignored() {
    let xlsx = XlsxBuilder::new()
        .sheet(SheetBuilder::new("Good").cell("A1", "ok", None))
        .sheet(
            SheetBuilder::new("Bad")
                .cell("A1", "kept", None)
                .margins(6.0, 6.0, 0.75, 0.75),
        )
        .build();
    let workbook = parse(&xlsx).unwrap();
    assert_eq!(
        workbook.sheets[1].page_setup.as_ref().unwrap().margins,
        Some(PageMargins {
            left: 432.0,
            right: 432.0,
            top: 54.0,
            bottom: 54.0,
        })
    );

    let plans = layout(&workbook);
    assert_eq!(plans.len(), 2);
    assert_eq!(texts(&plans[1], 0), vec!["kept"]);
}

// ============================================================================
// RENDERING
// ============================================================================

fn report_workbook() -> Workbook {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Report")
                .cell("A1", "Fish & Chips", Some(StyleBuilder::new().border_all("thin")))
                .cell("B1", 9.5, None),
        )
        .sheet(SheetBuilder::new("Second").cell("A1", "two", None))
        .build();
    parse(&xlsx).unwrap()
}

#[test]
fn test_recording_renderer_matches_plans() {
    let workbook = report_workbook();
    let mut recorder = RecordingRenderer::new();
    let plans = render_workbook(
        &workbook,
        &CharWidthMetrics::new(),
        &LayoutConfig::default(),
        &mut recorder,
    )
    .unwrap();

    assert_eq!(recorder.page_count(), 2);
    let sheets = recorder.into_sheets();
    assert_eq!(sheets[0].name, "Report");
    assert_eq!(sheets[1].name, "Second");
    assert_eq!(sheets[0].pages, plans[0].pages);
}

#[test]
fn test_svg_renderer_writes_one_document_per_page() {
    let workbook = report_workbook();
    let mut svg = SvgRenderer::new();
    render_workbook(
        &workbook,
        &CharWidthMetrics::new(),
        &LayoutConfig::default(),
        &mut svg,
    )
    .unwrap();

    let pages = svg.into_pages();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].file_name(), "Report-1.svg");
    assert!(pages[0].svg.contains("<line"));
    assert!(pages[0].svg.contains("Fish &amp; Chips"));
    assert!(pages[1].svg.contains(">two<"));
}

#[test]
fn test_plan_serializes_to_tagged_json() {
    let plans = layout(&report_workbook());
    let json = serde_json::to_value(&plans).unwrap();
    let commands = &json[0]["pages"][0]["commands"];
    assert_eq!(commands[0]["op"], "border");
    assert_eq!(commands[0]["borders"], 15);
    assert_eq!(commands[1]["op"], "text");
    assert_eq!(commands[1]["text"], "Fish & Chips");
    assert_eq!(json[0]["pages"][0]["tile"]["rowCount"], 1);
}
