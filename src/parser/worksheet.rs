//! Worksheet parsing: one sheet XML part into a [`SheetGrid`].

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::error::{Result, XlpagerError};
use crate::numfmt::NumberFormat;
use crate::page_setup::{parse_page_margins, parse_page_setup};
use crate::types::{Cell, CellData, MergeRange, PageMargins, PageSetup, SheetGrid};
use crate::xml_helpers::{attr_bool, attr_f64, attr_string, attr_u32};

use super::styles::StyleTable;

/// Column width in characters when a sheet declares none.
const DEFAULT_COL_WIDTH_CHARS: f64 = 8.43;
/// Row height in points when a sheet declares none.
const DEFAULT_ROW_HEIGHT: f64 = 15.0;
const POINTS_PER_PIXEL: f64 = 0.75;

/// Sheet metadata from workbook.xml
#[derive(Debug, Clone)]
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
}

/// Workbook-wide tables every sheet is read against.
#[derive(Debug, Clone, Copy)]
pub(super) struct SheetContext<'a> {
    pub shared_strings: &'a [String],
    pub styles: &'a StyleTable,
    /// Maximum digit width of the Normal font, in pixels
    pub digit_width: f64,
    pub date1904: bool,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    std::str::from_utf8(value).ok()?.trim().parse().ok()
}

/// Stored column width (characters) to points, via whole pixels.
///
/// Excel rounds to pixels using the maximum digit width of the Normal font.
#[allow(clippy::cast_possible_truncation)]
fn col_width_points(width: f64, digit_width: f64) -> f32 {
    if width <= 0.0 {
        return 0.0;
    }
    let padding = (128.0 / digit_width).trunc();
    let px = ((256.0 * width + padding) / 256.0 * digit_width).trunc();
    (px * POINTS_PER_PIXEL) as f32
}

/// `defaultColWidth` counts visible characters; add cell padding before converting.
#[allow(clippy::cast_possible_truncation)]
fn default_col_width_points(chars: f64, digit_width: f64) -> f32 {
    let stored = ((chars * digit_width + 5.0) / digit_width * 256.0).floor() / 256.0;
    col_width_points(stored, digit_width)
}

/// Resolve a raw `<v>`/`<t>` payload to display text.
///
/// Numbers go through the cell's number format when it has one and keep
/// their stored lexical form otherwise.
fn resolve_value(
    raw: Option<String>,
    tag: CellTypeTag,
    shared_strings: &[String],
    format: Option<&NumberFormat>,
    date1904: bool,
) -> String {
    let raw = raw.unwrap_or_default();
    match tag {
        CellTypeTag::Shared => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|idx| shared_strings.get(idx))
            .cloned()
            .unwrap_or_default(),
        CellTypeTag::Bool => match raw.trim() {
            "1" | "true" => "TRUE".to_string(),
            "0" | "false" => "FALSE".to_string(),
            _ => raw,
        },
        CellTypeTag::Default => match (format, raw.trim().parse::<f64>()) {
            (Some(format), Ok(number)) if number.is_finite() => format.format(number, date1904),
            _ => raw,
        },
        CellTypeTag::Inline | CellTypeTag::Str | CellTypeTag::Error => raw,
    }
}

/// Read the children of a `<c>` element up to its end tag.
///
/// Text inside `<v>` and `<t>` is collected (rich inline runs concatenate);
/// formulas and phonetic runs are ignored.
fn read_cell_value<B: BufRead>(xml: &mut Reader<B>, buf: &mut Vec<u8>) -> Result<Option<String>> {
    let mut value: Option<String> = None;
    let mut capture = false;
    let mut in_phonetic = false;

    loop {
        buf.clear();
        match xml.read_event_into(buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"rPh" => in_phonetic = true,
                b"v" | b"t" if !in_phonetic => capture = true,
                _ => {}
            },
            Ok(Event::Text(ref t)) if capture => {
                let text = t.unescape()?;
                value.get_or_insert_with(String::new).push_str(&text);
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"v" | b"t" => capture = false,
                b"rPh" => in_phonetic = false,
                b"c" => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    Ok(value)
}

#[derive(Debug, Clone, Copy)]
struct ColumnDef {
    min: u32,
    max: u32,
    width: Option<f64>,
    hidden: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct RowDef {
    height: Option<f64>,
    hidden: bool,
}

/// Everything collected from one worksheet before the grid is assembled.
#[derive(Debug, Default)]
struct SheetParts {
    cells: Vec<CellData>,
    columns: Vec<ColumnDef>,
    rows: HashMap<u32, RowDef>,
    merges: Vec<MergeRange>,
    default_col_chars: Option<f64>,
    default_row_height: Option<f64>,
    page_setup: Option<PageSetup>,
    margins: Option<PageMargins>,
    row_count: u32,
    col_count: u32,
}

impl SheetParts {
    #[allow(clippy::cast_possible_truncation)]
    fn into_grid(mut self, name: &str, styles: &StyleTable, digit_width: f64) -> SheetGrid {
        // Unstyled merge members are not written, so regions widen the grid too
        for region in &self.merges {
            self.row_count = self.row_count.max(region.end_row.saturating_add(1));
            self.col_count = self.col_count.max(region.end_col.saturating_add(1));
        }

        let default_width = default_col_width_points(
            self.default_col_chars.unwrap_or(DEFAULT_COL_WIDTH_CHARS),
            digit_width,
        );
        let mut col_widths = vec![default_width; self.col_count as usize];
        for def in &self.columns {
            let first = def.min.saturating_sub(1);
            let last = def.max.min(self.col_count);
            for col in first..last {
                if let Some(width) = col_widths.get_mut(col as usize) {
                    *width = if def.hidden {
                        0.0
                    } else {
                        def.width.map_or(default_width, |w| col_width_points(w, digit_width))
                    };
                }
            }
        }

        let default_height = self.default_row_height.unwrap_or(DEFAULT_ROW_HEIGHT) as f32;
        let row_heights = (0..self.row_count)
            .map(|row| match self.rows.get(&row) {
                Some(def) if def.hidden => 0.0,
                Some(RowDef {
                    height: Some(h), ..
                }) => (*h).max(0.0) as f32,
                _ => default_height,
            })
            .collect();

        let mut grid = SheetGrid::from_cells(name, col_widths, row_heights, self.cells);
        grid.fonts.clone_from(&styles.fonts);
        grid.merges = self.merges;
        if self.page_setup.is_some() || self.margins.is_some() {
            let mut setup = self.page_setup.unwrap_or_default();
            setup.margins = self.margins;
            grid.page_setup = Some(setup);
        }
        grid
    }
}

/// Parse a single worksheet part into a grid.
///
/// The grid spans every row that appears as a `<row>` or holds a cell, and
/// as many columns as the widest row. Merged regions extend both.
#[allow(clippy::too_many_lines)]
pub(super) fn parse_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    ctx: SheetContext<'_>,
) -> Result<SheetGrid> {
    let styles = ctx.styles;
    let file = archive.by_name(&info.path)?;

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut parts = SheetParts::default();
    let mut buf = Vec::new();
    let mut cell_buf = Vec::new();
    // 1-based row of the open <row>, and the next column for cells without r=
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 0;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                let is_start_event = matches!(event, Event::Start(_));

                match e.local_name().as_ref() {
                    b"sheetFormatPr" => {
                        parts.default_col_chars = attr_f64(e, b"defaultColWidth");
                        parts.default_row_height = attr_f64(e, b"defaultRowHeight");
                    }

                    b"col" => {
                        let min = attr_u32(e, b"min").unwrap_or(0);
                        let max = attr_u32(e, b"max").unwrap_or(min);
                        if min > 0 && max >= min {
                            parts.columns.push(ColumnDef {
                                min,
                                max,
                                width: attr_f64(e, b"width"),
                                hidden: attr_bool(e, b"hidden").unwrap_or(false),
                            });
                        }
                    }

                    b"row" => {
                        current_row = attr_u32(e, b"r")
                            .filter(|&r| r > 0)
                            .unwrap_or_else(|| current_row.saturating_add(1));
                        next_col = 0;

                        let def = RowDef {
                            height: attr_f64(e, b"ht"),
                            hidden: attr_bool(e, b"hidden").unwrap_or(false),
                        };
                        parts.rows.insert(current_row - 1, def);
                        parts.row_count = parts.row_count.max(current_row);
                    }

                    b"c" => {
                        let mut position: Option<(u32, u32)> = None;
                        let mut cell_type = CellTypeTag::Default;
                        let mut style_idx: Option<u32> = None;

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => position = parse_cell_ref_bytes(&attr.value),
                                b"t" => cell_type = parse_cell_type_tag(&attr.value),
                                b"s" => style_idx = parse_u32_bytes(&attr.value),
                                _ => {}
                            }
                        }

                        let value = if is_start_event {
                            read_cell_value(&mut xml, &mut cell_buf)?
                        } else {
                            None
                        };

                        let (row, col) = position
                            .unwrap_or((current_row.saturating_sub(1), next_col));
                        next_col = col.saturating_add(1);
                        parts.row_count = parts.row_count.max(row.saturating_add(1));
                        parts.col_count = parts.col_count.max(col.saturating_add(1));

                        let text = resolve_value(
                            value,
                            cell_type,
                            ctx.shared_strings,
                            styles.number_format(style_idx),
                            ctx.date1904,
                        );
                        let cell = Cell::text(text)
                            .with_borders(styles.borders(style_idx))
                            .with_font(styles.font_ref(style_idx));
                        parts.cells.push(CellData { r: row, c: col, cell });
                    }

                    b"mergeCell" => {
                        if let Some(reference) = attr_string(e, b"ref") {
                            match reference.parse::<MergeRange>() {
                                Ok(range) => parts.merges.push(range),
                                Err(err) => {
                                    log::warn!("sheet {:?}: skipping merge: {err}", info.name);
                                }
                            }
                        }
                    }

                    b"pageMargins" => parts.margins = Some(parse_page_margins(e)),
                    b"pageSetup" => parts.page_setup = Some(parse_page_setup(e)),

                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(XlpagerError::Parse(format!("{}: {e}", info.path)));
            }
            _ => {}
        }
        buf.clear();
    }

    log::debug!(
        "sheet {:?}: {} rows x {} cols, {} cells, {} merges",
        info.name,
        parts.row_count,
        parts.col_count,
        parts.cells.len(),
        parts.merges.len()
    );

    Ok(parts.into_grid(&info.name, styles, ctx.digit_width))
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
    fn test_default_column_width_is_64px() {
        // 8.43 characters of Calibri is the familiar 64 pixel column
        assert_eq!(default_col_width_points(8.43, 7.0), 48.0);
    }

    #[test]
    fn test_stored_column_widths() {
        assert_eq!(col_width_points(9.140625, 7.0), 48.0);
        // 20 characters: trunc((5120 + 18) / 256 * 7) = 140 px
        assert_eq!(col_width_points(20.0, 7.0), 105.0);
        assert_eq!(col_width_points(0.0, 7.0), 0.0);
    }

    #[test]
    fn test_resolve_value() {
        let strings = vec!["hello".to_string(), "world".to_string()];
        let resolve = |raw: &str, tag| resolve_value(Some(raw.into()), tag, &strings, None, false);
        assert_eq!(resolve("1", CellTypeTag::Shared), "world");
        assert_eq!(resolve("7", CellTypeTag::Shared), "");
        assert_eq!(resolve("1", CellTypeTag::Bool), "TRUE");
        assert_eq!(resolve("0", CellTypeTag::Bool), "FALSE");
        assert_eq!(resolve("3.25", CellTypeTag::Default), "3.25");
        assert_eq!(resolve("#DIV/0!", CellTypeTag::Error), "#DIV/0!");
        assert_eq!(resolve_value(None, CellTypeTag::Default, &strings, None, false), "");
    }

    #[test]
    fn test_resolve_value_applies_number_format() {
        let percent = NumberFormat::parse("0%").unwrap();
        let date = NumberFormat::builtin(14).unwrap();
        assert_eq!(
            resolve_value(Some("0.5".into()), CellTypeTag::Default, &[], Some(&percent), false),
            "50%"
        );
        assert_eq!(
            resolve_value(Some("45306".into()), CellTypeTag::Default, &[], Some(&date), false),
            "01-15-24"
        );
        assert_eq!(
            resolve_value(Some("43844".into()), CellTypeTag::Default, &[], Some(&date), true),
            "01-15-24"
        );
        // Text never goes through a number format
        let strings = vec!["0.5".to_string()];
        assert_eq!(
            resolve_value(Some("0".into()), CellTypeTag::Shared, &strings, Some(&percent), false),
            "0.5"
        );
        assert_eq!(
            resolve_value(Some("n/a".into()), CellTypeTag::Default, &[], Some(&percent), false),
            "n/a"
        );
    }

    #[test]
    fn test_read_cell_value_concatenates_inline_runs() {
        let xml = r#"<c r="A1" t="inlineStr"><is><r><t>Hello </t></r><r><t>&amp; bye</t></r><rPh><t>x</t></rPh></is></c><c r="B1"><v>2</v></c>"#;
        let mut reader = Reader::from_reader(xml.as_bytes());
        let mut buf = Vec::new();
        // Consume the opening <c>
        let _ = reader.read_event_into(&mut buf).unwrap();
        let mut cell_buf = Vec::new();
        let value = read_cell_value(&mut reader, &mut cell_buf).unwrap();
        assert_eq!(value.as_deref(), Some("Hello & bye"));
    }

    #[test]
    fn test_read_cell_value_ignores_formula() {
        let xml = r#"<c r="C1"><f>SUM(A1:B1)</f><v>3</v></c>"#;
        let mut reader = Reader::from_reader(xml.as_bytes());
        let mut buf = Vec::new();
        let _ = reader.read_event_into(&mut buf).unwrap();
        let value = read_cell_value(&mut reader, &mut Vec::new()).unwrap();
        assert_eq!(value.as_deref(), Some("3"));
    }
}
