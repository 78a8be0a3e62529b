//! Test fixtures for generating valid XLSX files in memory.
//!
//! # Example
//!
//! ```rust
//! use fixtures::{SheetBuilder, StyleBuilder, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .sheet(
//!         SheetBuilder::new("Sheet1")
//!             .cell("A1", "Hello", Some(StyleBuilder::new().bold().border_all("thin")))
//!             .merge("A1:B2"),
//!     )
//!     .build();
//!
//! let workbook = xlpager::parse(&xlsx).unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::fmt::Write as _;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

// ============================================================================
// Style Builder
// ============================================================================

/// Builder for a cell style: font, number format and ruled border edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleBuilder {
    /// Custom number format code, registered from id 164
    pub number_format: Option<String>,
    /// Built-in number format id, used when no custom code is set
    pub builtin_format: Option<u32>,
    pub font_name: Option<String>,
    pub font_size: Option<f64>,
    pub bold: bool,
    pub top: Option<String>,
    pub right: Option<String>,
    pub bottom: Option<String>,
    pub left: Option<String>,
}

impl StyleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn number_format(mut self, code: &str) -> Self {
        self.number_format = Some(code.to_string());
        self
    }

    #[must_use]
    pub fn builtin_format(mut self, id: u32) -> Self {
        self.builtin_format = Some(id);
        self
    }

    #[must_use]
    pub fn font_name(mut self, name: &str) -> Self {
        self.font_name = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub fn border_all(self, style: &str) -> Self {
        self.border_top(style)
            .border_right(style)
            .border_bottom(style)
            .border_left(style)
    }

    #[must_use]
    pub fn border_top(mut self, style: &str) -> Self {
        self.top = Some(style.to_string());
        self
    }

    #[must_use]
    pub fn border_right(mut self, style: &str) -> Self {
        self.right = Some(style.to_string());
        self
    }

    #[must_use]
    pub fn border_bottom(mut self, style: &str) -> Self {
        self.bottom = Some(style.to_string());
        self
    }

    #[must_use]
    pub fn border_left(mut self, style: &str) -> Self {
        self.left = Some(style.to_string());
        self
    }

    fn font_xml(&self) -> String {
        let mut xml = String::from("<font>");
        if self.bold {
            xml.push_str("<b/>");
        }
        let _ = write!(
            xml,
            r#"<sz val="{}"/><name val="{}"/></font>"#,
            self.font_size.unwrap_or(11.0),
            self.font_name.as_deref().unwrap_or("Calibri")
        );
        xml
    }

    fn border_xml(&self) -> String {
        let side = |name: &str, style: &Option<String>| match style {
            Some(s) => format!(r#"<{name} style="{s}"><color auto="1"/></{name}>"#),
            None => format!("<{name}/>"),
        };
        format!(
            "<border>{}{}{}{}<diagonal/></border>",
            side("left", &self.left),
            side("right", &self.right),
            side("top", &self.top),
            side("bottom", &self.bottom)
        )
    }
}

/// First id available to custom number formats
const FIRST_CUSTOM_FORMAT: u32 = 164;

/// Collects unique fonts, borders, number formats and cell formats across all sheets.
struct StylesCollector {
    fonts: Vec<String>,
    borders: Vec<String>,
    num_fmts: Vec<String>,
    /// (numFmtId, fontId, borderId)
    cell_xfs: Vec<(u32, usize, usize)>,
}

impl StylesCollector {
    fn new() -> Self {
        let default = StyleBuilder::new();
        Self {
            fonts: vec![default.font_xml()],
            borders: vec![default.border_xml()],
            num_fmts: Vec::new(),
            cell_xfs: vec![(0, 0, 0)],
        }
    }

    fn index_of(list: &mut Vec<String>, xml: String) -> usize {
        if let Some(idx) = list.iter().position(|x| *x == xml) {
            return idx;
        }
        list.push(xml);
        list.len() - 1
    }

    /// Register a style and return its cellXfs index.
    fn add_style(&mut self, style: &StyleBuilder) -> usize {
        let font = Self::index_of(&mut self.fonts, style.font_xml());
        let border = Self::index_of(&mut self.borders, style.border_xml());
        let num_fmt = match &style.number_format {
            Some(code) => {
                FIRST_CUSTOM_FORMAT + Self::index_of(&mut self.num_fmts, code.clone()) as u32
            }
            None => style.builtin_format.unwrap_or(0),
        };
        let xf = (num_fmt, font, border);
        if let Some(idx) = self.cell_xfs.iter().position(|&x| x == xf) {
            return idx;
        }
        self.cell_xfs.push(xf);
        self.cell_xfs.len() - 1
    }

    fn generate_styles_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        if !self.num_fmts.is_empty() {
            let _ = write!(xml, r#"<numFmts count="{}">"#, self.num_fmts.len());
            for (i, code) in self.num_fmts.iter().enumerate() {
                let _ = write!(
                    xml,
                    r#"<numFmt numFmtId="{}" formatCode="{}"/>"#,
                    FIRST_CUSTOM_FORMAT + i as u32,
                    escape(code)
                );
            }
            xml.push_str("</numFmts>");
        }
        let _ = write!(xml, r#"<fonts count="{}">"#, self.fonts.len());
        for font in &self.fonts {
            xml.push_str(font);
        }
        xml.push_str(r#"</fonts><fills count="1"><fill><patternFill patternType="none"/></fill></fills>"#);
        let _ = write!(xml, r#"<borders count="{}">"#, self.borders.len());
        for border in &self.borders {
            xml.push_str(border);
        }
        xml.push_str(r#"</borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);
        let _ = write!(xml, r#"<cellXfs count="{}">"#, self.cell_xfs.len());
        for (num_fmt, font, border) in &self.cell_xfs {
            let _ = write!(
                xml,
                r#"<xf numFmtId="{num_fmt}" fontId="{font}" fillId="0" borderId="{border}" xfId="0" applyBorder="1"/>"#
            );
        }
        xml.push_str("</cellXfs></styleSheet>");
        xml
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

/// A cell value as it will be stored in the sheet XML.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Stored in the shared string table
    String(String),
    /// Stored inline with t="inlineStr"
    Inline(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: CellValue,
    pub style: Option<StyleBuilder>,
}

#[derive(Debug, Clone)]
pub struct ColumnWidth {
    pub min: u32,
    pub max: u32,
    pub width: Option<f64>,
    pub hidden: bool,
}

#[derive(Debug, Clone)]
pub struct RowHeight {
    /// 1-based row number
    pub row: u32,
    pub height: Option<f64>,
    pub hidden: bool,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    pub merges: Vec<String>,
    pub col_widths: Vec<ColumnWidth>,
    pub row_heights: Vec<RowHeight>,
    pub default_col_width: Option<f64>,
    pub default_row_height: Option<f64>,
    /// (paperSize, orientation)
    pub page_setup: Option<(u32, String)>,
    /// (left, right, top, bottom) in inches
    pub margins: Option<(f64, f64, f64, f64)>,
    /// Replaces the generated worksheet XML entirely
    pub raw_xml: Option<String>,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Add a cell with a value and optional style.
    #[must_use]
    pub fn cell<V: Into<CellValue>>(
        mut self,
        cell_ref: &str,
        value: V,
        style: Option<StyleBuilder>,
    ) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style,
        });
        self
    }

    /// Add an empty cell with only a style.
    #[must_use]
    pub fn styled_cell(mut self, cell_ref: &str, style: StyleBuilder) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: CellValue::Empty,
            style: Some(style),
        });
        self
    }

    /// Add a merge range (e.g., "A1:B2").
    #[must_use]
    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }

    /// Set column width (in characters) for a 1-based range of columns.
    #[must_use]
    pub fn col_width(mut self, min: u32, max: u32, width: f64) -> Self {
        self.col_widths.push(ColumnWidth {
            min,
            max,
            width: Some(width),
            hidden: false,
        });
        self
    }

    #[must_use]
    pub fn hide_cols(mut self, min: u32, max: u32) -> Self {
        self.col_widths.push(ColumnWidth {
            min,
            max,
            width: None,
            hidden: true,
        });
        self
    }

    /// Set a 1-based row's height in points.
    #[must_use]
    pub fn row_height(mut self, row: u32, height: f64) -> Self {
        self.row_heights.push(RowHeight {
            row,
            height: Some(height),
            hidden: false,
        });
        self
    }

    #[must_use]
    pub fn hide_row(mut self, row: u32) -> Self {
        self.row_heights.push(RowHeight {
            row,
            height: None,
            hidden: true,
        });
        self
    }

    #[must_use]
    pub fn default_col_width(mut self, chars: f64) -> Self {
        self.default_col_width = Some(chars);
        self
    }

    #[must_use]
    pub fn default_row_height(mut self, points: f64) -> Self {
        self.default_row_height = Some(points);
        self
    }

    #[must_use]
    pub fn page_setup(mut self, paper_size: u32, orientation: &str) -> Self {
        self.page_setup = Some((paper_size, orientation.to_string()));
        self
    }

    #[must_use]
    pub fn margins(mut self, left: f64, right: f64, top: f64, bottom: f64) -> Self {
        self.margins = Some((left, right, top, bottom));
        self
    }

    #[must_use]
    pub fn raw_xml(mut self, xml: &str) -> Self {
        self.raw_xml = Some(xml.to_string());
        self
    }
}

/// 1-based row number of an A1 reference.
fn row_of(cell_ref: &str) -> u32 {
    cell_ref
        .trim_start_matches(|c: char| c.is_ascii_alphabetic() || c == '$')
        .parse()
        .unwrap()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn generate_cell_xml(
    cell: &CellEntry,
    shared_strings: &[String],
    styles: &mut StylesCollector,
) -> String {
    let style_attr = cell
        .style
        .as_ref()
        .map(|s| format!(r#" s="{}""#, styles.add_style(s)))
        .unwrap_or_default();
    let r = &cell.cell_ref;
    match &cell.value {
        CellValue::String(s) => {
            let idx = shared_strings.iter().position(|x| x == s).unwrap();
            format!(r#"<c r="{r}"{style_attr} t="s"><v>{idx}</v></c>"#)
        }
        CellValue::Inline(s) => format!(
            r#"<c r="{r}"{style_attr} t="inlineStr"><is><t>{}</t></is></c>"#,
            escape(s)
        ),
        CellValue::Number(n) => format!(r#"<c r="{r}"{style_attr}><v>{n}</v></c>"#),
        CellValue::Bool(b) => format!(
            r#"<c r="{r}"{style_attr} t="b"><v>{}</v></c>"#,
            u8::from(*b)
        ),
        CellValue::Empty => format!(r#"<c r="{r}"{style_attr}/>"#),
    }
}

fn generate_sheet_xml(
    sheet: &SheetBuilder,
    shared_strings: &[String],
    styles: &mut StylesCollector,
) -> String {
    if let Some(raw) = &sheet.raw_xml {
        return raw.clone();
    }

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    if sheet.default_col_width.is_some() || sheet.default_row_height.is_some() {
        xml.push_str("<sheetFormatPr");
        if let Some(w) = sheet.default_col_width {
            let _ = write!(xml, r#" defaultColWidth="{w}""#);
        }
        let _ = write!(
            xml,
            r#" defaultRowHeight="{}"/>"#,
            sheet.default_row_height.unwrap_or(15.0)
        );
    }

    if !sheet.col_widths.is_empty() {
        xml.push_str("<cols>");
        for col in &sheet.col_widths {
            let _ = write!(xml, r#"<col min="{}" max="{}""#, col.min, col.max);
            if let Some(w) = col.width {
                let _ = write!(xml, r#" width="{w}" customWidth="1""#);
            }
            if col.hidden {
                xml.push_str(r#" hidden="1""#);
            }
            xml.push_str("/>");
        }
        xml.push_str("</cols>");
    }

    // Rows in ascending order, including rows that only carry a height
    let mut rows: Vec<u32> = sheet
        .cells
        .iter()
        .map(|c| row_of(&c.cell_ref))
        .chain(sheet.row_heights.iter().map(|r| r.row))
        .collect();
    rows.sort_unstable();
    rows.dedup();

    xml.push_str("<sheetData>");
    for row in rows {
        let _ = write!(xml, r#"<row r="{row}""#);
        if let Some(def) = sheet.row_heights.iter().find(|r| r.row == row) {
            if let Some(h) = def.height {
                let _ = write!(xml, r#" ht="{h}" customHeight="1""#);
            }
            if def.hidden {
                xml.push_str(r#" hidden="1""#);
            }
        }
        xml.push('>');
        for cell in sheet.cells.iter().filter(|c| row_of(&c.cell_ref) == row) {
            xml.push_str(&generate_cell_xml(cell, shared_strings, styles));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if !sheet.merges.is_empty() {
        let _ = write!(xml, r#"<mergeCells count="{}">"#, sheet.merges.len());
        for range in &sheet.merges {
            let _ = write!(xml, r#"<mergeCell ref="{range}"/>"#);
        }
        xml.push_str("</mergeCells>");
    }

    if let Some((left, right, top, bottom)) = sheet.margins {
        let _ = write!(
            xml,
            r#"<pageMargins left="{left}" right="{right}" top="{top}" bottom="{bottom}" header="0.3" footer="0.3"/>"#
        );
    }
    if let Some((paper, orientation)) = &sheet.page_setup {
        let _ = write!(
            xml,
            r#"<pageSetup paperSize="{paper}" orientation="{orientation}"/>"#
        );
    }

    xml.push_str("</worksheet>");
    xml
}

// ============================================================================
// Package
// ============================================================================

fn generate_content_types(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
  <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
  <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
    );
    for i in 1..=sheet_count {
        let _ = write!(
            xml,
            r#"
  <Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        );
    }
    xml.push_str("\n</Types>");
    xml
}

fn generate_rels() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
}

fn generate_workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        );
    }
    let styles_id = sheet_count + 1;
    let strings_id = sheet_count + 2;
    let _ = write!(
        xml,
        r#"<Relationship Id="rId{styles_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId{strings_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#
    );
    xml
}

fn generate_workbook(sheets: &[SheetBuilder], date1904: bool) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    if date1904 {
        xml.push_str(r#"<workbookPr date1904="1"/>"#);
    }
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        let _ = write!(
            xml,
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape(&sheet.name),
            i + 1,
            i + 1
        );
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    );
    for s in strings {
        let _ = write!(xml, r#"<si><t xml:space="preserve">{}</t></si>"#, escape(s));
    }
    xml.push_str("</sst>");
    xml
}

/// Builder for a complete workbook package.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    date1904: bool,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Count date serials from 1904.
    #[must_use]
    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut shared_strings: Vec<String> = Vec::new();
        for cell in self.sheets.iter().flat_map(|s| &s.cells) {
            if let CellValue::String(ref s) = cell.value {
                if !shared_strings.contains(s) {
                    shared_strings.push(s.clone());
                }
            }
        }

        // Sheets first so every style they reference is collected
        let mut styles = StylesCollector::new();
        let sheet_xml: Vec<String> = self
            .sheets
            .iter()
            .map(|sheet| generate_sheet_xml(sheet, &shared_strings, &mut styles))
            .collect();

        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(generate_content_types(self.sheets.len()).as_bytes())
            .unwrap();

        zip.start_file("_rels/.rels", options).unwrap();
        zip.write_all(generate_rels().as_bytes()).unwrap();

        zip.start_file("xl/_rels/workbook.xml.rels", options)
            .unwrap();
        zip.write_all(generate_workbook_rels(self.sheets.len()).as_bytes())
            .unwrap();

        zip.start_file("xl/workbook.xml", options).unwrap();
        zip.write_all(generate_workbook(&self.sheets, self.date1904).as_bytes())
            .unwrap();

        zip.start_file("xl/styles.xml", options).unwrap();
        zip.write_all(styles.generate_styles_xml().as_bytes())
            .unwrap();

        zip.start_file("xl/sharedStrings.xml", options).unwrap();
        zip.write_all(generate_shared_strings(&shared_strings).as_bytes())
            .unwrap();

        for (i, xml) in sheet_xml.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)
                .unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}
