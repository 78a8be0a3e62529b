//! XLSX reader
//!
//! Orchestrates reading the parts of the ZIP package into a [`Workbook`]:
//! relationships, shared strings, styles, then each worksheet in workbook
//! order.

mod relationships;
mod styles;
mod worksheet;

use std::io::Cursor;
use std::path::Path;
use zip::ZipArchive;

use crate::error::Result;
use crate::metrics::digit_width;
use crate::types::Workbook;

use relationships::{
    get_sheet_info, parse_shared_strings, parse_stylesheet, parse_workbook_relationships,
};
use worksheet::{parse_sheet, SheetContext};

/// Parse an XLSX file from bytes.
pub fn parse(data: &[u8]) -> Result<Workbook> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let rels = parse_workbook_relationships(&mut archive);
    let shared_strings = parse_shared_strings(&mut archive, rels.shared_strings.as_deref());
    let styles = parse_stylesheet(&mut archive, rels.styles.as_deref())?;
    let workbook_info = get_sheet_info(&mut archive, &rels.worksheets)?;

    // Column widths are expressed in digits of the Normal style's font
    let ctx = SheetContext {
        shared_strings: &shared_strings,
        styles: &styles,
        digit_width: f64::from(digit_width(styles.default_font_name())),
        date1904: workbook_info.date1904,
    };

    let mut sheets = Vec::with_capacity(workbook_info.sheets.len());
    for info in &workbook_info.sheets {
        sheets.push(parse_sheet(&mut archive, info, ctx)?);
    }

    log::debug!("parsed workbook with {} sheets", sheets.len());
    Ok(Workbook { sheets })
}

/// Read and parse an XLSX file from disk.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Workbook> {
    let data = std::fs::read(path)?;
    parse(&data)
}
