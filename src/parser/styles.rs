//! Parsing of xl/styles.xml
//!
//! Only what the layout engine reads is kept: fonts (name, size, weight),
//! which border edges are ruled, number formats, and the cell formats that
//! point at them.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::BufRead;

use crate::error::Result;
use crate::numfmt::{builtin_format, NumberFormat};
use crate::types::{CellBorders, Font, FontRef, DEFAULT_FONT_NAME};
use crate::xml_helpers::{attr_string, attr_u32, attr_val, attr_val_f64};

/// A `<xf>` entry reduced to the ids the grid needs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CellXf {
    pub font_id: Option<u32>,
    pub border_id: Option<u32>,
    pub num_fmt_id: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct StyleTable {
    pub fonts: Vec<Font>,
    pub borders: Vec<CellBorders>,
    pub cell_xfs: Vec<CellXf>,
    pub cell_style_xfs: Vec<CellXf>,
    /// Custom `<numFmt>` codes by id
    pub num_fmts: HashMap<u32, String>,
    /// Compiled number format per cell format; `None` keeps the stored text
    pub number_formats: Vec<Option<NumberFormat>>,
}

impl StyleTable {
    /// Cell format for a cell's `s` attribute; unstyled cells use format 0.
    fn xf(&self, style_idx: Option<u32>) -> Option<&CellXf> {
        self.cell_xfs.get(style_idx.unwrap_or(0) as usize)
    }

    /// Font reference into [`StyleTable::fonts`] for a cell's style.
    pub fn font_ref(&self, style_idx: Option<u32>) -> FontRef {
        FontRef(self.xf(style_idx).and_then(|xf| xf.font_id).unwrap_or(0))
    }

    pub fn number_format(&self, style_idx: Option<u32>) -> Option<&NumberFormat> {
        self.number_formats
            .get(style_idx.unwrap_or(0) as usize)
            .and_then(Option::as_ref)
    }

    /// Custom codes shadow the built-in table.
    fn format_code(&self, id: u32) -> Option<&str> {
        self.num_fmts
            .get(&id)
            .map(String::as_str)
            .or_else(|| builtin_format(id))
    }

    fn compile_number_formats(&mut self) {
        self.number_formats = self
            .cell_xfs
            .iter()
            .map(|xf| {
                xf.num_fmt_id
                    .and_then(|id| self.format_code(id))
                    .and_then(NumberFormat::parse)
            })
            .collect();
    }

    pub fn borders(&self, style_idx: Option<u32>) -> CellBorders {
        self.xf(style_idx)
            .and_then(|xf| xf.border_id)
            .and_then(|id| self.borders.get(id as usize))
            .copied()
            .unwrap_or_default()
    }

    /// Font of the Normal style, used for column width conversion.
    pub fn default_font_name(&self) -> &str {
        let font_id = self
            .cell_style_xfs
            .first()
            .or_else(|| self.cell_xfs.first())
            .and_then(|xf| xf.font_id)
            .unwrap_or(0);
        self.fonts
            .get(font_id as usize)
            .map_or(DEFAULT_FONT_NAME, |f| f.name.as_str())
    }
}

/// A border edge is ruled when it carries a style other than "none".
fn is_ruled(e: &BytesStart) -> bool {
    attr_string(e, b"style").is_some_and(|style| !style.is_empty() && style != "none")
}

fn parse_xf(e: &BytesStart) -> CellXf {
    CellXf {
        font_id: attr_u32(e, b"fontId"),
        border_id: attr_u32(e, b"borderId"),
        num_fmt_id: attr_u32(e, b"numFmtId"),
    }
}

/// Parse styles.xml content
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn parse_styles<R: BufRead>(reader: R) -> Result<StyleTable> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut styles = StyleTable::default();
    let mut buf = Vec::new();

    let mut in_num_fmts = false;
    let mut in_fonts = false;
    let mut in_borders = false;
    let mut in_cell_xfs = false;
    let mut in_cell_style_xfs = false;

    let mut current_font: Option<Font> = None;
    let mut current_border: Option<CellBorders> = None;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = e.local_name();

                match name.as_ref() {
                    b"numFmts" => in_num_fmts = true,
                    b"fonts" => in_fonts = true,
                    b"borders" => in_borders = true,
                    b"cellXfs" => in_cell_xfs = true,
                    b"cellStyleXfs" => in_cell_style_xfs = true,

                    b"numFmt" if in_num_fmts => {
                        if let (Some(id), Some(code)) =
                            (attr_u32(e, b"numFmtId"), attr_string(e, b"formatCode"))
                        {
                            styles.num_fmts.insert(id, code);
                        }
                    }

                    b"font" if in_fonts => {
                        let font = Font::default();
                        if is_empty {
                            styles.fonts.push(font);
                        } else {
                            current_font = Some(font);
                        }
                    }
                    b"sz" => {
                        if let (Some(font), Some(size)) = (current_font.as_mut(), attr_val_f64(e)) {
                            font.size = size as f32;
                        }
                    }
                    b"name" => {
                        if let (Some(font), Some(name)) = (current_font.as_mut(), attr_val(e)) {
                            font.name = name;
                        }
                    }
                    b"b" => {
                        if let Some(font) = current_font.as_mut() {
                            // <b/> means bold; <b val="0"/> explicitly turns it off
                            font.bold = attr_val(e).map_or(true, |v| v != "0" && v != "false");
                        }
                    }

                    b"border" if in_borders => {
                        if is_empty {
                            styles.borders.push(CellBorders::default());
                        } else {
                            current_border = Some(CellBorders::default());
                        }
                    }
                    b"left" | b"start" => {
                        if let Some(border) = current_border.as_mut() {
                            border.left = is_ruled(e);
                        }
                    }
                    b"right" | b"end" => {
                        if let Some(border) = current_border.as_mut() {
                            border.right = is_ruled(e);
                        }
                    }
                    b"top" => {
                        if let Some(border) = current_border.as_mut() {
                            border.top = is_ruled(e);
                        }
                    }
                    b"bottom" => {
                        if let Some(border) = current_border.as_mut() {
                            border.bottom = is_ruled(e);
                        }
                    }

                    b"xf" if in_cell_xfs => styles.cell_xfs.push(parse_xf(e)),
                    b"xf" if in_cell_style_xfs => styles.cell_style_xfs.push(parse_xf(e)),

                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"numFmts" => in_num_fmts = false,
                b"fonts" => in_fonts = false,
                b"borders" => in_borders = false,
                b"cellXfs" => in_cell_xfs = false,
                b"cellStyleXfs" => in_cell_style_xfs = false,
                b"font" => {
                    if let Some(font) = current_font.take() {
                        styles.fonts.push(font);
                    }
                }
                b"border" => {
                    if let Some(border) = current_border.take() {
                        styles.borders.push(border);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    styles.compile_number_formats();
    log::debug!(
        "styles: {} fonts, {} borders, {} cell formats",
        styles.fonts.len(),
        styles.borders.len(),
        styles.cell_xfs.len()
    );
    Ok(styles)
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

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy-mm-dd"/></numFmts>
  <fonts count="2">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><sz val="14"/><color rgb="FF000000"/><name val="Arial"/></font>
  </fonts>
  <borders count="3">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border><left style="thin"/><right style="thin"/><top style="medium"/><bottom style="none"/></border>
    <border/>
  </borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="5">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="1" fillId="0" borderId="1" xfId="0" applyBorder="1">
      <alignment wrapText="1"/>
    </xf>
    <xf numFmtId="0" fontId="0" fillId="0" borderId="7" xfId="0"/>
    <xf numFmtId="9" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
    <xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
  </cellXfs>
  <dxfs count="1"><dxf><font><b/></font><numFmt numFmtId="164" formatCode="0.0"/><border><left style="thin"/></border></dxf></dxfs>
</styleSheet>"#;

    #[test]
    fn test_fonts_borders_and_xfs() {
        let styles = parse_styles(STYLES.as_bytes()).unwrap();

        assert_eq!(styles.fonts.len(), 2);
        assert_eq!(styles.fonts[1].name, "Arial");
        assert_eq!(styles.fonts[1].size, 14.0);
        assert!(styles.fonts[1].bold);
        assert!(!styles.fonts[0].bold);

        assert_eq!(styles.borders.len(), 3);
        assert_eq!(styles.borders[0], CellBorders::default());
        assert_eq!(
            styles.borders[1],
            CellBorders {
                top: true,
                right: true,
                bottom: false,
                left: true,
            }
        );

        assert_eq!(styles.cell_xfs.len(), 5);
        assert_eq!(styles.cell_style_xfs.len(), 1);
    }

    #[test]
    fn test_style_lookup() {
        let styles = parse_styles(STYLES.as_bytes()).unwrap();
        assert_eq!(styles.font_ref(Some(1)), FontRef(1));
        assert_eq!(styles.font_ref(None), FontRef(0));
        assert!(styles.borders(Some(1)).left);
        assert_eq!(styles.borders(None), CellBorders::default());
        // Dangling border id and unknown format fall back to no borders
        assert_eq!(styles.borders(Some(2)), CellBorders::default());
        assert_eq!(styles.borders(Some(99)), CellBorders::default());
        assert_eq!(styles.default_font_name(), "Calibri");
    }

    #[test]
    fn test_number_formats_per_cell_format() {
        let styles = parse_styles(STYLES.as_bytes()).unwrap();
        assert_eq!(styles.num_fmts.get(&164).map(String::as_str), Some("yyyy-mm-dd"));

        // General keeps the stored text
        assert!(styles.number_format(None).is_none());
        assert!(styles.number_format(Some(1)).is_none());

        let percent = styles.number_format(Some(3)).unwrap();
        assert_eq!(percent.format(0.5, false), "50%");
        let date = styles.number_format(Some(4)).unwrap();
        assert!(date.is_date());
        assert_eq!(date.format(45306.0, false), "2024-01-15");
    }

    #[test]
    fn test_dxf_entries_are_ignored() {
        let styles = parse_styles(STYLES.as_bytes()).unwrap();
        // The dxf font and border must not be appended to the main tables
        assert_eq!(styles.fonts.len(), 2);
        assert_eq!(styles.borders.len(), 3);
    }

    #[test]
    fn test_empty_stylesheet() {
        let styles = parse_styles(&b"<styleSheet/>"[..]).unwrap();
        assert_eq!(styles.default_font_name(), DEFAULT_FONT_NAME);
        assert_eq!(styles.font_ref(Some(3)), FontRef(0));
    }
}
