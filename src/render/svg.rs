//! Writes each page as a standalone SVG document.
//!
//! Coordinates are page points, so one SVG user unit is one point and the
//! output prints at the page's physical size.

use quick_xml::escape::escape;

use crate::error::{Result, XlpagerError};
use crate::types::PageTile;

use super::{BorderBox, Renderer, TextRun};

/// Stroke width for ruled edges, in points
const BORDER_WIDTH: f32 = 0.5;

/// One finished page
#[derive(Debug, Clone, PartialEq)]
pub struct SvgPage {
    pub sheet: String,
    pub page_index: u32,
    pub svg: String,
}

impl SvgPage {
    /// File name of the form `<sheet>-<n>.svg`, with `n` counted from 1.
    pub fn file_name(&self) -> String {
        let stem: String = self
            .sheet
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let stem = if stem.is_empty() { "sheet".to_string() } else { stem };
        format!("{stem}-{}.svg", self.page_index.saturating_add(1))
    }
}

/// Renders pages to SVG strings.
#[derive(Debug, Default)]
pub struct SvgRenderer {
    sheet: String,
    current: Option<SvgPage>,
    pages: Vec<SvgPage>,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> &[SvgPage] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<SvgPage> {
        self.pages
    }

    fn out(&mut self, call: &str) -> Result<&mut String> {
        self.current
            .as_mut()
            .map(|page| &mut page.svg)
            .ok_or_else(|| XlpagerError::Render(format!("{call} called outside a page")))
    }
}

impl Renderer for SvgRenderer {
    fn begin_sheet(&mut self, name: &str) -> Result<()> {
        self.sheet = name.to_string();
        Ok(())
    }

    fn begin_page(&mut self, tile: &PageTile, width: f32, height: f32) -> Result<()> {
        if self.current.is_some() {
            return Err(XlpagerError::Render(
                "begin_page called with a page still open".into(),
            ));
        }
        let mut svg = String::with_capacity(4096);
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}pt\" height=\"{height}pt\" viewBox=\"0 0 {width} {height}\">\n"
        ));
        svg.push_str(&format!(
            "<g stroke=\"#000\" stroke-width=\"{BORDER_WIDTH}\" fill=\"#000\" text-anchor=\"start\">\n"
        ));
        self.current = Some(SvgPage {
            sheet: self.sheet.clone(),
            page_index: tile.page_index,
            svg,
        });
        Ok(())
    }

    fn draw_border(&mut self, border: &BorderBox) -> Result<()> {
        let out = self.out("draw_border")?;
        for (x1, y1, x2, y2) in border.edges() {
            out.push_str(&format!(
                "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\"/>\n"
            ));
        }
        Ok(())
    }

    fn draw_text_line(&mut self, run: &TextRun) -> Result<()> {
        let out = self.out("draw_text_line")?;
        let weight = if run.bold { " font-weight=\"bold\"" } else { "" };
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" stroke=\"none\"{weight}>{}</text>\n",
            run.x,
            run.y,
            escape(run.font.as_str()),
            run.font_size,
            escape(run.text.as_str())
        ));
        Ok(())
    }

    fn end_page(&mut self) -> Result<()> {
        let mut page = self
            .current
            .take()
            .ok_or_else(|| XlpagerError::Render("end_page called outside a page".into()))?;
        page.svg.push_str("</g>\n</svg>\n");
        self.pages.push(page);
        Ok(())
    }
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
    use crate::types::BorderFlags;

    fn tile(page_index: u32) -> PageTile {
        PageTile {
            page_index,
            start_row: 0,
            row_count: 1,
            start_col: 0,
            col_count: 1,
        }
    }

    #[test]
    fn test_page_document() {
        let mut svg = SvgRenderer::new();
        svg.begin_sheet("Sales Q1").unwrap();
        svg.begin_page(&tile(0), 100.0, 50.0).unwrap();
        svg.draw_border(&BorderBox {
            x: 1.0,
            y: 2.0,
            width: 10.0,
            height: 5.0,
            borders: BorderFlags::TOP | BorderFlags::BOTTOM,
        })
        .unwrap();
        svg.draw_text_line(&TextRun {
            x: 3.0,
            y: 4.5,
            text: "a < b & c".into(),
            font: "Arial".into(),
            font_size: 11.0,
            bold: true,
        })
        .unwrap();
        svg.end_page().unwrap();

        let pages = svg.into_pages();
        assert_eq!(pages.len(), 1);
        let doc = &pages[0].svg;
        assert!(doc.starts_with("<svg "));
        assert!(doc.contains("viewBox=\"0 0 100 50\""));
        assert_eq!(doc.matches("<line ").count(), 2);
        assert!(doc.contains("<line x1=\"1\" y1=\"2\" x2=\"11\" y2=\"2\"/>"));
        assert!(doc.contains("a &lt; b &amp; c"));
        assert!(doc.contains("font-weight=\"bold\""));
        assert!(doc.trim_end().ends_with("</svg>"));
        assert_eq!(pages[0].file_name(), "Sales_Q1-1.svg");
    }

    #[test]
    fn test_draw_outside_page_fails() {
        let mut svg = SvgRenderer::new();
        assert!(svg
            .draw_text_line(&TextRun {
                x: 0.0,
                y: 0.0,
                text: "x".into(),
                font: "Calibri".into(),
                font_size: 11.0,
                bold: false,
            })
            .is_err());
        assert!(svg.end_page().is_err());
    }

    #[test]
    fn test_unnamed_sheet_file_name() {
        let page = SvgPage {
            sheet: String::new(),
            page_index: 4,
            svg: String::new(),
        };
        assert_eq!(page.file_name(), "sheet-5.svg");
    }
}
