//! A renderer that keeps everything it is sent.
//!
//! Useful for tests and for serializing a layout without drawing it.

use serde::Serialize;

use crate::error::{Result, XlpagerError};
use crate::layout::{DrawCommand, PagePlan};
use crate::types::PageTile;

use super::{BorderBox, Renderer, TextRun};

/// Pages received for one sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedSheet {
    pub name: String,
    pub pages: Vec<PagePlan>,
}

/// Collects draw calls into page records, checking that calls are properly nested.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    sheets: Vec<RecordedSheet>,
    page: Option<PagePlan>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&self) -> &[RecordedSheet] {
        &self.sheets
    }

    pub fn into_sheets(self) -> Vec<RecordedSheet> {
        self.sheets
    }

    /// Total pages recorded across all sheets.
    pub fn page_count(&self) -> usize {
        self.sheets.iter().map(|s| s.pages.len()).sum()
    }

    fn open_page(&mut self, call: &str) -> Result<&mut PagePlan> {
        self.page
            .as_mut()
            .ok_or_else(|| XlpagerError::Render(format!("{call} called outside a page")))
    }
}

impl Renderer for RecordingRenderer {
    fn begin_sheet(&mut self, name: &str) -> Result<()> {
        if self.page.is_some() {
            return Err(XlpagerError::Render(
                "begin_sheet called with a page still open".into(),
            ));
        }
        self.sheets.push(RecordedSheet {
            name: name.to_string(),
            pages: Vec::new(),
        });
        Ok(())
    }

    fn begin_page(&mut self, tile: &PageTile, width: f32, height: f32) -> Result<()> {
        if self.page.is_some() {
            return Err(XlpagerError::Render(
                "begin_page called with a page still open".into(),
            ));
        }
        self.page = Some(PagePlan {
            tile: *tile,
            width,
            height,
            commands: Vec::new(),
        });
        Ok(())
    }

    fn draw_border(&mut self, border: &BorderBox) -> Result<()> {
        self.open_page("draw_border")?
            .commands
            .push(DrawCommand::Border(border.clone()));
        Ok(())
    }

    fn draw_text_line(&mut self, run: &TextRun) -> Result<()> {
        self.open_page("draw_text_line")?
            .commands
            .push(DrawCommand::Text(run.clone()));
        Ok(())
    }

    fn end_page(&mut self) -> Result<()> {
        let page = self
            .page
            .take()
            .ok_or_else(|| XlpagerError::Render("end_page called outside a page".into()))?;
        // Pages sent without begin_sheet land in an unnamed sheet
        if self.sheets.is_empty() {
            self.sheets.push(RecordedSheet {
                name: String::new(),
                pages: Vec::new(),
            });
        }
        if let Some(sheet) = self.sheets.last_mut() {
            sheet.pages.push(page);
        }
        Ok(())
    }

    fn end_sheet(&mut self) -> Result<()> {
        if self.page.is_some() {
            return Err(XlpagerError::Render(
                "end_sheet called with a page still open".into(),
            ));
        }
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

    fn tile() -> PageTile {
        PageTile {
            page_index: 0,
            start_row: 0,
            row_count: 1,
            start_col: 0,
            col_count: 1,
        }
    }

    fn border() -> BorderBox {
        BorderBox {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            borders: BorderFlags::ALL,
        }
    }

    #[test]
    fn test_records_pages_per_sheet() {
        let mut rec = RecordingRenderer::new();
        rec.begin_sheet("one").unwrap();
        rec.begin_page(&tile(), 100.0, 200.0).unwrap();
        rec.draw_border(&border()).unwrap();
        rec.end_page().unwrap();
        rec.end_sheet().unwrap();
        rec.begin_sheet("two").unwrap();
        rec.end_sheet().unwrap();

        assert_eq!(rec.page_count(), 1);
        let sheets = rec.into_sheets();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].pages[0].commands.len(), 1);
        assert_eq!(sheets[0].pages[0].width, 100.0);
        assert!(sheets[1].pages.is_empty());
    }

    #[test]
    fn test_draw_outside_page_is_an_error() {
        let mut rec = RecordingRenderer::new();
        let err = rec.draw_border(&border()).unwrap_err();
        assert!(matches!(err, XlpagerError::Render(_)));
        assert!(rec.end_page().is_err());
    }

    #[test]
    fn test_nested_pages_are_an_error() {
        let mut rec = RecordingRenderer::new();
        rec.begin_page(&tile(), 1.0, 1.0).unwrap();
        assert!(rec.begin_page(&tile(), 1.0, 1.0).is_err());
        assert!(rec.end_sheet().is_err());
    }

    #[test]
    fn test_page_without_sheet_is_kept() {
        let mut rec = RecordingRenderer::new();
        rec.begin_page(&tile(), 1.0, 1.0).unwrap();
        rec.end_page().unwrap();
        assert_eq!(rec.sheets()[0].name, "");
        assert_eq!(rec.page_count(), 1);
    }
}
