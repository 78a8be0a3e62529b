//! Renderer trait for pluggable output sinks.
//!
//! The layout pass never draws anything itself. It produces draw commands
//! in page-local points (origin top-left, y grows downward) and hands them
//! to a [`Renderer`] in order.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{BorderFlags, PageTile};

/// A cell or span rectangle with the edges that should be ruled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub borders: BorderFlags,
}

impl BorderBox {
    /// Endpoints `(x1, y1, x2, y2)` of every ruled edge, in TOP, RIGHT, BOTTOM, LEFT order.
    pub fn edges(&self) -> Vec<(f32, f32, f32, f32)> {
        let (x1, y1) = (self.x, self.y);
        let (x2, y2) = (self.x + self.width, self.y + self.height);
        [
            (BorderFlags::TOP, (x1, y1, x2, y1)),
            (BorderFlags::RIGHT, (x2, y1, x2, y2)),
            (BorderFlags::BOTTOM, (x1, y2, x2, y2)),
            (BorderFlags::LEFT, (x1, y1, x1, y2)),
        ]
        .into_iter()
        .filter(|(flag, _)| self.borders.contains(*flag))
        .map(|(_, edge)| edge)
        .collect()
    }
}

/// One line of text; `(x, y)` is the left end of the baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub text: String,
    /// Font family name
    pub font: String,
    pub font_size: f32,
    #[serde(default)]
    pub bold: bool,
}

/// Output sink for laid-out pages.
///
/// Calls arrive strictly nested: `begin_sheet`, then for each page
/// `begin_page`, any number of draw calls, `end_page`; then `end_sheet`.
pub trait Renderer {
    /// Start a sheet. Sinks that don't care about sheet boundaries can ignore it.
    fn begin_sheet(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// Start a page of `width` x `height` points showing `tile`.
    fn begin_page(&mut self, tile: &PageTile, width: f32, height: f32) -> Result<()>;

    fn draw_border(&mut self, border: &BorderBox) -> Result<()>;

    fn draw_text_line(&mut self, run: &TextRun) -> Result<()>;

    fn end_page(&mut self) -> Result<()>;

    fn end_sheet(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn begin_sheet(&mut self, name: &str) -> Result<()> {
        (**self).begin_sheet(name)
    }

    fn begin_page(&mut self, tile: &PageTile, width: f32, height: f32) -> Result<()> {
        (**self).begin_page(tile, width, height)
    }

    fn draw_border(&mut self, border: &BorderBox) -> Result<()> {
        (**self).draw_border(border)
    }

    fn draw_text_line(&mut self, run: &TextRun) -> Result<()> {
        (**self).draw_text_line(run)
    }

    fn end_page(&mut self) -> Result<()> {
        (**self).end_page()
    }

    fn end_sheet(&mut self) -> Result<()> {
        (**self).end_sheet()
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

    #[test]
    fn test_edges_follow_flags() {
        let border = BorderBox {
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 5.0,
            borders: BorderFlags::TOP | BorderFlags::LEFT,
        };
        assert_eq!(
            border.edges(),
            vec![(10.0, 20.0, 40.0, 20.0), (10.0, 20.0, 10.0, 25.0)]
        );

        let boxed = BorderBox {
            borders: BorderFlags::ALL,
            ..border.clone()
        };
        assert_eq!(boxed.edges().len(), 4);

        let none = BorderBox {
            borders: BorderFlags::NONE,
            ..border
        };
        assert!(none.edges().is_empty());
    }

    #[test]
    fn test_text_run_json_shape() {
        let run = TextRun {
            x: 1.0,
            y: 2.0,
            text: "hi".into(),
            font: "Calibri".into(),
            font_size: 11.0,
            bold: false,
        };
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["fontSize"], 11.0);
        assert_eq!(json["font"], "Calibri");
    }
}
