use serde::{Deserialize, Serialize};

use super::{CellBorders, FontRef};

/// Cell with position, as produced by readers before the grid is densified.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CellData {
    pub r: u32, // row (0-indexed)
    pub c: u32, // col (0-indexed)
    pub cell: Cell,
}

/// A single cell's display value and the style bits the layout engine reads.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    /// The display value as one plain string (already formatted)
    #[serde(default)]
    pub v: String,
    /// The cell's own borders
    #[serde(default)]
    pub borders: CellBorders,
    /// Font used for the whole value
    #[serde(default)]
    pub font: FontRef,
}

impl Cell {
    /// A plain cell with the default font and no borders.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            v: value.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_borders(mut self, borders: CellBorders) -> Self {
        self.borders = borders;
        self
    }

    #[must_use]
    pub fn with_font(mut self, font: FontRef) -> Self {
        self.font = font;
        self
    }
}
