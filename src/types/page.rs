use serde::{Deserialize, Serialize};

/// Named paper sizes with a fixed point size.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PageSize {
    A0,
    A1,
    A2,
    A3,
    #[default]
    A4,
    A5,
    A6,
    Letter,
    Legal,
}

/// Page orientation
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Page margins in points
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct PageMargins {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for PageMargins {
    /// 3% of an A4 width on each side, 15pt top and bottom.
    fn default() -> Self {
        Self {
            left: 17.86,
            right: 17.86,
            top: 15.0,
            bottom: 15.0,
        }
    }
}

impl PageMargins {
    #[must_use]
    pub fn uniform(points: f32) -> Self {
        Self {
            left: points,
            right: points,
            top: points,
            bottom: points,
        }
    }

    /// Every side finite and non-negative.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.left, self.right, self.top, self.bottom]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Print settings read from a worksheet's `pageSetup`/`pageMargins`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageSetup {
    /// Paper size code (e.g., 1=Letter, 9=A4)
    pub paper_size: Option<u32>,
    pub orientation: Option<Orientation>,
    /// Margins converted from inches to points
    pub margins: Option<PageMargins>,
}

/// A rectangular row/column sub-range of the grid assigned to one page.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct PageTile {
    /// Page number within the sheet, from 0
    pub page_index: u32,
    pub start_row: u32,
    pub row_count: u32,
    pub start_col: u32,
    pub col_count: u32,
}

impl PageTile {
    /// One past the last row on this page.
    #[must_use]
    pub fn end_row(&self) -> u32 {
        self.start_row.saturating_add(self.row_count)
    }

    /// One past the last column on this page.
    #[must_use]
    pub fn end_col(&self) -> u32 {
        self.start_col.saturating_add(self.col_count)
    }

    #[must_use]
    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.start_row..self.end_row()).contains(&row)
            && (self.start_col..self.end_col()).contains(&col)
    }
}
