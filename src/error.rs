//! Structured error types for xlpager.
//!
//! Only structural failures surface here. Problems local to a single cell or
//! merged region are absorbed by the layout pass and reported as
//! [`LayoutIssue`](crate::layout::LayoutIssue) diagnostics instead.

/// All errors that can occur while reading a workbook or laying out a sheet.
#[derive(Debug, thiserror::Error)]
pub enum XlpagerError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON (de)serialization error, used for config files and plan output.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid cell reference.
    #[error("Invalid cell reference: {0}")]
    CellRef(String),

    /// General parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The grid has no rows or no columns, so there is nothing to paginate.
    #[error("Grid has {rows} rows and {cols} columns; both must be non-zero")]
    EmptyGrid { rows: u32, cols: u32 },

    /// A row height or column width is negative or not finite.
    #[error("Invalid {axis} extent {value} at index {index}")]
    InvalidExtent {
        axis: Axis,
        index: u32,
        value: f32,
    },

    /// The page content box has no usable area.
    #[error("Page content area {width}x{height} must be positive")]
    InvalidPageArea { width: f32, height: f32 },

    /// Invalid layout configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// Rendering error reported by a renderer sink.
    #[error("Render error: {0}")]
    Render(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which grid axis an extent belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Row => f.write_str("row"),
            Axis::Column => f.write_str("column"),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, XlpagerError>;

/// Failure reported by a [`MetricsProvider`](crate::grid::MetricsProvider).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    /// The font has no glyph for a character in the measured text.
    #[error("Unsupported glyph {0:?}")]
    UnsupportedGlyph(char),

    /// The font could not be resolved by the provider.
    #[error("Unknown font: {0}")]
    UnknownFont(String),
}
