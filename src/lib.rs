//! xlpager - spreadsheet pagination and cell layout
//!
//! Splits a sheet's grid of rows and columns into printable pages and turns
//! each page into positioned draw commands:
//! - Page tiles that cover the used grid, row bands first
//! - Merged regions drawn once, with continuations across page breaks
//! - Composite outer borders for merged regions
//! - Cell text wrapped to the cell width and centered in its rectangle
//!
//! Grids can be built by hand or read from `.xlsx` files. Output goes to any
//! [`Renderer`]; a recorder and an SVG writer are included.
//!
//! # Usage
//!
//! ```no_run
//! use xlpager::{layout_workbook, parse_file, CharWidthMetrics, LayoutConfig};
//!
//! let workbook = parse_file("report.xlsx")?;
//! let plans = layout_workbook(&workbook, &CharWidthMetrics::new(), &LayoutConfig::default())?;
//! for plan in &plans {
//!     println!("{}: {} pages", plan.name, plan.pages.len());
//! }
//! # Ok::<(), xlpager::XlpagerError>(())
//! ```

pub mod cell_ref;
pub mod config;
pub mod document;
pub mod error;
pub mod grid;
pub mod layout;
pub mod metrics;
pub mod numfmt;
pub mod page_setup;
pub mod parser;
pub mod render;
pub mod types;
mod xml_helpers;

pub use config::LayoutConfig;
pub use document::{layout_workbook, render_workbook};
pub use error::{MetricsError, Result, XlpagerError};
pub use grid::{GridProvider, MetricsProvider};
pub use layout::{
    layout_sheet, render_sheet, BreakMode, DrawCommand, LayoutIssue, MergeTable, PagePlan, SheetPlan,
};
pub use metrics::CharWidthMetrics;
pub use page_setup::PageGeometry;
pub use parser::{parse, parse_file};
pub use render::{BorderBox, Renderer, TextRun};

pub use types::*;

/// Get the library version
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
