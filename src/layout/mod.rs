//! Layout engine: page breaking, merged regions, text wrapping and the
//! per-page draw plan.
//!
//! This module handles:
//! - Splitting row/column extents into page tiles
//! - Resolving merged regions and their composite borders
//! - Breaking cell text into lines that fit a width
//! - Computing page-local rectangles and emitting draw commands

mod issues;
mod merge;
mod page_break;
mod plan;
mod sheet_layout;
mod text_wrap;

pub use issues::LayoutIssue;
pub use merge::MergeTable;
pub use page_break::{break_into_pages, BreakMode};
pub use plan::{layout_sheet, render_sheet, DrawCommand, PagePlan, SheetPlan};
pub use sheet_layout::{CellRect, SheetLayout};
pub use text_wrap::{centered_x, line_baseline_offset, wrap, TextLine, TextWrapper};
