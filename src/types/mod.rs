//! Data types for grid pagination.

mod cell;
mod page;
mod style;
mod workbook;

pub use cell::*;
pub use page::*;
pub use style::*;
pub use workbook::*;
