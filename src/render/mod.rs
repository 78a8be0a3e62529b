//! Output sinks for laid-out pages.
//!
//! This module provides:
//! - The backend-agnostic [`Renderer`] trait and its draw primitives
//! - [`RecordingRenderer`], which keeps every call for inspection or serialization
//! - [`SvgRenderer`], which writes one SVG document per page

pub mod backend;
pub mod recorder;
pub mod svg;

pub use backend::{BorderBox, Renderer, TextRun};
pub use recorder::{RecordedSheet, RecordingRenderer};
pub use svg::{SvgPage, SvgRenderer};
