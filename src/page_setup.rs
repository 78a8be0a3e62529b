//! Page geometry: paper sizes, orientation and the printable content box.
//!
//! Also parses the worksheet `pageSetup` and `pageMargins` elements so a
//! sheet's own print settings can drive its geometry.

use quick_xml::events::BytesStart;

use crate::types::{Orientation, PageMargins, PageSetup, PageSize};
use crate::xml_helpers::{attr_f64, attr_string, attr_u32};

/// Points per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Paper sizes in portrait points (width, height).
const PAGE_SIZES: [(PageSize, f32, f32); 9] = [
    (PageSize::A0, 2383.94, 3370.39),
    (PageSize::A1, 1683.78, 2383.94),
    (PageSize::A2, 1190.55, 1683.78),
    (PageSize::A3, 841.89, 1190.55),
    (PageSize::A4, 595.28, 841.89),
    (PageSize::A5, 419.53, 595.28),
    (PageSize::A6, 297.64, 419.53),
    (PageSize::Letter, 612.0, 792.0),
    (PageSize::Legal, 612.0, 1008.0),
];

/// SpreadsheetML `paperSize` codes for the sizes in [`PAGE_SIZES`].
const PAPER_CODES: [(u32, PageSize); 7] = [
    (1, PageSize::Letter),
    (5, PageSize::Legal),
    (8, PageSize::A3),
    (9, PageSize::A4),
    (11, PageSize::A5),
    (66, PageSize::A2),
    (70, PageSize::A6),
];

impl PageSize {
    /// Portrait (width, height) in points.
    #[must_use]
    pub fn dimensions(self) -> (f32, f32) {
        PAGE_SIZES
            .iter()
            .find(|(size, _, _)| *size == self)
            .map_or((595.28, 841.89), |&(_, w, h)| (w, h))
    }

    /// Map a SpreadsheetML `paperSize` code. Unknown codes yield `None`.
    #[must_use]
    pub fn from_paper_code(code: u32) -> Option<Self> {
        PAPER_CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|&(_, size)| size)
    }
}

impl Orientation {
    /// Orient portrait (width, height); landscape swaps the two.
    #[must_use]
    pub fn apply(self, (width, height): (f32, f32)) -> (f32, f32) {
        match self {
            Orientation::Portrait => (width, height),
            Orientation::Landscape => (height, width),
        }
    }
}

/// Full page size plus margins. All values in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margins: PageMargins,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::new(PageSize::A4, Orientation::Portrait, PageMargins::default())
    }
}

impl PageGeometry {
    pub fn new(size: PageSize, orientation: Orientation, margins: PageMargins) -> Self {
        let (width, height) = orientation.apply(size.dimensions());
        Self {
            width,
            height,
            margins,
        }
    }

    /// Width available to grid content.
    #[must_use]
    pub fn content_width(&self) -> f32 {
        (self.width - self.margins.left - self.margins.right).max(0.0)
    }

    /// Height available to grid content.
    #[must_use]
    pub fn content_height(&self) -> f32 {
        (self.height - self.margins.top - self.margins.bottom).max(0.0)
    }

    /// True when the margins leave a positive content box.
    #[must_use]
    pub fn has_content_area(&self) -> bool {
        self.content_width() > 0.0 && self.content_height() > 0.0
    }

    /// Top-left corner of the content box in page coordinates (y grows downward).
    #[must_use]
    pub fn content_origin(&self) -> (f32, f32) {
        (self.margins.left, self.margins.top)
    }
}

/// Parse pageMargins element (inches) into margins in points.
///
/// Example XML:
/// ```xml
/// <pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>
/// ```
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn parse_page_margins(e: &BytesStart) -> PageMargins {
    let inches = |key: &[u8]| attr_f64(e, key).unwrap_or(0.0) as f32 * POINTS_PER_INCH;
    PageMargins {
        left: inches(b"left"),
        right: inches(b"right"),
        top: inches(b"top"),
        bottom: inches(b"bottom"),
    }
}

/// Parse pageSetup element
///
/// Example XML:
/// ```xml
/// <pageSetup paperSize="9" orientation="landscape" scale="100" fitToWidth="1" fitToHeight="0"/>
/// ```
pub(crate) fn parse_page_setup(e: &BytesStart) -> PageSetup {
    PageSetup {
        paper_size: attr_u32(e, b"paperSize"),
        orientation: attr_string(e, b"orientation").map(|s| match s.as_str() {
            "landscape" => Orientation::Landscape,
            _ => Orientation::Portrait,
        }),
        margins: None,
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
    use quick_xml::events::Event;
    use quick_xml::Reader;

    #[test]
    fn test_a4_portrait_dimensions() {
        let geometry = PageGeometry::new(
            PageSize::A4,
            Orientation::Portrait,
            PageMargins::uniform(0.0),
        );
        assert!((geometry.width - 595.28).abs() < 0.01);
        assert!((geometry.height - 841.89).abs() < 0.01);
    }

    #[test]
    fn test_landscape_swaps_every_size() {
        for (size, w, h) in PAGE_SIZES {
            let (lw, lh) = Orientation::Landscape.apply(size.dimensions());
            assert_eq!((lw, lh), (h, w), "{size:?}");
        }
    }

    #[test]
    fn test_default_geometry_matches_legacy_content_box() {
        // 94% of the A4 width and 30pt less than its height
        let geometry = PageGeometry::default();
        assert!((geometry.content_width() - 595.28 * 0.94).abs() < 0.05);
        assert!((geometry.content_height() - (841.89 - 30.0)).abs() < 0.01);
        assert_eq!(geometry.content_origin(), (17.86, 15.0));
    }

    #[test]
    fn test_content_box_never_negative() {
        let geometry = PageGeometry::new(
            PageSize::A6,
            Orientation::Portrait,
            PageMargins::uniform(400.0),
        );
        assert_eq!(geometry.content_width(), 0.0);
        assert_eq!(geometry.content_height(), 0.0);
        assert!(!geometry.has_content_area());
        assert!(PageGeometry::default().has_content_area());
    }

    #[test]
    fn test_paper_codes() {
        assert_eq!(PageSize::from_paper_code(9), Some(PageSize::A4));
        assert_eq!(PageSize::from_paper_code(1), Some(PageSize::Letter));
        assert_eq!(PageSize::from_paper_code(9999), None);
    }

    #[test]
    fn test_parse_page_margins() {
        let xml = r#"<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>"#;
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();

        if let Ok(Event::Empty(ref e)) = reader.read_event_into(&mut buf) {
            let margins = parse_page_margins(e);
            assert!((margins.left - 50.4).abs() < 0.001);
            assert!((margins.right - 50.4).abs() < 0.001);
            assert!((margins.top - 54.0).abs() < 0.001);
            assert!((margins.bottom - 54.0).abs() < 0.001);
        } else {
            panic!("Failed to parse XML");
        }
    }

    #[test]
    fn test_parse_page_setup_landscape() {
        let xml = r#"<pageSetup paperSize="9" orientation="landscape" scale="100" fitToWidth="1" fitToHeight="0"/>"#;
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();

        if let Ok(Event::Empty(ref e)) = reader.read_event_into(&mut buf) {
            let setup = parse_page_setup(e);
            assert_eq!(setup.paper_size, Some(9));
            assert_eq!(setup.orientation, Some(Orientation::Landscape));
        } else {
            panic!("Failed to parse XML");
        }
    }

    #[test]
    fn test_parse_page_setup_defaults() {
        let xml = r#"<pageSetup/>"#;
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();

        if let Ok(Event::Empty(ref e)) = reader.read_event_into(&mut buf) {
            let setup = parse_page_setup(e);
            assert_eq!(setup.paper_size, None);
            assert_eq!(setup.orientation, None);
        } else {
            panic!("Failed to parse XML");
        }
    }
}
