//! Layout configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.
//! Page settings left unset fall back to the sheet's own print settings and
//! then to A4 portrait.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, XlpagerError};
use crate::layout::BreakMode;
use crate::page_setup::PageGeometry;
use crate::types::{Orientation, PageMargins, PageSetup, PageSize, DEFAULT_FONT_SIZE};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Paper size; `None` defers to the sheet's page setup
    pub page_size: Option<PageSize>,
    /// Orientation; `None` defers to the sheet's page setup
    pub orientation: Option<Orientation>,
    /// Margins in points; `None` defers to the sheet's page setup
    pub margins: Option<PageMargins>,
    /// Ignore print settings stored in the sheet
    pub ignore_sheet_setup: bool,
    pub break_mode: BreakMode,
    /// Draw the visible part of a merged region whose anchor is on an earlier page
    pub continue_split_regions: bool,
    /// Horizontal text padding in points; `None` uses the cell's font size
    pub text_margin: Option<f32>,
    /// Font size for cells whose font is missing or has no usable size
    pub default_font_size: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_size: None,
            orientation: None,
            margins: None,
            ignore_sheet_setup: false,
            break_mode: BreakMode::Complete,
            continue_split_regions: true,
            text_margin: None,
            default_font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl LayoutConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.default_font_size.is_finite() && self.default_font_size > 0.0) {
            return Err(XlpagerError::Config(format!(
                "defaultFontSize must be positive, got {}",
                self.default_font_size
            )));
        }
        if let Some(margin) = self.text_margin {
            if !(margin.is_finite() && margin >= 0.0) {
                return Err(XlpagerError::Config(format!(
                    "textMargin must be non-negative, got {margin}"
                )));
            }
        }
        if let Some(m) = self.margins {
            if !m.is_valid() {
                return Err(XlpagerError::Config(format!(
                    "margins must be non-negative, got {m:?}"
                )));
            }
        }
        Ok(())
    }

    /// Resolve the page geometry for a sheet.
    ///
    /// Sheet margins that are negative, non-finite or leave no content box on
    /// the resolved paper are dropped in favour of the default margins.
    pub fn geometry_for(&self, setup: Option<&PageSetup>) -> PageGeometry {
        let setup = if self.ignore_sheet_setup { None } else { setup };

        let size = self
            .page_size
            .or_else(|| {
                setup
                    .and_then(|s| s.paper_size)
                    .and_then(PageSize::from_paper_code)
            })
            .unwrap_or_default();
        let orientation = self
            .orientation
            .or_else(|| setup.and_then(|s| s.orientation))
            .unwrap_or_default();
        if let Some(margins) = self.margins {
            return PageGeometry::new(size, orientation, margins);
        }

        let default = PageGeometry::new(size, orientation, PageMargins::default());
        match setup.and_then(|s| s.margins) {
            Some(margins) => {
                let geometry = PageGeometry { margins, ..default };
                if margins.is_valid() && geometry.has_content_area() {
                    geometry
                } else {
                    log::warn!(
                        "ignoring sheet margins {margins:?}: no content area on {size:?} {orientation:?}"
                    );
                    default
                }
            }
            None => default,
        }
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
    fn test_empty_object_is_default() {
        let config = LayoutConfig::from_json_str("{}").unwrap();
        assert_eq!(config, LayoutConfig::default());
        assert!(config.continue_split_regions);
        assert_eq!(config.break_mode, BreakMode::Complete);
    }

    #[test]
    fn test_camel_case_fields() {
        let config = LayoutConfig::from_json_str(
            r#"{"pageSize":"a3","orientation":"landscape","breakMode":"legacy",
                "margins":{"left":10,"right":10,"top":20,"bottom":20},"textMargin":2}"#,
        )
        .unwrap();
        assert_eq!(config.page_size, Some(PageSize::A3));
        assert_eq!(config.orientation, Some(Orientation::Landscape));
        assert_eq!(config.break_mode, BreakMode::Legacy);
        assert_eq!(config.text_margin, Some(2.0));
        assert_eq!(config.margins.unwrap().top, 20.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = LayoutConfig::from_json_str(r#"{"defaultFontSize":0}"#).unwrap_err();
        assert!(matches!(err, XlpagerError::Config(_)));
        let err = LayoutConfig::from_json_str(r#"{"textMargin":-1}"#).unwrap_err();
        assert!(matches!(err, XlpagerError::Config(_)));
        let err = LayoutConfig::from_json_str(r#"{"margins":{"left":-5}}"#).unwrap_err();
        assert!(matches!(err, XlpagerError::Config(_)));
        let err = LayoutConfig::from_json_str(r#"{"pageSize":"b5"}"#).unwrap_err();
        assert!(matches!(err, XlpagerError::Json(_)));
    }

    #[test]
    fn test_geometry_defaults_to_a4_portrait() {
        let geometry = LayoutConfig::default().geometry_for(None);
        assert_eq!(geometry, PageGeometry::default());
    }

    #[test]
    fn test_sheet_setup_fills_unset_fields() {
        let setup = PageSetup {
            paper_size: Some(1),
            orientation: Some(Orientation::Landscape),
            margins: Some(PageMargins::uniform(36.0)),
        };
        let geometry = LayoutConfig::default().geometry_for(Some(&setup));
        assert_eq!((geometry.width, geometry.height), (792.0, 612.0));
        assert_eq!(geometry.margins, PageMargins::uniform(36.0));

        let config = LayoutConfig {
            page_size: Some(PageSize::A5),
            ..LayoutConfig::default()
        };
        let geometry = config.geometry_for(Some(&setup));
        assert_eq!((geometry.width, geometry.height), (595.28, 419.53));
    }

    #[test]
    fn test_unusable_sheet_margins_fall_back_to_defaults() {
        let defaults = PageGeometry::default();
        for margins in [
            PageMargins::uniform(400.0),
            PageMargins::uniform(-10.0),
            PageMargins {
                left: 300.0,
                right: 300.0,
                ..PageMargins::uniform(10.0)
            },
            PageMargins::uniform(f32::NAN),
        ] {
            let setup = PageSetup {
                margins: Some(margins),
                ..PageSetup::default()
            };
            let geometry = LayoutConfig::default().geometry_for(Some(&setup));
            assert_eq!(geometry.margins, defaults.margins, "{margins:?}");
        }
    }

    #[test]
    fn test_sheet_margins_checked_against_resolved_paper() {
        // 320pt side margins fit on landscape A4 but not on portrait A4
        let wide = PageMargins {
            left: 320.0,
            right: 320.0,
            ..PageMargins::uniform(20.0)
        };
        let setup = PageSetup {
            orientation: Some(Orientation::Landscape),
            margins: Some(wide),
            ..PageSetup::default()
        };
        let geometry = LayoutConfig::default().geometry_for(Some(&setup));
        assert_eq!(geometry.margins, wide);
        assert!(geometry.has_content_area());

        let portrait = LayoutConfig {
            orientation: Some(Orientation::Portrait),
            ..LayoutConfig::default()
        };
        let geometry = portrait.geometry_for(Some(&setup));
        assert_eq!(geometry.margins, PageMargins::default());
    }

    #[test]
    fn test_ignore_sheet_setup() {
        let setup = PageSetup {
            paper_size: Some(1),
            orientation: Some(Orientation::Landscape),
            margins: None,
        };
        let config = LayoutConfig {
            ignore_sheet_setup: true,
            ..LayoutConfig::default()
        };
        assert_eq!(config.geometry_for(Some(&setup)), PageGeometry::default());
    }
}
