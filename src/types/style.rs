use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// Which of a cell's four outer edges are ruled.
///
/// Bit values follow the drawing convention TOP=1, RIGHT=2, BOTTOM=4, LEFT=8.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BorderFlags(u8);

impl BorderFlags {
    pub const NONE: Self = Self(0);
    pub const TOP: Self = Self(1);
    pub const RIGHT: Self = Self(2);
    pub const BOTTOM: Self = Self(4);
    pub const LEFT: Self = Self(8);
    pub const ALL: Self = Self(15);

    /// Build flags from raw bits, dropping anything above LEFT.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn set(&mut self, other: Self, on: bool) {
        if on {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl BitOr for BorderFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for BorderFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A cell's own border style as four independent booleans.
///
/// Line style and color are not tracked; an edge is either ruled or not.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct CellBorders {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl CellBorders {
    /// All four edges ruled.
    pub const BOXED: Self = Self {
        top: true,
        right: true,
        bottom: true,
        left: true,
    };

    #[must_use]
    pub fn flags(self) -> BorderFlags {
        let mut flags = BorderFlags::NONE;
        flags.set(BorderFlags::TOP, self.top);
        flags.set(BorderFlags::RIGHT, self.right);
        flags.set(BorderFlags::BOTTOM, self.bottom);
        flags.set(BorderFlags::LEFT, self.left);
        flags
    }
}

/// Index into a sheet's font table.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct FontRef(pub u32);

/// Default font size in points when a cell carries no font.
pub const DEFAULT_FONT_SIZE: f32 = 11.0;

/// Default font family (Excel's body font).
pub const DEFAULT_FONT_NAME: &str = "Calibri";

/// A resolved font: family name, size in points and weight.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Font {
    pub name: String,
    pub size: f32,
    pub bold: bool,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            name: DEFAULT_FONT_NAME.to_string(),
            size: DEFAULT_FONT_SIZE,
            bold: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_border_flag_bits() {
        let flags = BorderFlags::TOP | BorderFlags::LEFT;
        assert_eq!(flags.bits(), 9);
        assert!(flags.contains(BorderFlags::TOP));
        assert!(!flags.contains(BorderFlags::RIGHT));
        assert_eq!(BorderFlags::from_bits(0xFF), BorderFlags::ALL);
    }

    #[test]
    fn test_cell_borders_to_flags() {
        let borders = CellBorders {
            top: true,
            right: false,
            bottom: true,
            left: false,
        };
        assert_eq!(borders.flags(), BorderFlags::TOP | BorderFlags::BOTTOM);
        assert_eq!(CellBorders::BOXED.flags(), BorderFlags::ALL);
        assert!(CellBorders::default().flags().is_empty());
    }

    #[test]
    fn test_border_flags_serialize_as_number() {
        let json = serde_json::to_string(&(BorderFlags::RIGHT | BorderFlags::BOTTOM)).unwrap();
        assert_eq!(json, "6");
    }
}
