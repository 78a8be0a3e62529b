//! Heuristic text measurement without font files.
//!
//! Widths are estimated per character class as a fraction of the font size
//! and then scaled by how wide the font's digits are relative to Calibri.
//! The same digit-width table drives the column width conversion in the
//! XLSX reader.

use unicode_width::UnicodeWidthChar;

use crate::error::MetricsError;
use crate::grid::MetricsProvider;
use crate::types::Font;

/// Maximum digit width in pixels at 11pt, 96 DPI, for fonts with known metrics.
const DIGIT_WIDTHS: [(&str, f32); 8] = [
    ("Calibri", 7.0),
    ("Arial", 6.5),
    ("Times New Roman", 5.7),
    ("Verdana", 7.5),
    ("Consolas", 7.7),
    ("Courier New", 7.3),
    ("Tahoma", 6.8),
    ("Georgia", 6.2),
];

/// Calibri's digit width; the reference all scales are relative to.
pub const DEFAULT_DIGIT_WIDTH: f32 = 7.0;

const BOLD_FACTOR: f32 = 1.05;
const TAB_SPACES: f32 = 4.0;
const SPACE_EM: f32 = 0.28;

/// Get the maximum digit width for a font, if its metrics are known.
pub fn known_digit_width(font_name: &str) -> Option<f32> {
    DIGIT_WIDTHS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(font_name))
        .map(|&(_, width)| width)
}

/// Get the maximum digit width for a font at 11pt, 96 DPI.
///
/// Falls back to 7.0 (Calibri) if the font is unknown.
pub fn digit_width(font_name: &str) -> f32 {
    known_digit_width(font_name).unwrap_or(DEFAULT_DIGIT_WIDTH)
}

/// Advance width of one character in ems, before font scaling.
///
/// The column class comes from the Unicode width tables: zero-width
/// characters (combining marks, joiners) add nothing and double-width ones
/// take a full em. Single-width characters get a per-letter estimate.
fn char_em(ch: char) -> Result<f32, MetricsError> {
    if ch == '\t' {
        return Ok(SPACE_EM * TAB_SPACES);
    }
    if ch.is_control() {
        return Err(MetricsError::UnsupportedGlyph(ch));
    }
    let em = match UnicodeWidthChar::width(ch) {
        Some(0) => 0.0,
        Some(columns) if columns >= 2 => 1.0,
        _ => narrow_em(ch),
    };
    Ok(em)
}

/// Tuned advances for single-column characters.
fn narrow_em(ch: char) -> f32 {
    match ch {
        ' ' | '\u{a0}' => SPACE_EM,
        'i' | 'j' | 'l' | 'I' | '.' | ',' | ';' | ':' | '\'' | '!' | '|' | '`' => 0.26,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '{' | '}' | '/' | '\\' | '-' => 0.36,
        'm' | 'w' => 0.8,
        'M' | 'W' | '@' | '%' => 0.88,
        '0'..='9' => 0.55,
        c if c.is_ascii_uppercase() => 0.64,
        c if c.is_ascii_lowercase() => 0.5,
        c if c.is_ascii() => 0.55,
        _ => 0.6,
    }
}

/// [`MetricsProvider`] that estimates widths from character classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharWidthMetrics {
    strict_fonts: bool,
}

impl CharWidthMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with [`MetricsError::UnknownFont`] instead of assuming Calibri proportions.
    #[must_use]
    pub fn strict_fonts(mut self, strict: bool) -> Self {
        self.strict_fonts = strict;
        self
    }

    fn font_scale(&self, font: &Font) -> Result<f32, MetricsError> {
        match known_digit_width(&font.name) {
            Some(width) => Ok(width / DEFAULT_DIGIT_WIDTH),
            None if self.strict_fonts => Err(MetricsError::UnknownFont(font.name.clone())),
            None => Ok(1.0),
        }
    }
}

impl MetricsProvider for CharWidthMetrics {
    fn measure_width(
        &self,
        text: &str,
        font: &Font,
        font_size: f32,
    ) -> Result<f32, MetricsError> {
        let scale = self.font_scale(font)?;
        let mut ems = 0.0_f32;
        for ch in text.chars() {
            ems += char_em(ch)?;
        }
        let weight = if font.bold { BOLD_FACTOR } else { 1.0 };
        Ok(ems * font_size * scale * weight)
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

    fn calibri() -> Font {
        Font::default()
    }

    fn font(name: &str, bold: bool) -> Font {
        Font {
            name: name.into(),
            size: 11.0,
            bold,
        }
    }

    #[test]
    fn test_digit_width_table() {
        assert_eq!(digit_width("Calibri"), 7.0);
        assert_eq!(digit_width("arial"), 6.5);
        assert_eq!(digit_width("Consolas"), 7.7);
        assert_eq!(digit_width("Wingdings"), 7.0);
        assert_eq!(known_digit_width("Wingdings"), None);
    }

    #[test]
    fn test_empty_text_is_zero() {
        let m = CharWidthMetrics::new();
        assert_eq!(m.measure_width("", &calibri(), 11.0).unwrap(), 0.0);
    }

    #[test]
    fn test_width_scales_with_size_and_length() {
        let m = CharWidthMetrics::new();
        let one = m.measure_width("abc", &calibri(), 10.0).unwrap();
        let two = m.measure_width("abc", &calibri(), 20.0).unwrap();
        assert!((two - 2.0 * one).abs() < 1e-4);
        let longer = m.measure_width("abcabc", &calibri(), 10.0).unwrap();
        assert!((longer - 2.0 * one).abs() < 1e-4);
    }

    #[test]
    fn test_character_classes_are_ordered() {
        let m = CharWidthMetrics::new();
        let w = |s: &str| m.measure_width(s, &calibri(), 11.0).unwrap();
        assert!(w("i") < w("a"));
        assert!(w("a") < w("A"));
        assert!(w("A") < w("W"));
        assert!(w("W") < w("日"));
    }

    #[test]
    fn test_zero_width_characters_add_nothing() {
        let m = CharWidthMetrics::new();
        let w = |s: &str| m.measure_width(s, &calibri(), 11.0).unwrap();
        assert!((w("e\u{301}") - w("e")).abs() < 1e-4);
        assert!((w("a\u{200b}b") - w("ab")).abs() < 1e-4);
    }

    #[test]
    fn test_double_width_characters_take_a_full_em() {
        let m = CharWidthMetrics::new();
        assert!((m.measure_width("日本", &calibri(), 10.0).unwrap() - 20.0).abs() < 1e-4);
        assert!((m.measure_width("ＡＢ", &calibri(), 10.0).unwrap() - 20.0).abs() < 1e-4);
        // Latin with diacritics stays single width
        let e = m.measure_width("é", &calibri(), 10.0).unwrap();
        assert!(e > 0.0 && e < 10.0);
    }

    #[test]
    fn test_bold_is_wider() {
        let m = CharWidthMetrics::new();
        let regular = m.measure_width("Total", &font("Arial", false), 11.0).unwrap();
        let bold = m.measure_width("Total", &font("Arial", true), 11.0).unwrap();
        assert!(bold > regular);
    }

    #[test]
    fn test_font_scale_follows_digit_width() {
        let m = CharWidthMetrics::new();
        let calibri = m.measure_width("1234", &font("Calibri", false), 11.0).unwrap();
        let georgia = m.measure_width("1234", &font("Georgia", false), 11.0).unwrap();
        assert!((georgia / calibri - 6.2 / 7.0).abs() < 1e-4);
    }

    #[test]
    fn test_control_characters_are_unsupported() {
        let m = CharWidthMetrics::new();
        let err = m.measure_width("a\u{7}b", &calibri(), 11.0).unwrap_err();
        assert_eq!(err, MetricsError::UnsupportedGlyph('\u{7}'));
        // Tabs measure as spaces
        let tab = m.measure_width("\t", &calibri(), 11.0).unwrap();
        let spaces = m.measure_width("    ", &calibri(), 11.0).unwrap();
        assert!((tab - spaces).abs() < 1e-4);
    }

    #[test]
    fn test_strict_fonts() {
        let strict = CharWidthMetrics::new().strict_fonts(true);
        let err = strict
            .measure_width("x", &font("Comic Sans MS", false), 11.0)
            .unwrap_err();
        assert_eq!(err, MetricsError::UnknownFont("Comic Sans MS".into()));
        assert!(CharWidthMetrics::new()
            .measure_width("x", &font("Comic Sans MS", false), 11.0)
            .is_ok());
    }
}
