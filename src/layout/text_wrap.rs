//! Line breaking and centering for single-font cell text.
//!
//! Explicit line breaks split the text into "real" lines first. A real line
//! that does not fit is broken at whitespace, and a single word that still
//! does not fit is broken before each `/` (dates, paths). Anything left is
//! emitted whole and overflows the cell.

use serde::Serialize;

/// One display line and its measured width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    pub width: f32,
}

/// Greedy line breaker for a fixed available width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextWrapper {
    max_width: f32,
    margin: f32,
}

impl TextWrapper {
    pub fn new(max_width: f32) -> Self {
        Self {
            max_width,
            margin: 0.0,
        }
    }

    /// Reserve `margin` of the width as padding; lines are fit into `max_width - margin`.
    #[must_use]
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin.max(0.0);
        self
    }

    /// Width lines must fit into.
    pub fn available_width(&self) -> f32 {
        (self.max_width - self.margin).max(0.0)
    }

    /// Break `text` into trimmed display lines.
    ///
    /// `measure` returns the rendered width of a string in the same unit as
    /// the wrapper's width. Empty interior lines are kept so explicit blank
    /// lines still take vertical space.
    pub fn wrap<F>(&self, text: &str, mut measure: F) -> Vec<TextLine>
    where
        F: FnMut(&str) -> f32,
    {
        let available = self.available_width();
        let mut pieces: Vec<String> = Vec::new();

        for real_line in split_real_lines(text) {
            if measure(&real_line) > available {
                break_real_line(&real_line, available, &mut measure, &mut pieces);
            } else {
                pieces.push(real_line);
            }
        }

        pieces
            .iter()
            .map(|piece| {
                let text = piece.trim().to_string();
                let width = if text.is_empty() { 0.0 } else { measure(&text) };
                TextLine { text, width }
            })
            .collect()
    }
}

/// Wrap with no margin; see [`TextWrapper::wrap`].
pub fn wrap<F>(text: &str, max_width: f32, measure: F) -> Vec<TextLine>
where
    F: FnMut(&str) -> f32,
{
    TextWrapper::new(max_width).wrap(text, measure)
}

/// Split on `\n`, `\r\n` and lone `\r`.
///
/// Whitespace-only segments become empty lines and trailing empty lines are
/// dropped.
fn split_real_lines(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<String> = normalized
        .split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                line.to_string()
            }
        })
        .collect();
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}

fn break_real_line<F>(line: &str, available: f32, measure: &mut F, out: &mut Vec<String>)
where
    F: FnMut(&str) -> f32,
{
    let mut current = String::new();

    for word in line.split_whitespace() {
        if measure(word) > available {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            out.extend(split_before_slashes(word).into_iter().map(str::to_string));
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{current} {word}");
        if measure(&candidate) <= available {
            current = candidate;
        } else {
            out.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
}

/// `"a/b/c"` becomes `["a", "/b", "/c"]`. Words without `/` come back whole.
fn split_before_slashes(word: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut rest = word;
    while let Some(pos) = rest
        .char_indices()
        .skip(1)
        .find(|&(_, ch)| ch == '/')
        .map(|(idx, _)| idx)
    {
        let (head, tail) = rest.split_at(pos);
        fragments.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        fragments.push(rest);
    }
    fragments
}

/// Baseline offset of line `index` of `line_count` from the top of a cell.
///
/// Lines are 1.5 font sizes apart and fan out symmetrically around the
/// cell's vertical center. For a single line the offset is
/// `0.5 * (cell_height + font_size)`, i.e. the line's middle sits on the
/// cell's middle.
#[allow(clippy::cast_precision_loss)]
pub fn line_baseline_offset(
    index: usize,
    line_count: usize,
    cell_height: f32,
    font_size: f32,
) -> f32 {
    let spread = 0.75 * line_count.saturating_sub(1) as f32;
    let step = 1.5 * index as f32;
    0.5 * (cell_height + font_size) - (spread - step) * font_size
}

/// Left edge that centers a line of `line_width` in a cell starting at `x`.
pub fn centered_x(x: f32, cell_width: f32, line_width: f32) -> f32 {
    x + 0.5 * (cell_width - line_width)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_precision_loss
)]
mod tests {
    use super::*;

    /// One unit per character.
    fn chars(s: &str) -> f32 {
        s.chars().count() as f32
    }

    fn texts(lines: &[TextLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_fitting_text_is_untouched() {
        let lines = wrap("hello", 10.0, chars);
        assert_eq!(lines, vec![TextLine { text: "hello".into(), width: 5.0 }]);
    }

    #[test]
    fn test_greedy_word_packing() {
        let lines = wrap("alpha beta gamma", chars("alpha beta"), chars);
        assert_eq!(texts(&lines), vec!["alpha beta", "gamma"]);
    }

    #[test]
    fn test_margin_shrinks_available_width() {
        let wrapper = TextWrapper::new(12.0).with_margin(2.0);
        assert_eq!(wrapper.available_width(), 10.0);
        let lines = wrapper.wrap("alpha beta gamma", chars);
        assert_eq!(texts(&lines), vec!["alpha beta", "gamma"]);

        let lines = TextWrapper::new(12.0).with_margin(4.0).wrap("alpha beta gamma", chars);
        assert_eq!(texts(&lines), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_slash_fallback() {
        let lines = wrap("2024/01/15", 5.0, chars);
        assert_eq!(texts(&lines), vec!["2024", "/01", "/15"]);
    }

    #[test]
    fn test_oversized_word_flushes_pending_line() {
        let lines = wrap("on 2024/01/15 ok", 5.0, chars);
        assert_eq!(texts(&lines), vec!["on", "2024", "/01", "/15", "ok"]);
    }

    #[test]
    fn test_unsplittable_word_overflows() {
        let lines = wrap("supercalifragilistic", 5.0, chars);
        assert_eq!(texts(&lines), vec!["supercalifragilistic"]);
        assert_eq!(lines[0].width, 20.0);
    }

    #[test]
    fn test_explicit_line_breaks() {
        let lines = wrap("one\r\ntwo\rthree\n\nfive\n\n", 100.0, chars);
        assert_eq!(texts(&lines), vec!["one", "two", "three", "", "five"]);
        assert_eq!(lines[3].width, 0.0);
    }

    #[test]
    fn test_whitespace_only_lines_are_blank_at_any_width() {
        for text in ["a\n  \nb", "a\n      \nb", "a\n\t\t\t\t\nb"] {
            let lines = wrap(text, 3.0, chars);
            assert_eq!(texts(&lines), vec!["a", "", "b"], "{text:?}");
            assert_eq!(lines[1].width, 0.0);
        }
        assert_eq!(wrap("x\n   \n \n", 3.0, chars).len(), 1);
        assert!(wrap("     ", 3.0, chars).is_empty());
    }

    #[test]
    fn test_lines_are_trimmed() {
        let lines = wrap("  padded  \n x ", 100.0, chars);
        assert_eq!(texts(&lines), vec!["padded", "x"]);
    }

    #[test]
    fn test_empty_text_has_no_lines() {
        assert!(wrap("", 10.0, chars).is_empty());
        assert!(wrap("\n\n", 10.0, chars).is_empty());
    }

    #[test]
    fn test_width_bound_holds_for_splittable_text() {
        let text = "the quick brown fox jumps over the lazy dog again and again";
        for max in 5..30 {
            let max = max as f32;
            for line in wrap(text, max, chars) {
                assert!(line.width <= max, "{:?} exceeds {max}", line.text);
            }
        }
    }

    #[test]
    fn test_wrap_is_idempotent() {
        let text = "alpha beta gamma\n2024/01/15 delta";
        assert_eq!(wrap(text, 7.0, chars), wrap(text, 7.0, chars));
    }

    #[test]
    fn test_split_before_slashes() {
        assert_eq!(split_before_slashes("a/b/c"), vec!["a", "/b", "/c"]);
        assert_eq!(split_before_slashes("/a"), vec!["/a"]);
        assert_eq!(split_before_slashes("a//b"), vec!["a", "/", "/b"]);
        assert_eq!(split_before_slashes("日付/十五"), vec!["日付", "/十五"]);
        assert_eq!(split_before_slashes("plain"), vec!["plain"]);
    }

    #[test]
    fn test_single_line_is_vertically_centered() {
        let (height, size) = (40.0, 10.0);
        let baseline = line_baseline_offset(0, 1, height, size);
        assert_eq!(baseline - 0.5 * size, 0.5 * height);
    }

    #[test]
    fn test_lines_fan_out_symmetrically() {
        let (height, size) = (60.0, 10.0);
        let offsets: Vec<f32> = (0..3)
            .map(|i| line_baseline_offset(i, 3, height, size))
            .collect();
        assert_eq!(offsets, vec![20.0, 35.0, 50.0]);
        // Middle line sits where a lone line would
        assert_eq!(offsets[1], line_baseline_offset(0, 1, height, size));
    }

    #[test]
    fn test_centered_x() {
        assert_eq!(centered_x(10.0, 100.0, 40.0), 40.0);
        // Overflowing lines extend equally past both edges
        assert_eq!(centered_x(10.0, 100.0, 120.0), 0.0);
    }
}
