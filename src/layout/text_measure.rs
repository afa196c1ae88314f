//! Text Measurement
//!
//! Utilities for measuring text dimensions in terminal cells.
//!
//! Widths come from `unicode-width`: ASCII is 1 cell, CJK and most emoji are
//! 2 cells, combining marks and control characters are 0 cells.
//!
//! Measurement and painting share [`wrap_text`], so the box the layout engine
//! reserves for a text element is exactly the box the painter fills.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a single character in terminal cells.
#[inline]
pub fn char_width(c: char) -> u16 {
    c.width().unwrap_or(0) as u16
}

/// Display width of a string in terminal cells.
pub fn string_width(s: &str) -> u16 {
    u16::try_from(s.width()).unwrap_or(u16::MAX)
}

/// Wrap text to a given width.
///
/// Explicit newlines always break. A line that would exceed `width` breaks
/// before the character that overflows it. A width of 0 disables wrapping.
pub fn wrap_text(text: &str, width: u16) -> Vec<String> {
    if text.is_empty() {
        return vec![];
    }

    if width == 0 {
        return text.split('\n').map(str::to_string).collect();
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_width = 0u16;

    for c in text.chars() {
        if c == '\n' {
            lines.push(std::mem::take(&mut current_line));
            current_width = 0;
            continue;
        }

        let w = char_width(c);
        if current_width + w > width && !current_line.is_empty() {
            lines.push(std::mem::take(&mut current_line));
            current_width = 0;
        }

        current_line.push(c);
        current_width += w;
    }

    if !current_line.is_empty() || text.ends_with('\n') {
        lines.push(current_line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_width_ascii() {
        assert_eq!(string_width("hello"), 5);
        assert_eq!(string_width(""), 0);
        assert_eq!(string_width("a b c"), 5);
    }

    #[test]
    fn test_string_width_wide_chars() {
        assert_eq!(string_width("日本"), 4);
        assert_eq!(char_width('\u{0301}'), 0);
    }

    #[test]
    fn test_wrapped_line_counts() {
        assert_eq!(wrap_text("hello", 10).len(), 1);
        assert!(wrap_text("", 10).is_empty());
        assert_eq!(wrap_text("a\nb\nc", 10).len(), 3);
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("hello world", 5);
        assert_eq!(lines, vec!["hello", " worl", "d"]);
    }

    #[test]
    fn test_wrap_text_keeps_blank_lines() {
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
        assert_eq!(wrap_text("a\n", 10), vec!["a", ""]);
    }

    #[test]
    fn test_wrap_text_zero_width_disables_wrapping() {
        assert_eq!(wrap_text("hello world", 0), vec!["hello world"]);
    }
}
