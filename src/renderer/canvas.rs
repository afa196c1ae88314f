//! Canvas - the character grid a frame is painted onto.
//!
//! Flat row-major storage (`index = y * width + x`). Wide characters take
//! two cells; the second holds a continuation marker and is skipped when the
//! grid is serialized.

use crate::layout::char_width;

/// Continuation cell of a wide character.
const CONTINUATION: char = '\0';

/// Rectangle that writes are confined to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl ClipRect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x
            && y >= self.y
            && u32::from(x) < u32::from(self.x) + u32::from(self.width)
            && u32::from(y) < u32::from(self.y) + u32::from(self.height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u16,
    height: u16,
    cells: Vec<char>,
}

impl Canvas {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![' '; usize::from(width) * usize::from(height)],
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    pub fn get(&self, x: u16, y: u16) -> Option<char> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Write `text` starting at `(x, y)`, clipped to `clip` and the canvas.
    ///
    /// Zero-width characters are dropped. A wide character that does not fit
    /// entirely ends the write. Returns the number of columns advanced.
    pub fn draw_text(&mut self, x: u16, y: u16, text: &str, clip: Option<&ClipRect>) -> u16 {
        let visible = |col: u16| clip.is_none_or(|c| c.contains(col, y));
        let mut col = x;

        for ch in text.chars() {
            let w = char_width(ch);
            if w == 0 {
                continue;
            }
            let last = col.saturating_add(w - 1);
            if last >= self.width || !visible(col) || !visible(last) {
                break;
            }

            if let Some(i) = self.index(col, y) {
                self.cells[i] = ch;
            }
            if w == 2 {
                if let Some(i) = self.index(col + 1, y) {
                    self.cells[i] = CONTINUATION;
                }
            }
            col += w;
        }

        col - x
    }

    /// Serialize to lines: right-trimmed, trailing blank lines dropped.
    pub fn to_frame(&self) -> String {
        let mut lines: Vec<String> = (0..self.height)
            .map(|y| {
                let start = usize::from(y) * usize::from(self.width);
                let row = &self.cells[start..start + usize::from(self.width)];
                let line: String = row.iter().filter(|&&c| c != CONTINUATION).collect();
                line.trim_end().to_string()
            })
            .collect();

        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        lines.join("\n")
    }
}
