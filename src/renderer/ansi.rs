//! ANSI escape sequences used by the inline repaint engine.
//!
//! Only cursor movement, visibility and erasure: frames are plain text and
//! the repaint engine never addresses absolute positions.

use std::io::Write;

/// Control Sequence Introducer.
pub const CSI: &str = "\x1b[";

// =============================================================================
// Cursor
// =============================================================================

/// Move cursor up by n rows. Zero writes nothing.
#[inline]
pub fn cursor_up<W: Write>(w: &mut W, n: usize) -> std::io::Result<()> {
    if n > 0 {
        write!(w, "\x1b[{}A", n)
    } else {
        Ok(())
    }
}

/// Move cursor to the first column of the current row.
#[inline]
pub fn cursor_column_zero<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[G")
}

#[inline]
pub fn cursor_hide<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?25l")
}

#[inline]
pub fn cursor_show<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?25h")
}

// =============================================================================
// Erase
// =============================================================================

/// Clear from cursor to end of screen.
#[inline]
pub fn erase_down<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[J")
}

/// Erase the `count` rows above the cursor and leave it at their start.
pub fn erase_lines<W: Write>(w: &mut W, count: usize) -> std::io::Result<()> {
    if count == 0 {
        return Ok(());
    }
    cursor_up(w, count)?;
    cursor_column_zero(w)?;
    erase_down(w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_cursor_up_zero_is_empty() {
        assert_eq!(render(|w| cursor_up(w, 0)), "");
        assert_eq!(render(|w| cursor_up(w, 3)), "\x1b[3A");
    }

    #[test]
    fn test_erase_lines() {
        assert_eq!(render(|w| erase_lines(w, 2)), "\x1b[2A\x1b[G\x1b[J");
        assert_eq!(render(|w| erase_lines(w, 0)), "");
    }

    #[test]
    fn test_cursor_visibility() {
        assert_eq!(render(cursor_hide), format!("{CSI}?25l"));
        assert_eq!(render(cursor_show), format!("{CSI}?25h"));
    }
}
