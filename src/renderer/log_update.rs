//! Log-update style repaint.
//!
//! Each frame replaces the previous one in place: move the cursor up over
//! the lines painted last time, erase to the end of the screen, write the
//! new frame. The only state carried between frames is how many lines the
//! previous frame occupied.
//!
//! Every frame is followed by a line break, so after a write the cursor
//! sits on the line below the frame and `previous_line_count` rows above it
//! belong to the frame.

use std::io;

use tracing::{debug, error};

use crate::terminal::OutputStream;

use super::ansi;

/// Number of terminal lines a frame occupies.
///
/// Line breaks + 1, or 0 for an empty frame.
pub fn line_count(frame: &str) -> usize {
    if frame.is_empty() {
        0
    } else {
        frame.matches('\n').count() + 1
    }
}

/// Incremental repaint state bound to one output stream.
pub struct LogUpdate {
    output: Box<dyn OutputStream>,
    buffer: Vec<u8>,
    previous_line_count: usize,
    cursor_hidden: bool,
    done: bool,
}

impl LogUpdate {
    pub fn new(output: Box<dyn OutputStream>) -> Self {
        Self {
            output,
            buffer: Vec::with_capacity(4096),
            previous_line_count: 0,
            cursor_hidden: false,
            done: false,
        }
    }

    /// Replace the previous frame with `frame`.
    pub fn update(&mut self, frame: &str) -> io::Result<()> {
        if self.done {
            debug!("update after done ignored");
            return Ok(());
        }

        ansi::erase_lines(&mut self.buffer, self.previous_line_count)?;
        if !frame.is_empty() {
            self.buffer.extend_from_slice(frame.as_bytes());
            self.buffer.push(b'\n');
        }
        self.previous_line_count = line_count(frame);
        self.flush_buffer()
    }

    /// Erase the previous frame without writing a new one.
    pub fn clear(&mut self) -> io::Result<()> {
        if self.previous_line_count == 0 {
            return Ok(());
        }
        ansi::erase_lines(&mut self.buffer, self.previous_line_count)?;
        self.previous_line_count = 0;
        self.flush_buffer()
    }

    /// Stop repainting. The last frame stays on screen and the cursor is
    /// restored.
    pub fn done(&mut self) -> io::Result<()> {
        if self.done {
            return Ok(());
        }
        self.done = true;
        self.previous_line_count = 0;
        self.show_cursor()
    }

    pub fn hide_cursor(&mut self) -> io::Result<()> {
        if self.cursor_hidden {
            return Ok(());
        }
        ansi::cursor_hide(&mut self.buffer)?;
        self.cursor_hidden = true;
        self.flush_buffer()
    }

    /// Show the cursor if this instance hid it.
    pub fn show_cursor(&mut self) -> io::Result<()> {
        if !self.cursor_hidden {
            return Ok(());
        }
        ansi::cursor_show(&mut self.buffer)?;
        self.cursor_hidden = false;
        self.flush_buffer()
    }

    pub fn previous_line_count(&self) -> usize {
        self.previous_line_count
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn output(&self) -> &dyn OutputStream {
        self.output.as_ref()
    }

    pub fn output_mut(&mut self) -> &mut dyn OutputStream {
        self.output.as_mut()
    }

    /// One write and one flush per call.
    fn flush_buffer(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let result = match std::str::from_utf8(&self.buffer) {
            Ok(text) => self.output.write_str(text).and_then(|()| self.output.flush()),
            Err(err) => {
                error!(%err, "frame buffer is not valid UTF-8");
                Err(io::Error::new(io::ErrorKind::InvalidData, err))
            }
        };
        self.buffer.clear();
        result
    }
}
