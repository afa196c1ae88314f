//! Renderer Module
//!
//! Turns the node tree into terminal output.
//!
//! # Architecture
//!
//! ```text
//! NodeTree + layout -> render_frame -> Canvas -> frame string -> LogUpdate -> OutputStream
//! ```
//!
//! Frames are plain text. [`LogUpdate`] repaints inline: it erases the lines
//! the previous frame occupied and writes the new frame in their place.

pub mod ansi;
mod canvas;
mod frame;
mod log_update;

pub use canvas::{Canvas, ClipRect};
pub use frame::{paint_frame, render_frame};
pub use log_update::{line_count, LogUpdate};
