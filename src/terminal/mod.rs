//! Terminal output streams.
//!
//! - [`StdoutStream`] - the real terminal
//! - [`BufferStream`] - in-memory capture for embedding and tests

mod stdout;
mod stream;

pub use stdout::{detect_columns, StdoutStream};
pub use stream::{
    BufferStream, OutputStream, ResizeListener, ResizeSubscription, SharedReader, SharedWriter,
    DEFAULT_COLUMNS,
};
