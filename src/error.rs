//! Error types for spark-tui-host.
//!
//! Only [`ExitError`] crosses the public boundary during normal operation.
//! The others are produced and logged internally.

use thiserror::Error;

use crate::pipeline::lifecycle::ExitSignal;

/// An element tag name outside the built-in set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown element tag: {0:?}")]
pub struct TagError(pub String);

/// The host process terminated abnormally while an app was mounted.
///
/// Delivered through [`ExitHandle::wait`](crate::pipeline::ExitHandle::wait).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("process terminated abnormally (code: {code:?}, signal: {})", .signal.map_or_else(|| "none".to_owned(), |s| s.to_string()))]
pub struct ExitError {
    /// Exit code, if the process was asked to exit with one.
    pub code: Option<i32>,
    /// Terminating signal, if any.
    pub signal: Option<ExitSignal>,
}

/// Failure inside the layout engine.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Taffy rejected the operation.
    #[error("layout engine error: {0}")]
    Taffy(#[from] taffy::TaffyError),

    /// The node has no layout handle.
    #[error("node has no layout handle")]
    Detached,
}

pub type LayoutResult<T> = Result<T, LayoutError>;

/// Failure installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot install subscriber: {0}")]
    Init(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_error_names_the_signal() {
        let err = ExitError { code: None, signal: Some(ExitSignal::Other(40)) };
        assert_eq!(
            err.to_string(),
            "process terminated abnormally (code: None, signal: signal 40)"
        );

        let err = ExitError { code: Some(2), signal: None };
        assert!(err.to_string().ends_with("signal: none)"));
    }
}
