//! Tracing setup for embedders.
//!
//! Logs go to a file or to stderr. Stdout carries frames and must never
//! receive log lines.

use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::LoggingError;

/// Filter directive for a verbosity level (0=error, 1=warn, 2=info,
/// 3=debug, 4+=trace).
pub fn filter_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    format!("spark_tui_host={level}")
}

/// Install the global subscriber. `RUST_LOG` overrides `verbosity`.
///
/// ```ignore
/// use spark_tui_host::logging::init_logging;
///
/// init_logging(3, Some(Path::new("/tmp/tui-host.log")))?;
/// ```
pub fn init_logging(verbosity: u8, log_file: Option<&Path>) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbosity)));

    match log_file {
        None => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(verbosity >= 3)
                    .with_line_number(verbosity >= 3),
            )
            .try_init()
            .map_err(|e| LoggingError::Init(e.to_string())),
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(file)
                        .with_ansi(false)
                        .with_target(true)
                        .with_file(verbosity >= 3)
                        .with_line_number(verbosity >= 3),
                )
                .try_init()
                .map_err(|e| LoggingError::Init(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_levels() {
        assert_eq!(filter_directive(0), "spark_tui_host=error");
        assert_eq!(filter_directive(2), "spark_tui_host=info");
        assert_eq!(filter_directive(9), "spark_tui_host=trace");
    }

    #[test]
    fn test_second_init_fails() {
        let dir = std::env::temp_dir().join(format!("tui-host-log-{}", std::process::id()));
        let first = init_logging(1, Some(&dir));
        let second = init_logging(1, Some(&dir));
        // Another test may already have installed a subscriber.
        assert!(first.is_err() || second.is_err());
        let _ = std::fs::remove_file(&dir);
    }
}
