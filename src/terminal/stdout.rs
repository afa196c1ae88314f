//! Process stdout as an [`OutputStream`].
//!
//! Width comes from crossterm, falling back to `COLUMNS` and then
//! [`DEFAULT_COLUMNS`]. Resizes arrive through a SIGWINCH listener thread
//! that runs only while someone is subscribed.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, warn};

use crate::pipeline::lock_or_recover;

use super::stream::{ListenerSet, OutputStream, ResizeListener, ResizeSubscription, DEFAULT_COLUMNS};

/// Width of the controlling terminal.
pub fn detect_columns() -> u16 {
    if let Ok((width, _)) = crossterm::terminal::size() {
        if width > 0 {
            return width;
        }
    }
    columns_from_env(std::env::var("COLUMNS").ok().as_deref())
}

fn columns_from_env(value: Option<&str>) -> u16 {
    value
        .and_then(|v| v.trim().parse::<u16>().ok())
        .filter(|&w| w > 0)
        .unwrap_or(DEFAULT_COLUMNS)
}

#[cfg(not(windows))]
struct ResizeWatcher {
    handle: signal_hook::iterator::Handle,
    thread: thread::JoinHandle<()>,
}

#[cfg(not(windows))]
impl ResizeWatcher {
    fn spawn(listeners: Arc<Mutex<ListenerSet>>) -> io::Result<Self> {
        let mut signals = signal_hook::iterator::Signals::new([signal_hook::consts::SIGWINCH])?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name("tui-host-resize".to_owned())
            .spawn(move || {
                for _ in signals.forever() {
                    let columns = detect_columns();
                    debug!(columns, "terminal resized");
                    let snapshot = lock_or_recover(&listeners).snapshot();
                    for listener in snapshot {
                        listener(columns);
                    }
                }
            })?;
        Ok(Self { handle, thread })
    }

    fn stop(self) {
        self.handle.close();
        if self.thread.thread().id() == thread::current().id() {
            return;
        }
        if let Err(error) = self.thread.join() {
            warn!(?error, "resize listener thread panicked while stopping");
        }
    }
}

/// Frames to stdout.
pub struct StdoutStream {
    stdout: io::Stdout,
    listeners: Arc<Mutex<ListenerSet>>,
    #[cfg(not(windows))]
    watcher: Option<ResizeWatcher>,
}

impl StdoutStream {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            listeners: Arc::new(Mutex::new(ListenerSet::default())),
            #[cfg(not(windows))]
            watcher: None,
        }
    }
}

impl Default for StdoutStream {
    fn default() -> Self {
        Self::new()
    }
}

impl StdoutStream {
    #[cfg(not(windows))]
    fn start_watcher(&mut self) -> io::Result<()> {
        if self.watcher.is_none() {
            self.watcher = Some(ResizeWatcher::spawn(Arc::clone(&self.listeners))?);
        }
        Ok(())
    }

    #[cfg(windows)]
    fn start_watcher(&mut self) -> io::Result<()> {
        warn!("resize notifications are not supported on windows");
        Ok(())
    }

    #[cfg(not(windows))]
    fn stop_watcher(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.stop();
        }
    }

    #[cfg(windows)]
    fn stop_watcher(&mut self) {}
}

impl OutputStream for StdoutStream {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.stdout.lock().write_all(s.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.lock().flush()
    }

    fn columns(&self) -> u16 {
        detect_columns()
    }

    fn on_resize(&mut self, listener: ResizeListener) -> io::Result<ResizeSubscription> {
        self.start_watcher()?;
        Ok(lock_or_recover(&self.listeners).add(listener))
    }

    fn off_resize(&mut self, subscription: ResizeSubscription) {
        let empty = {
            let mut listeners = lock_or_recover(&self.listeners);
            listeners.remove(subscription);
            listeners.is_empty()
        };
        if empty {
            self.stop_watcher();
        }
    }
}

impl Drop for StdoutStream {
    fn drop(&mut self) {
        self.stop_watcher();
    }
}
