//! Output stream abstraction and the in-memory stream.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

use crate::pipeline::lock_or_recover;

/// Default width when the terminal cannot be queried.
pub const DEFAULT_COLUMNS: u16 = 80;

/// Called with the new column count after a terminal resize.
pub type ResizeListener = Arc<dyn Fn(u16) + Send + Sync>;

/// Input stream shared with the mounted component tree.
pub type SharedReader = Arc<Mutex<dyn Read + Send>>;

/// Error stream shared with the mounted component tree.
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// Token returned by [`OutputStream::on_resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResizeSubscription(pub(crate) u64);

/// Where frames are written.
pub trait OutputStream: Send {
    fn write_str(&mut self, s: &str) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;

    /// Current width in columns.
    fn columns(&self) -> u16;

    fn on_resize(&mut self, listener: ResizeListener) -> io::Result<ResizeSubscription>;

    /// Remove a listener. Unknown subscriptions are ignored.
    fn off_resize(&mut self, subscription: ResizeSubscription);
}

/// Registered resize listeners.
#[derive(Default)]
pub(crate) struct ListenerSet {
    next_id: u64,
    listeners: Vec<(u64, ResizeListener)>,
}

impl ListenerSet {
    pub fn add(&mut self, listener: ResizeListener) -> ResizeSubscription {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, listener));
        ResizeSubscription(id)
    }

    pub fn remove(&mut self, subscription: ResizeSubscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _)| *id != subscription.0);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Snapshot so listeners run without the lock held.
    pub fn snapshot(&self) -> Vec<ResizeListener> {
        self.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
    }
}

// =============================================================================
// BufferStream
// =============================================================================

#[derive(Default)]
struct BufferState {
    data: String,
    flushes: usize,
    columns: u16,
    listeners: ListenerSet,
}

/// In-memory output stream.
///
/// Clones share the same buffer, so one clone can be handed to an app while
/// another inspects what was written.
#[derive(Clone)]
pub struct BufferStream {
    state: Arc<Mutex<BufferState>>,
}

impl BufferStream {
    pub fn new(columns: u16) -> Self {
        Self {
            state: Arc::new(Mutex::new(BufferState {
                columns,
                ..BufferState::default()
            })),
        }
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        lock_or_recover(&self.state).data.clone()
    }

    /// Drain and return everything written so far.
    pub fn take(&self) -> String {
        std::mem::take(&mut lock_or_recover(&self.state).data)
    }

    pub fn flush_count(&self) -> usize {
        lock_or_recover(&self.state).flushes
    }

    pub fn listener_count(&self) -> usize {
        lock_or_recover(&self.state).listeners.len()
    }

    /// Change the width and notify resize listeners.
    pub fn resize(&self, columns: u16) {
        let listeners = {
            let mut state = lock_or_recover(&self.state);
            state.columns = columns;
            state.listeners.snapshot()
        };
        for listener in listeners {
            listener(columns);
        }
    }
}

impl Default for BufferStream {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMNS)
    }
}

impl OutputStream for BufferStream {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        lock_or_recover(&self.state).data.push_str(s);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        lock_or_recover(&self.state).flushes += 1;
        Ok(())
    }

    fn columns(&self) -> u16 {
        lock_or_recover(&self.state).columns
    }

    fn on_resize(&mut self, listener: ResizeListener) -> io::Result<ResizeSubscription> {
        Ok(lock_or_recover(&self.state).listeners.add(listener))
    }

    fn off_resize(&mut self, subscription: ResizeSubscription) {
        lock_or_recover(&self.state).listeners.remove(subscription);
    }
}
