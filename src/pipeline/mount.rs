//! Mount API - application lifecycle and repaint.
//!
//! # Example
//!
//! ```ignore
//! use spark_tui_host::{App, AppOptions, MountContext, RendererHost, Tag, TermHost};
//!
//! let handle = App::new(AppOptions::new(), |host: &mut TermHost, ctx: &MountContext| {
//!     let label = host.create_element(Tag::Text);
//!     host.insert(label, ctx.root, None);
//!     host.set_element_text(label, "hello");
//! })
//! .mount();
//!
//! handle.flush();
//! let outcome = handle.wait_until_exit().wait();
//! ```

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::dom::NodeId;
use crate::error::ExitError;
use crate::host::TermHost;
use crate::renderer::{paint_frame, render_frame, LogUpdate};
use crate::terminal::{OutputStream, ResizeSubscription, SharedReader, SharedWriter, StdoutStream};

use super::exit::{outcome_for, ExitHandle};
use super::lifecycle::{
    lock_or_recover, ProcessLifecycle, SignalHookLifecycle, Termination, TerminationRegistration,
};
use super::scheduler::{Dirty, FrameScheduler};

/// Poll interval of [`App::run`] (~60fps).
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

// =============================================================================
// Reconciler
// =============================================================================

/// What the reconciler gets at mount time instead of ambient globals.
#[derive(Clone)]
pub struct MountContext {
    pub root: NodeId,
    pub columns: u16,
    pub stdin: SharedReader,
    pub stderr: SharedWriter,
}

/// The engine that drives the host.
///
/// Called with the app's state locked: use the `host` argument, not the
/// [`AppHandle`], from inside these methods.
pub trait Reconciler: Send {
    fn mount(&mut self, host: &mut TermHost, ctx: &MountContext);

    fn unmount(&mut self, _host: &mut TermHost) {}
}

impl<F> Reconciler for F
where
    F: FnMut(&mut TermHost, &MountContext) + Send,
{
    fn mount(&mut self, host: &mut TermHost, ctx: &MountContext) {
        self(host, ctx)
    }
}

// =============================================================================
// Options
// =============================================================================

/// Mount configuration. Every field falls back to the process environment.
pub struct AppOptions {
    output: Option<Box<dyn OutputStream>>,
    input: Option<SharedReader>,
    error: Option<SharedWriter>,
    wait_until_exit: bool,
    lifecycle: Option<Arc<dyn ProcessLifecycle>>,
}

impl AppOptions {
    pub fn new() -> Self {
        Self {
            output: None,
            input: None,
            error: None,
            wait_until_exit: true,
            lifecycle: None,
        }
    }

    /// Frame destination (default: stdout).
    pub fn output(mut self, output: impl OutputStream + 'static) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    /// Input stream handed to the tree (default: stdin).
    pub fn input(mut self, input: impl io::Read + Send + 'static) -> Self {
        self.input = Some(Arc::new(Mutex::new(input)));
        self
    }

    /// Error stream handed to the tree (default: stderr).
    pub fn error(mut self, error: impl io::Write + Send + 'static) -> Self {
        self.error = Some(Arc::new(Mutex::new(error)));
        self
    }

    /// Whether [`App::run`] blocks until the process terminates (default:
    /// true). When false it paints one frame and unmounts.
    pub fn wait_until_exit(mut self, wait: bool) -> Self {
        self.wait_until_exit = wait;
        self
    }

    /// Termination source (default: [`SignalHookLifecycle`]).
    pub fn lifecycle(mut self, lifecycle: Arc<dyn ProcessLifecycle>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Controller state
// =============================================================================

/// Width reported by the resize listener, consumed by the next flush.
///
/// Kept outside the controller lock so a listener thread never waits on it.
struct ResizeState {
    columns: AtomicU16,
    pending: AtomicBool,
}

impl ResizeState {
    fn record(&self, columns: u16) {
        self.columns.store(columns, Ordering::Release);
        self.pending.store(true, Ordering::Release);
    }

    fn take(&self) -> Option<u16> {
        self.pending
            .swap(false, Ordering::AcqRel)
            .then(|| self.columns.load(Ordering::Acquire))
    }
}

struct Controller {
    host: TermHost,
    log: LogUpdate,
    scheduler: FrameScheduler,
    reconciler: Box<dyn Reconciler>,
    root: NodeId,
    columns: u16,
    last_frame: String,
    laid_out: bool,
    resize: Option<ResizeSubscription>,
    registration: Option<TerminationRegistration>,
    exit: Option<ExitHandle>,
    mounted: bool,
}

impl Controller {
    /// Repaint if anything changed. Returns whether a frame was written.
    fn paint(&mut self, resize: &ResizeState) -> bool {
        if let Some(columns) = resize.take() {
            debug!(columns, "relayout for new width");
            self.columns = columns;
            self.scheduler.mark(Dirty::ALL);
        }
        let dirty = self.host.take_dirty();
        self.scheduler.mark(dirty);
        let pending = self.scheduler.take();
        if pending.is_empty() {
            return false;
        }

        let frame = if pending.contains(Dirty::LAYOUT) || !self.laid_out {
            render_frame(self.host.tree_mut(), self.root, self.columns)
        } else {
            paint_frame(self.host.tree(), self.root, self.columns)
        };
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                self.laid_out = false;
                warn!(%err, "layout failed; frame skipped");
                return false;
            }
        };
        self.laid_out = true;
        if let Err(err) = self.log.update(&frame) {
            warn!(%err, "failed to write frame");
        }
        self.last_frame = frame;
        true
    }

    fn exit_handle(&mut self) -> ExitHandle {
        self.exit.get_or_insert_with(ExitHandle::new).clone()
    }
}

struct Shared {
    controller: Mutex<Controller>,
    resize: Arc<ResizeState>,
    lifecycle: Arc<dyn ProcessLifecycle>,
}

// =============================================================================
// App
// =============================================================================

/// An unmounted application: options plus the reconciler that fills the
/// tree.
pub struct App {
    options: AppOptions,
    reconciler: Box<dyn Reconciler>,
}

impl App {
    pub fn new(options: AppOptions, reconciler: impl Reconciler + 'static) -> Self {
        Self {
            options,
            reconciler: Box::new(reconciler),
        }
    }

    /// Mount the application.
    ///
    /// Hides the cursor, subscribes to resizes, creates the root element,
    /// registers the termination handler and lets the reconciler build the
    /// tree. Nothing is painted until the first [`AppHandle::flush`]. I/O
    /// failures are logged, not returned.
    pub fn mount(self) -> AppHandle {
        let App { options, mut reconciler } = self;

        let output = options.output.unwrap_or_else(default_output);
        let columns = output.columns();
        let resize = Arc::new(ResizeState {
            columns: AtomicU16::new(columns),
            pending: AtomicBool::new(false),
        });

        let mut log = LogUpdate::new(output);
        if let Err(err) = log.hide_cursor() {
            warn!(%err, "failed to hide cursor");
        }
        if let Err(err) = log.clear() {
            warn!(%err, "failed to clear previous output");
        }

        let subscription = {
            let resize = Arc::clone(&resize);
            match log.output_mut().on_resize(Arc::new(move |columns| resize.record(columns))) {
                Ok(subscription) => Some(subscription),
                Err(err) => {
                    warn!(%err, "resize notifications unavailable");
                    None
                }
            }
        };

        let mut host = TermHost::new();
        let root = host.tree_mut().create_root();
        let ctx = MountContext {
            root,
            columns,
            stdin: options.input.unwrap_or_else(default_input),
            stderr: options.error.unwrap_or_else(default_error),
        };
        let lifecycle = options.lifecycle.unwrap_or_else(default_lifecycle);

        let handle = AppHandle {
            shared: Arc::new(Shared {
                controller: Mutex::new(Controller {
                    host,
                    log,
                    scheduler: FrameScheduler::new(),
                    reconciler: Box::new(NoopReconciler),
                    root,
                    columns,
                    last_frame: String::new(),
                    laid_out: false,
                    resize: subscription,
                    registration: None,
                    exit: None,
                    mounted: true,
                }),
                resize,
                lifecycle,
            }),
        };

        let weak: Weak<Shared> = Arc::downgrade(&handle.shared);
        let registration = handle
            .shared
            .lifecycle
            .register_termination_handler(Box::new(move |termination| {
                if let Some(shared) = weak.upgrade() {
                    AppHandle { shared }.terminate(termination);
                }
            }));

        {
            let mut controller = lock_or_recover(&handle.shared.controller);
            match registration {
                Ok(registration) => controller.registration = Some(registration),
                Err(err) => warn!(%err, "termination handler not registered"),
            }

            reconciler.mount(&mut controller.host, &ctx);
            controller.reconciler = reconciler;
            let dirty = controller.host.take_dirty();
            controller.scheduler.mark(dirty);
        }

        info!(columns, "app mounted");
        handle
    }

    /// Mount, paint, and either block until the process terminates or
    /// unmount right away, depending on [`AppOptions::wait_until_exit`].
    pub fn run(self) -> Result<(), ExitError> {
        let wait = self.options.wait_until_exit;
        let handle = self.mount();
        handle.flush();

        if !wait {
            handle.unmount();
            return Ok(());
        }

        let exit = handle.wait_until_exit();
        loop {
            if let Some(outcome) = exit.wait_timeout(FRAME_INTERVAL) {
                return outcome;
            }
            handle.flush();
        }
    }
}

fn default_output() -> Box<dyn OutputStream> {
    Box::new(StdoutStream::new())
}

fn default_input() -> SharedReader {
    Arc::new(Mutex::new(io::stdin()))
}

fn default_error() -> SharedWriter {
    Arc::new(Mutex::new(io::stderr()))
}

fn default_lifecycle() -> Arc<dyn ProcessLifecycle> {
    Arc::new(SignalHookLifecycle::new())
}

/// Placeholder while the real reconciler runs its mount outside the slot.
struct NoopReconciler;

impl Reconciler for NoopReconciler {
    fn mount(&mut self, _host: &mut TermHost, _ctx: &MountContext) {}
}

// =============================================================================
// AppHandle
// =============================================================================

/// Handle to a mounted application. Cheap to clone and usable from any
/// thread.
#[derive(Clone)]
pub struct AppHandle {
    shared: Arc<Shared>,
}

impl AppHandle {
    /// Tear down: stop resize notifications, release the termination
    /// handler, restore the cursor, let the reconciler unmount, destroy the
    /// tree. Safe to call any number of times.
    pub fn unmount(&self) {
        let registration = {
            let mut controller = lock_or_recover(&self.shared.controller);
            if !controller.mounted {
                debug!("unmount of an unmounted app ignored");
                return;
            }
            controller.mounted = false;
            controller.paint(&self.shared.resize);

            let Controller {
                host,
                log,
                reconciler,
                root,
                resize,
                registration,
                ..
            } = &mut *controller;

            if let Some(subscription) = resize.take() {
                log.output_mut().off_resize(subscription);
            }
            if let Err(err) = log.done() {
                warn!(%err, "failed to restore terminal");
            }
            reconciler.unmount(host);
            host.tree_mut().remove(*root);
            host.take_dirty();
            registration.take()
        };

        // Outside the lock: a signal listener may be waiting for it.
        if let Some(registration) = registration {
            self.shared.lifecycle.deregister(registration);
        }
        info!("app unmounted");
    }

    /// The exit-wait handle. Every call returns the same handle.
    pub fn wait_until_exit(&self) -> ExitHandle {
        lock_or_recover(&self.shared.controller).exit_handle()
    }

    /// Mutate the tree. Changes are painted by the next [`flush`](Self::flush).
    pub fn update<R>(&self, f: impl FnOnce(&mut TermHost) -> R) -> R {
        let mut controller = lock_or_recover(&self.shared.controller);
        let result = f(&mut controller.host);
        let dirty = controller.host.take_dirty();
        controller.scheduler.mark(dirty);
        result
    }

    /// Paint pending changes. Returns whether a frame was written.
    pub fn flush(&self) -> bool {
        let mut controller = lock_or_recover(&self.shared.controller);
        if !controller.mounted {
            return false;
        }
        controller.paint(&self.shared.resize)
    }

    /// The last painted frame.
    pub fn frame(&self) -> String {
        lock_or_recover(&self.shared.controller).last_frame.clone()
    }

    /// Lines the last painted frame occupies on screen.
    pub fn previous_line_count(&self) -> usize {
        lock_or_recover(&self.shared.controller).log.previous_line_count()
    }

    pub fn root(&self) -> NodeId {
        lock_or_recover(&self.shared.controller).root
    }

    pub fn columns(&self) -> u16 {
        lock_or_recover(&self.shared.controller).columns
    }

    pub fn is_mounted(&self) -> bool {
        lock_or_recover(&self.shared.controller).mounted
    }

    /// Termination handler body.
    fn terminate(&self, termination: Termination) {
        if !termination.is_abnormal() {
            debug!(?termination, "normal exit");
            return;
        }
        info!(?termination, "abnormal termination; unmounting");

        let exit = {
            let mut controller = lock_or_recover(&self.shared.controller);
            if let Err(err) = controller.log.show_cursor() {
                warn!(%err, "failed to show cursor");
            }
            controller.exit_handle()
        };
        self.unmount();
        exit.settle(outcome_for(termination));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RendererHost;
    use crate::pipeline::lifecycle::{ExitSignal, ManualLifecycle};
    use crate::terminal::BufferStream;
    use crate::types::Tag;

    fn mount_with(
        reconciler: impl Reconciler + 'static,
    ) -> (AppHandle, BufferStream, ManualLifecycle) {
        let stream = BufferStream::new(40);
        let lifecycle = ManualLifecycle::new();
        let handle = App::new(
            AppOptions::new()
                .output(stream.clone())
                .input(io::empty())
                .error(io::sink())
                .lifecycle(Arc::new(lifecycle.clone())),
            reconciler,
        )
        .mount();
        (handle, stream, lifecycle)
    }

    fn hello(host: &mut TermHost, ctx: &MountContext) {
        let label = host.create_element(Tag::Text);
        host.insert(label, ctx.root, None);
        host.set_element_text(label, "hello");
    }

    #[test]
    fn test_mount_hides_cursor_and_registers() {
        let (handle, stream, lifecycle) = mount_with(hello);

        assert_eq!(stream.contents(), "\x1b[?25l");
        assert!(lifecycle.has_handler());
        assert_eq!(stream.listener_count(), 1);
        assert!(handle.is_mounted());
        assert_eq!(handle.columns(), 40);
    }

    #[test]
    fn test_flush_paints_once_per_batch() {
        let (handle, stream, _lifecycle) = mount_with(hello);
        stream.take();

        assert!(handle.flush());
        assert!(!handle.flush());
        assert_eq!(stream.take(), "hello\n");
        assert_eq!(handle.frame(), "hello");

        let root = handle.root();
        handle.update(|host| {
            let label = host.tree().children(root)[0];
            host.set_element_text(label, "bye");
        });
        assert!(handle.flush());
        assert_eq!(stream.take(), "\x1b[1A\x1b[G\x1b[Jbye\n");
    }

    #[test]
    fn test_unmount_is_idempotent() {
        let (handle, stream, lifecycle) = mount_with(hello);
        handle.flush();

        handle.unmount();
        handle.unmount();

        assert!(!handle.is_mounted());
        assert!(!lifecycle.has_handler());
        assert_eq!(stream.listener_count(), 0);
        assert!(stream.contents().ends_with("\x1b[?25h"));
        assert_eq!(stream.contents().matches("\x1b[?25h").count(), 1);
        assert!(!handle.flush());
    }

    #[test]
    fn test_unmount_paints_pending_frame() {
        let (handle, stream, _lifecycle) = mount_with(hello);
        handle.unmount();
        assert!(stream.contents().contains("hello\n"));
    }

    #[test]
    fn test_wait_until_exit_is_memoized() {
        let (handle, _stream, _lifecycle) = mount_with(hello);
        let a = handle.wait_until_exit();
        let b = handle.wait_until_exit();
        assert!(ExitHandle::ptr_eq(&a, &b));
        assert!(a.try_outcome().is_none());
    }

    #[test]
    fn test_interrupt_resolves() {
        let (handle, stream, lifecycle) = mount_with(hello);
        let exit = handle.wait_until_exit();

        lifecycle.terminate(Termination::signal(ExitSignal::Interrupt));

        assert_eq!(exit.wait(), Ok(()));
        assert!(!handle.is_mounted());
        assert!(!lifecycle.has_handler());
        assert_eq!(stream.contents().matches("\x1b[?25h").count(), 1);
    }

    #[test]
    fn test_exit_code_rejects() {
        let (handle, _stream, lifecycle) = mount_with(hello);
        let exit = handle.wait_until_exit();

        lifecycle.terminate(Termination::code(1));

        assert_eq!(exit.wait(), Err(ExitError { code: Some(1), signal: None }));
    }

    #[test]
    fn test_clean_exit_leaves_handle_pending() {
        let (handle, _stream, lifecycle) = mount_with(hello);
        let exit = handle.wait_until_exit();

        assert!(!lifecycle.terminate(Termination::code(0)));

        assert!(exit.try_outcome().is_none());
        assert!(handle.is_mounted());
        assert!(lifecycle.has_handler());

        lifecycle.terminate(Termination::signal(ExitSignal::Interrupt));
        assert_eq!(exit.try_outcome(), Some(Ok(())));
        assert!(!handle.is_mounted());
    }

    #[test]
    fn test_termination_before_wait_is_observed() {
        let (handle, _stream, lifecycle) = mount_with(hello);

        lifecycle.terminate(Termination::signal(ExitSignal::Terminate));

        let exit = handle.wait_until_exit();
        assert_eq!(
            exit.try_outcome(),
            Some(Err(ExitError { code: None, signal: Some(ExitSignal::Terminate) }))
        );
    }

    #[test]
    fn test_line_transform_repaints() {
        let (handle, stream, _lifecycle) = mount_with(|host: &mut TermHost, ctx: &MountContext| {
            let label = host.create_element(Tag::Text);
            host.insert(label, ctx.root, None);
            host.set_element_text(label, "ab");
        });
        handle.flush();
        stream.take();
        let root = handle.root();

        handle.update(|host| {
            let label = host.tree().children(root)[0];
            let marker = crate::dom::Transform::new(|line, _| format!("*{line}"));
            host.patch_prop(label, "transform", None, Some(&marker.into()));
        });

        assert!(handle.flush());
        assert_eq!(handle.frame(), "*ab");
        assert_eq!(stream.take(), "\x1b[1A\x1b[G\x1b[J*ab\n");
    }

    #[test]
    fn test_resize_relayouts() {
        let (handle, stream, _lifecycle) = mount_with(|host: &mut TermHost, ctx: &MountContext| {
            let label = host.create_element(Tag::Text);
            host.insert(label, ctx.root, None);
            host.set_element_text(label, "abcdefgh");
        });
        handle.flush();
        assert_eq!(handle.frame(), "abcdefgh");

        stream.resize(4);
        assert!(handle.flush());
        assert_eq!(handle.columns(), 4);
        assert_eq!(handle.frame(), "abcd\nefgh");
        assert_eq!(handle.previous_line_count(), 2);
    }

    #[test]
    fn test_run_without_waiting() {
        let stream = BufferStream::new(20);
        let lifecycle = ManualLifecycle::new();
        let outcome = App::new(
            AppOptions::new()
                .output(stream.clone())
                .lifecycle(Arc::new(lifecycle.clone()))
                .wait_until_exit(false),
            hello,
        )
        .run();

        assert_eq!(outcome, Ok(()));
        assert!(stream.contents().contains("hello\n"));
        assert!(!lifecycle.has_handler());
    }

    #[test]
    fn test_reconciler_receives_context() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let (handle, _stream, _lifecycle) = mount_with(move |_host: &mut TermHost, ctx: &MountContext| {
            *sink.lock().unwrap() = Some((ctx.root, ctx.columns));
        });

        assert_eq!(*seen.lock().unwrap(), Some((handle.root(), 40)));
    }
}
