//! Process termination notifications.
//!
//! A [`ProcessLifecycle`] owns a single handler slot. The mounted app fills
//! it at mount time and empties it at unmount. The handler runs at most
//! once: it is taken out of the slot before it is invoked, so a handler that
//! deregisters (or unmounts) from inside itself never deadlocks.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

#[cfg(not(windows))]
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
#[cfg(windows)]
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use tracing::{debug, info, warn};

/// Lock a mutex, recovering the guard if a previous holder panicked.
pub(crate) fn lock_or_recover<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// =============================================================================
// Termination
// =============================================================================

/// Signal that ended (or is ending) the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitSignal {
    Interrupt,
    Terminate,
    Hangup,
    Quit,
    Other(i32),
}

impl ExitSignal {
    pub fn from_raw(signal: i32) -> Self {
        match signal {
            SIGINT => Self::Interrupt,
            SIGTERM => Self::Terminate,
            #[cfg(not(windows))]
            SIGHUP => Self::Hangup,
            #[cfg(not(windows))]
            SIGQUIT => Self::Quit,
            other => Self::Other(other),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::Hangup => "SIGHUP",
            Self::Quit => "SIGQUIT",
            Self::Other(_) => "signal",
        }
    }

    /// Raw signal number.
    pub fn number(self) -> i32 {
        match self {
            Self::Interrupt => SIGINT,
            Self::Terminate => SIGTERM,
            #[cfg(not(windows))]
            Self::Hangup => SIGHUP,
            #[cfg(not(windows))]
            Self::Quit => SIGQUIT,
            #[cfg(windows)]
            Self::Hangup => 1,
            #[cfg(windows)]
            Self::Quit => 3,
            Self::Other(signal) => signal,
        }
    }
}

impl fmt::Display for ExitSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(signal) => write!(f, "signal {signal}"),
            named => f.write_str(named.name()),
        }
    }
}

/// How the process is terminating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Termination {
    pub code: Option<i32>,
    pub signal: Option<ExitSignal>,
}

impl Termination {
    pub const fn code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    pub const fn signal(signal: ExitSignal) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    /// Nonzero exit code or any signal.
    pub fn is_abnormal(&self) -> bool {
        self.signal.is_some() || self.code.is_some_and(|c| c != 0)
    }
}

pub type TerminationHandler = Box<dyn FnOnce(Termination) + Send>;

/// Token for a registered handler.
#[derive(Debug, PartialEq, Eq)]
pub struct TerminationRegistration(u64);

/// Source of process termination notifications.
pub trait ProcessLifecycle: Send + Sync {
    /// Fill the handler slot.
    ///
    /// Fails with [`io::ErrorKind::AlreadyExists`] while another handler is
    /// registered.
    fn register_termination_handler(&self, handler: TerminationHandler) -> io::Result<TerminationRegistration>;

    /// Empty the slot if it still holds `registration`'s handler.
    fn deregister(&self, registration: TerminationRegistration);
}

// =============================================================================
// Handler slot
// =============================================================================

#[derive(Default)]
struct SlotState {
    next_id: u64,
    current: Option<(u64, TerminationHandler)>,
}

/// The single handler slot shared by every lifecycle implementation.
#[derive(Clone, Default)]
struct HandlerSlot {
    state: Arc<Mutex<SlotState>>,
}

impl HandlerSlot {
    fn fill(&self, handler: TerminationHandler) -> io::Result<TerminationRegistration> {
        let mut state = lock_or_recover(&self.state);
        if state.current.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "a termination handler is already registered",
            ));
        }
        let id = state.next_id;
        state.next_id += 1;
        state.current = Some((id, handler));
        Ok(TerminationRegistration(id))
    }

    /// Returns `true` when the slot held `registration`'s handler.
    fn empty(&self, registration: &TerminationRegistration) -> bool {
        let mut state = lock_or_recover(&self.state);
        match &state.current {
            Some((id, _)) if *id == registration.0 => {
                state.current = None;
                true
            }
            _ => false,
        }
    }

    fn is_filled(&self) -> bool {
        lock_or_recover(&self.state).current.is_some()
    }

    /// Take the handler out and run it. Returns whether one ran.
    ///
    /// A normal exit leaves the handler in place so a later signal still
    /// reaches it.
    fn fire(&self, termination: Termination) -> bool {
        if !termination.is_abnormal() {
            debug!(?termination, "normal exit; handler kept");
            return false;
        }
        let handler = lock_or_recover(&self.state).current.take();
        match handler {
            Some((_, handler)) => {
                handler(termination);
                true
            }
            None => {
                debug!(?termination, "termination with no handler registered");
                false
            }
        }
    }
}

// =============================================================================
// ManualLifecycle
// =============================================================================

/// Lifecycle fired on demand by its owner.
///
/// Clones share the slot: hand one clone to the app and keep another to
/// report termination.
#[derive(Clone, Default)]
pub struct ManualLifecycle {
    slot: HandlerSlot,
}

impl ManualLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `termination` to the registered handler, if any.
    pub fn terminate(&self, termination: Termination) -> bool {
        self.slot.fire(termination)
    }

    pub fn has_handler(&self) -> bool {
        self.slot.is_filled()
    }
}

impl ProcessLifecycle for ManualLifecycle {
    fn register_termination_handler(&self, handler: TerminationHandler) -> io::Result<TerminationRegistration> {
        self.slot.fill(handler)
    }

    fn deregister(&self, registration: TerminationRegistration) {
        self.slot.empty(&registration);
    }
}

// =============================================================================
// SignalHookLifecycle
// =============================================================================

/// Reports an explicit exit code to a [`SignalHookLifecycle`].
#[derive(Clone)]
pub struct ExitNotifier {
    slot: HandlerSlot,
}

impl ExitNotifier {
    /// The process is about to exit with `code`.
    pub fn exit(&self, code: i32) -> bool {
        self.slot.fire(Termination::code(code))
    }
}

#[cfg(not(windows))]
const TERMINATION_SIGNALS: [i32; 4] = [SIGINT, SIGTERM, SIGHUP, SIGQUIT];

#[cfg(not(windows))]
struct SignalListener {
    handle: signal_hook::iterator::Handle,
    thread: thread::JoinHandle<()>,
}

/// Process-wide fallback to the default signal actions.
///
/// signal-hook never uninstalls its low-level handler, so closing a listener
/// alone would leave the termination signals caught and ignored. A
/// conditional default action is registered once per signal and armed
/// whenever no listener is running.
#[cfg(not(windows))]
struct DefaultActions {
    armed: Arc<AtomicBool>,
    listeners: usize,
}

#[cfg(not(windows))]
static DEFAULT_ACTIONS: Mutex<Option<DefaultActions>> = Mutex::new(None);

/// Disarm the default actions while a listener runs.
#[cfg(not(windows))]
fn acquire_default_actions() -> io::Result<()> {
    let mut actions = lock_or_recover(&DEFAULT_ACTIONS);
    if actions.is_none() {
        let armed = Arc::new(AtomicBool::new(true));
        for signal in TERMINATION_SIGNALS {
            signal_hook::flag::register_conditional_default(signal, Arc::clone(&armed))?;
        }
        *actions = Some(DefaultActions { armed, listeners: 0 });
    }
    if let Some(actions) = actions.as_mut() {
        actions.listeners += 1;
        actions.armed.store(false, Ordering::SeqCst);
    }
    Ok(())
}

/// Re-arm the default actions once the last listener stops.
#[cfg(not(windows))]
fn release_default_actions() {
    let mut actions = lock_or_recover(&DEFAULT_ACTIONS);
    if let Some(actions) = actions.as_mut() {
        actions.listeners = actions.listeners.saturating_sub(1);
        if actions.listeners == 0 {
            actions.armed.store(true, Ordering::SeqCst);
        }
    }
}

/// Lifecycle driven by process signals.
///
/// While a handler is registered a listener thread waits for `SIGINT`,
/// `SIGTERM`, `SIGHUP` and `SIGQUIT`, and those signals no longer terminate
/// the process on their own. Once the listener stops their default action
/// applies again.
pub struct SignalHookLifecycle {
    slot: HandlerSlot,
    active: AtomicBool,
    #[cfg(not(windows))]
    listener: Mutex<Option<SignalListener>>,
}

impl SignalHookLifecycle {
    pub fn new() -> Self {
        Self {
            slot: HandlerSlot::default(),
            active: AtomicBool::new(false),
            #[cfg(not(windows))]
            listener: Mutex::new(None),
        }
    }

    pub fn exit_notifier(&self) -> ExitNotifier {
        ExitNotifier {
            slot: self.slot.clone(),
        }
    }

    #[cfg(not(windows))]
    fn start_listener(&self) -> io::Result<()> {
        let mut signals = signal_hook::iterator::Signals::new(TERMINATION_SIGNALS)?;
        let handle = signals.handle();
        if let Err(err) = acquire_default_actions() {
            handle.close();
            return Err(err);
        }
        let slot = self.slot.clone();
        let thread = thread::Builder::new()
            .name("tui-host-signals".to_owned())
            .spawn(move || {
                for signal in signals.forever() {
                    let signal = ExitSignal::from_raw(signal);
                    info!(%signal, "termination signal received");
                    slot.fire(Termination::signal(signal));
                }
            });
        let thread = match thread {
            Ok(thread) => thread,
            Err(err) => {
                handle.close();
                release_default_actions();
                return Err(err);
            }
        };
        *lock_or_recover(&self.listener) = Some(SignalListener { handle, thread });
        Ok(())
    }

    #[cfg(windows)]
    fn start_listener(&self) -> io::Result<()> {
        warn!("signal listener is not supported on windows; use the exit notifier");
        Ok(())
    }

    #[cfg(not(windows))]
    fn stop_listener(&self) {
        let Some(listener) = lock_or_recover(&self.listener).take() else {
            return;
        };
        listener.handle.close();
        release_default_actions();
        // Deregistering from the handler itself runs on the listener thread.
        if listener.thread.thread().id() == thread::current().id() {
            return;
        }
        if let Err(error) = listener.thread.join() {
            warn!(?error, "signal listener thread panicked while stopping");
        }
    }

    #[cfg(windows)]
    fn stop_listener(&self) {}
}

impl Default for SignalHookLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLifecycle for SignalHookLifecycle {
    fn register_termination_handler(&self, handler: TerminationHandler) -> io::Result<TerminationRegistration> {
        let registration = self.slot.fill(handler)?;
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            if let Err(err) = self.start_listener() {
                self.active.store(false, Ordering::Release);
                self.slot.empty(&registration);
                return Err(err);
            }
        }
        Ok(registration)
    }

    fn deregister(&self, registration: TerminationRegistration) {
        self.slot.empty(&registration);
        if self
            .active
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.stop_listener();
        }
    }
}

impl Drop for SignalHookLifecycle {
    fn drop(&mut self) {
        self.stop_listener();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_abnormal_classification() {
        assert!(Termination::signal(ExitSignal::Interrupt).is_abnormal());
        assert!(Termination::code(1).is_abnormal());
        assert!(!Termination::code(0).is_abnormal());
        assert!(!Termination { code: None, signal: None }.is_abnormal());
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(ExitSignal::from_raw(SIGINT), ExitSignal::Interrupt);
        assert_eq!(ExitSignal::from_raw(SIGTERM).name(), "SIGTERM");
        assert_eq!(ExitSignal::from_raw(1000), ExitSignal::Other(1000));
        assert_eq!(ExitSignal::Other(40).to_string(), "signal 40");
        assert_eq!(ExitSignal::Hangup.to_string(), "SIGHUP");
        assert_eq!(ExitSignal::from_raw(ExitSignal::Quit.number()), ExitSignal::Quit);
    }

    #[test]
    fn test_normal_exit_keeps_handler() {
        let lifecycle = ManualLifecycle::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        lifecycle
            .register_termination_handler(Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        assert!(!lifecycle.terminate(Termination::code(0)));
        assert!(lifecycle.has_handler());
        assert!(lifecycle.terminate(Termination::signal(ExitSignal::Interrupt)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_runs_once() {
        let lifecycle = ManualLifecycle::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        lifecycle
            .register_termination_handler(Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        assert!(lifecycle.terminate(Termination::code(1)));
        assert!(!lifecycle.terminate(Termination::code(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_single_slot() {
        let lifecycle = ManualLifecycle::new();
        let first = lifecycle.register_termination_handler(Box::new(|_| {})).unwrap();
        let err = lifecycle.register_termination_handler(Box::new(|_| {})).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        lifecycle.deregister(first);
        assert!(!lifecycle.has_handler());
        lifecycle.register_termination_handler(Box::new(|_| {})).unwrap();
    }

    #[test]
    fn test_stale_registration_does_not_empty_slot() {
        let lifecycle = ManualLifecycle::new();
        let first = lifecycle.register_termination_handler(Box::new(|_| {})).unwrap();
        lifecycle.terminate(Termination::code(2));
        lifecycle.register_termination_handler(Box::new(|_| {})).unwrap();

        lifecycle.deregister(first);
        assert!(lifecycle.has_handler());
    }

    #[test]
    fn test_handler_can_deregister_itself() {
        let lifecycle = Arc::new(ManualLifecycle::new());
        let inner = Arc::clone(&lifecycle);
        let registration: Arc<Mutex<Option<TerminationRegistration>>> = Arc::default();
        let held = Arc::clone(&registration);
        *registration.lock().unwrap() = Some(
            lifecycle
                .register_termination_handler(Box::new(move |_| {
                    if let Some(r) = held.lock().unwrap().take() {
                        inner.deregister(r);
                    }
                }))
                .unwrap(),
        );

        assert!(lifecycle.terminate(Termination::signal(ExitSignal::Terminate)));
        assert!(!lifecycle.has_handler());
    }

    #[test]
    fn test_signal_lifecycle_exit_notifier() {
        let lifecycle = SignalHookLifecycle::new();
        let notifier = lifecycle.exit_notifier();
        let seen: Arc<Mutex<Option<Termination>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let registration = lifecycle
            .register_termination_handler(Box::new(move |t| {
                *sink.lock().unwrap() = Some(t);
            }))
            .unwrap();

        assert!(notifier.exit(3));
        assert_eq!(*seen.lock().unwrap(), Some(Termination::code(3)));
        lifecycle.deregister(registration);
        assert!(!notifier.exit(4));
    }
}
