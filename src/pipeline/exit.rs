//! The exit-wait handle.
//!
//! A one-shot, shareable outcome: settled once by the termination handler,
//! observed by any number of waiters on any thread.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tracing::debug;

use crate::error::ExitError;

use super::lifecycle::{lock_or_recover, ExitSignal, Termination};

type Outcome = Result<(), ExitError>;

struct ExitState {
    outcome: Mutex<Option<Outcome>>,
    settled: Condvar,
}

/// Resolves when the app exits: `Ok(())` on an interrupt, `Err` on any
/// other abnormal termination.
#[derive(Clone)]
pub struct ExitHandle {
    state: Arc<ExitState>,
}

impl ExitHandle {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(ExitState {
                outcome: Mutex::new(None),
                settled: Condvar::new(),
            }),
        }
    }

    /// Record the outcome. The first settle wins; later ones are dropped.
    pub(crate) fn settle(&self, outcome: Outcome) -> bool {
        let mut slot = lock_or_recover(&self.state.outcome);
        if slot.is_some() {
            debug!(?outcome, "exit handle already settled");
            return false;
        }
        *slot = Some(outcome);
        self.state.settled.notify_all();
        true
    }

    /// Block until settled.
    pub fn wait(&self) -> Result<(), ExitError> {
        let mut slot = lock_or_recover(&self.state.outcome);
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            slot = match self.state.settled.wait(slot) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// Block until settled or `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<(), ExitError>> {
        let slot = lock_or_recover(&self.state.outcome);
        let (slot, _) = match self
            .state
            .settled
            .wait_timeout_while(slot, timeout, |outcome| outcome.is_none())
        {
            Ok(result) => result,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.clone()
    }

    /// The outcome, if already settled.
    pub fn try_outcome(&self) -> Option<Result<(), ExitError>> {
        lock_or_recover(&self.state.outcome).clone()
    }

    pub fn is_settled(&self) -> bool {
        lock_or_recover(&self.state.outcome).is_some()
    }

    /// Whether both handles share the same outcome.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.state, &b.state)
    }
}

impl std::fmt::Debug for ExitHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExitHandle")
            .field("outcome", &self.try_outcome())
            .finish()
    }
}

/// Outcome for an abnormal termination.
///
/// An interrupt resolves; every other abnormal termination rejects with
/// its code and signal.
pub(crate) fn outcome_for(termination: Termination) -> Outcome {
    match termination.signal {
        Some(ExitSignal::Interrupt) => Ok(()),
        _ => Err(ExitError {
            code: termination.code,
            signal: termination.signal,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_first_settle_wins() {
        let handle = ExitHandle::new();
        assert!(handle.try_outcome().is_none());

        assert!(handle.settle(Ok(())));
        assert!(!handle.settle(Err(ExitError { code: Some(1), signal: None })));
        assert_eq!(handle.wait(), Ok(()));
    }

    #[test]
    fn test_wait_across_threads() {
        let handle = ExitHandle::new();
        let waiter = {
            let handle = handle.clone();
            thread::spawn(move || handle.wait())
        };
        thread::sleep(Duration::from_millis(20));
        handle.settle(Err(ExitError { code: Some(2), signal: None }));

        let outcome = waiter.join().unwrap();
        assert_eq!(outcome, Err(ExitError { code: Some(2), signal: None }));
    }

    #[test]
    fn test_wait_timeout() {
        let handle = ExitHandle::new();
        assert_eq!(handle.wait_timeout(Duration::from_millis(10)), None);
        handle.settle(Ok(()));
        assert_eq!(handle.wait_timeout(Duration::from_millis(10)), Some(Ok(())));
    }

    #[test]
    fn test_clones_share_state() {
        let a = ExitHandle::new();
        let b = a.clone();
        assert!(ExitHandle::ptr_eq(&a, &b));
        assert!(!ExitHandle::ptr_eq(&a, &ExitHandle::new()));
    }

    #[test]
    fn test_outcome_for() {
        assert_eq!(outcome_for(Termination::signal(ExitSignal::Interrupt)), Ok(()));
        assert_eq!(
            outcome_for(Termination::code(1)),
            Err(ExitError { code: Some(1), signal: None })
        );
        assert_eq!(
            outcome_for(Termination::signal(ExitSignal::Terminate)),
            Err(ExitError { code: None, signal: Some(ExitSignal::Terminate) })
        );
    }
}
