//! Progress callbacks and the monotonic gate in front of them.

use std::sync::{Arc, Mutex, PoisonError};

/// Caller-supplied progress sink receiving whole percentages (0-100).
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Wrap a closure as a [`ProgressCallback`].
pub fn progress_fn(f: impl Fn(u8) + Send + Sync + 'static) -> ProgressCallback {
    Arc::new(f)
}

#[derive(Debug, Default)]
struct GateState {
    highest: u8,
    reported_any: bool,
    finished: bool,
}

/// Forwards progress to an optional callback without ever going backwards.
///
/// Nothing is forwarded after [`ProgressReporter::finish`].
#[derive(Default)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    state: Mutex<GateState>,
}

impl ProgressReporter {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            state: Mutex::new(GateState::default()),
        }
    }

    /// Forward `value`, replacing a regression with the highest value seen.
    ///
    /// Repeats are forwarded; use this for server-reported progress.
    pub fn report(&self, value: u8) {
        let emitted = {
            let mut state = self.lock();
            if state.finished {
                return;
            }
            state.highest = state.highest.max(value.min(100));
            state.reported_any = true;
            state.highest
        };
        self.emit(emitted);
    }

    /// Forward `value` only if it is strictly above everything forwarded so far.
    ///
    /// Use this for locally computed transfer progress.
    pub fn advance(&self, value: u8) {
        let value = value.min(100);
        {
            let mut state = self.lock();
            if state.finished || (state.reported_any && value <= state.highest) {
                return;
            }
            state.highest = value;
            state.reported_any = true;
        }
        self.emit(value);
    }

    /// Forward 100 (if not already forwarded) and close the gate.
    pub fn finish(&self) {
        self.advance(100);
        self.lock().finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    /// A callback that feeds this gate with `advance` semantics.
    pub fn as_callback(self: &Arc<Self>) -> ProgressCallback {
        let gate = Arc::clone(self);
        Arc::new(move |value| gate.advance(value))
    }

    fn emit(&self, value: u8) {
        if let Some(callback) = &self.callback {
            callback(value);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Integer percentage of `done` over `total`, floored.
pub fn percent_of(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) as u128 * 100) / total as u128) as u8
}


#[cfg(test)]
mod tests {
    use super::testing::recorder;
    use super::*;

    #[test]
    fn test_report_replaces_regressions() {
        let (callback, seen) = recorder();
        let reporter = ProgressReporter::new(Some(callback));
        for p in [10, 60, 40, 100] {
            reporter.report(p);
        }
        assert_eq!(*seen.lock().unwrap(), vec![10, 60, 60, 100]);
    }

    #[test]
    fn test_report_keeps_non_decreasing_sequence() {
        let (callback, seen) = recorder();
        let reporter = ProgressReporter::new(Some(callback));
        for p in [10, 25, 60, 60, 100] {
            reporter.report(p);
        }
        assert_eq!(*seen.lock().unwrap(), vec![10, 25, 60, 60, 100]);
    }

    #[test]
    fn test_advance_is_strictly_increasing() {
        let (callback, seen) = recorder();
        let reporter = ProgressReporter::new(Some(callback));
        for p in [0, 0, 5, 5, 3, 20, 250] {
            reporter.advance(p);
        }
        assert_eq!(*seen.lock().unwrap(), vec![0, 5, 20, 100]);
    }

    #[test]
    fn test_finish_emits_100_once_and_closes() {
        let (callback, seen) = recorder();
        let reporter = ProgressReporter::new(Some(callback));
        reporter.advance(99);
        reporter.finish();
        reporter.finish();
        reporter.report(100);
        assert_eq!(*seen.lock().unwrap(), vec![99, 100]);
        assert!(reporter.is_finished());
    }

    #[test]
    fn test_gate_callback_suppresses_restarts() {
        let (callback, seen) = recorder();
        let gate = Arc::new(ProgressReporter::new(Some(callback)));
        let forwarded = gate.as_callback();
        for p in [20, 40, 5, 10, 45, 100] {
            forwarded(p);
        }
        assert_eq!(*seen.lock().unwrap(), vec![20, 40, 45, 100]);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(0, 200), 0);
        assert_eq!(percent_of(199, 200), 99);
        assert_eq!(percent_of(200, 200), 100);
        assert_eq!(percent_of(5, 0), 100);
    }
}
