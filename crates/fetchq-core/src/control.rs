//! Engine control for pause/stop.
//!
//! One `EngineControl` is shared (via `Arc`) by the queue processor, the
//! engine and every chunk worker of the item in flight. The flags live behind
//! a single mutex that is only held for the check/update itself; a condvar
//! wakes paused workers as soon as the state changes.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::EngineError;

/// Default re-check interval while paused.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The shared flags. `active == false` means stop was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineControlState {
    pub active: bool,
    pub paused: bool,
}

impl Default for EngineControlState {
    fn default() -> Self {
        Self {
            active: true,
            paused: false,
        }
    }
}

#[derive(Debug)]
pub struct EngineControl {
    state: Mutex<EngineControlState>,
    changed: Condvar,
    poll_interval: Duration,
}

impl Default for EngineControl {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineControl {
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            state: Mutex::new(EngineControlState::default()),
            changed: Condvar::new(),
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineControlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut EngineControlState)) -> EngineControlState {
        let snapshot = {
            let mut st = self.lock();
            f(&mut st);
            *st
        };
        self.changed.notify_all();
        snapshot
    }

    pub fn snapshot(&self) -> EngineControlState {
        *self.lock()
    }

    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    pub fn pause(&self) {
        self.update(|st| st.paused = true);
    }

    pub fn resume(&self) {
        self.update(|st| st.paused = false);
    }

    /// Flip the paused flag; returns the new value.
    pub fn toggle_pause(&self) -> bool {
        self.update(|st| st.paused = !st.paused).paused
    }

    /// Request stop. Sticky until `reset`.
    pub fn stop(&self) {
        self.update(|st| st.active = false);
    }

    /// Back to active/unpaused, for a fresh queue run.
    pub fn reset(&self) {
        self.update(|st| *st = EngineControlState::default());
    }

    /// Suspension point: blocks while paused, returns `Cancelled` once stopped.
    pub fn checkpoint(&self) -> Result<(), EngineError> {
        let mut st = self.lock();
        loop {
            if !st.active {
                return Err(EngineError::Cancelled);
            }
            if !st.paused {
                return Ok(());
            }
            let (guard, _) = self
                .changed
                .wait_timeout(st, self.poll_interval)
                .unwrap_or_else(PoisonError::into_inner);
            st = guard;
        }
    }

    /// Sleep for `duration` unless stop arrives first.
    pub fn sleep(&self, duration: Duration) -> Result<(), EngineError> {
        let deadline = Instant::now() + duration;
        let mut st = self.lock();
        loop {
            if !st.active {
                return Err(EngineError::Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            let (guard, _) = self
                .changed
                .wait_timeout(st, (deadline - now).min(self.poll_interval))
                .unwrap_or_else(PoisonError::into_inner);
            st = guard;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn starts_active_and_unpaused() {
        let c = EngineControl::new();
        assert_eq!(
            c.snapshot(),
            EngineControlState {
                active: true,
                paused: false
            }
        );
        assert!(c.checkpoint().is_ok());
    }

    #[test]
    fn toggle_pause_flips() {
        let c = EngineControl::new();
        assert!(c.toggle_pause());
        assert!(c.is_paused());
        assert!(!c.toggle_pause());
        assert!(!c.is_paused());
    }

    #[test]
    fn checkpoint_cancelled_after_stop() {
        let c = EngineControl::new();
        c.stop();
        assert!(matches!(c.checkpoint(), Err(EngineError::Cancelled)));
        c.reset();
        assert!(c.checkpoint().is_ok());
    }

    #[test]
    fn checkpoint_blocks_until_resume() {
        let c = Arc::new(EngineControl::with_poll_interval(Duration::from_millis(10)));
        c.pause();
        let worker = {
            let c = Arc::clone(&c);
            std::thread::spawn(move || {
                let start = Instant::now();
                c.checkpoint().map(|_| start.elapsed())
            })
        };
        std::thread::sleep(Duration::from_millis(150));
        assert!(!worker.is_finished(), "paused checkpoint must not return");
        c.resume();
        let waited = worker.join().unwrap().unwrap();
        assert!(waited >= Duration::from_millis(150));
    }

    #[test]
    fn stop_wakes_paused_checkpoint() {
        let c = Arc::new(EngineControl::new());
        c.pause();
        let worker = {
            let c = Arc::clone(&c);
            std::thread::spawn(move || c.checkpoint())
        };
        std::thread::sleep(Duration::from_millis(50));
        c.stop();
        assert!(matches!(worker.join().unwrap(), Err(EngineError::Cancelled)));
    }

    #[test]
    fn sleep_interrupted_by_stop() {
        let c = Arc::new(EngineControl::new());
        let sleeper = {
            let c = Arc::clone(&c);
            std::thread::spawn(move || {
                let start = Instant::now();
                (c.sleep(Duration::from_secs(30)), start.elapsed())
            })
        };
        std::thread::sleep(Duration::from_millis(50));
        c.stop();
        let (res, elapsed) = sleeper.join().unwrap();
        assert!(matches!(res, Err(EngineError::Cancelled)));
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn sleep_runs_full_duration_when_active() {
        let c = EngineControl::new();
        let start = Instant::now();
        c.sleep(Duration::from_millis(30)).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
