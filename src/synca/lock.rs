//! A tri-state `Condvar`+`Mutex` wake signal, used by the runners to
//! park their worker thread without busy-polling and by producers to
//! wake it back up.
//!
//! Grounded on `foundation_core::synca::event::LockSignal`: a
//! `Free`/`Locked`/`Released` state machine around a `Condvar`, rather
//! than a bare `Condvar` tied to the caller's own data mutex. Arming it
//! with [`LockSignal::try_lock`] before releasing whatever lock
//! protects the "is there work" check is what keeps a producer's
//! [`LockSignal::signal_all`] from being lost if it lands between that
//! check and the call to [`LockSignal::wait`]: the state flips to
//! `Released` and `wait`/`wait_timeout` see it immediately instead of
//! parking on a signal that already happened.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockState {
    Free,
    Locked,
    Released,
}

enum NotifyDirective {
    One,
    All,
}

pub struct LockSignal {
    event: Condvar,
    lock: Mutex<LockState>,
}

impl Default for LockSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl LockSignal {
    pub fn new() -> Self {
        Self {
            event: Condvar::new(),
            lock: Mutex::new(LockState::Free),
        }
    }

    pub fn probe(&self) -> LockState {
        *self.lock.lock().expect("lock signal mutex poisoned")
    }

    pub fn probe_locked(&self) -> bool {
        self.probe() == LockState::Locked
    }

    /// Declares intent to wait: `Free`/`Released` -> `Locked`. Returns
    /// `false` (no-op) if already `Locked`.
    pub fn try_lock(&self) -> bool {
        let mut state = self.lock.lock().expect("lock signal mutex poisoned");
        if *state == LockState::Locked {
            return false;
        }
        *state = LockState::Locked;
        true
    }

    fn signal(&self, directive: NotifyDirective) {
        let mut state = self.lock.lock().expect("lock signal mutex poisoned");
        *state = LockState::Released;
        drop(state);
        match directive {
            NotifyDirective::One => self.event.notify_one(),
            NotifyDirective::All => self.event.notify_all(),
        }
    }

    pub fn signal_one(&self) {
        self.signal(NotifyDirective::One);
    }

    pub fn signal_all(&self) {
        self.signal(NotifyDirective::All);
    }

    /// Blocks until the state is `Released` (resetting it to `Free` on
    /// return); a no-op if the state is already `Free` — mirrors the
    /// original's "no wait required" fast path.
    pub fn wait(&self) {
        let mut state = self.lock.lock().expect("lock signal mutex poisoned");
        if *state == LockState::Free {
            return;
        }
        loop {
            if *state == LockState::Released {
                *state = LockState::Free;
                return;
            }
            state = self.event.wait(state).expect("lock signal mutex poisoned");
        }
    }

    /// As [`LockSignal::wait`], but gives up once `timeout` elapses
    /// without a `Released` signal, leaving the state as `Locked` so a
    /// later signal is still observed. Returns `true` iff it returned
    /// because of a signal rather than the timeout. The original has
    /// no timed variant since its executors always park indefinitely;
    /// the runners use this one to back off in bounded steps via
    /// [`crate::synca::idleman::Idleman`] before parking indefinitely.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut state = self.lock.lock().expect("lock signal mutex poisoned");
        if *state == LockState::Free {
            return true;
        }

        let deadline = Instant::now() + timeout;
        loop {
            if *state == LockState::Released {
                *state = LockState::Free;
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            let (guard, timed_out) = self
                .event
                .wait_timeout(state, deadline - now)
                .expect("lock signal mutex poisoned");
            state = guard;

            if *state == LockState::Released {
                *state = LockState::Free;
                return true;
            }
            if timed_out.timed_out() {
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn wait_returns_immediately_when_never_armed() {
        let signal = LockSignal::new();
        signal.wait();
    }

    #[test]
    fn signal_after_try_lock_wakes_the_waiter() {
        let signal = Arc::new(LockSignal::new());
        assert!(signal.try_lock());

        let waiter = {
            let signal = signal.clone();
            thread::spawn(move || signal.wait())
        };

        thread::sleep(Duration::from_millis(50));
        signal.signal_all();
        waiter.join().expect("waiter thread should not panic");
        assert_eq!(signal.probe(), LockState::Free);
    }

    #[test]
    fn signal_landing_before_wait_is_not_lost() {
        let signal = LockSignal::new();
        assert!(signal.try_lock());
        signal.signal_all();
        // The signal already landed; wait must return immediately
        // rather than blocking for a wakeup that already happened.
        signal.wait();
        assert_eq!(signal.probe(), LockState::Free);
    }

    #[test]
    fn wait_timeout_reports_timeout_when_unsignalled() {
        let signal = LockSignal::new();
        assert!(signal.try_lock());
        assert!(!signal.wait_timeout(Duration::from_millis(20)));
        assert_eq!(signal.probe(), LockState::Locked);
    }

    #[test]
    fn wait_timeout_reports_success_when_signalled_in_time() {
        let signal = Arc::new(LockSignal::new());
        assert!(signal.try_lock());

        let waiter = {
            let signal = signal.clone();
            thread::spawn(move || signal.wait_timeout(Duration::from_secs(2)))
        };

        thread::sleep(Duration::from_millis(20));
        signal.signal_all();
        assert!(waiter.join().expect("waiter thread should not panic"));
    }
}
