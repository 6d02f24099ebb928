use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Cooperative stop flag shared between a scheduler and its controllers.
///
/// Cloning is cheap; every clone observes the same flag. A pending
/// [`StopHandle::wait_timeout`] returns as soon as `stop` is called.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        let (lock, signal) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        *stopped = true;
        signal.notify_all();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn reset(&self) {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }

    /// Blocks for up to `duration`. Returns `true` when stopped.
    #[must_use]
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, signal) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = signal
            .wait_timeout_while(guard, duration, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

/// Source of inter-frame waits.
pub trait FrameClock {
    fn wait(&mut self, duration: Duration, stop: &StopHandle) -> WaitOutcome;
}

/// Wall-clock waits that wake early on stop.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadClock;

impl FrameClock for ThreadClock {
    fn wait(&mut self, duration: Duration, stop: &StopHandle) -> WaitOutcome {
        if stop.wait_timeout(duration) {
            WaitOutcome::Cancelled
        } else {
            WaitOutcome::Elapsed
        }
    }
}

/// Clock that returns immediately and records each requested wait.
///
/// `cancel_after` stops the run when that many waits have been requested,
/// modelling a cancellation that lands during an in-flight wait.
#[derive(Debug, Clone, Default)]
pub struct RecordingClock {
    pub waits: Vec<Duration>,
    pub cancel_after: Option<usize>,
}

impl RecordingClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn cancelling_after(waits: usize) -> Self {
        Self {
            waits: Vec::new(),
            cancel_after: Some(waits),
        }
    }

    #[must_use]
    pub fn waits_ms(&self) -> Vec<u128> {
        self.waits.iter().map(Duration::as_millis).collect()
    }
}

impl FrameClock for RecordingClock {
    fn wait(&mut self, duration: Duration, stop: &StopHandle) -> WaitOutcome {
        if stop.is_stopped() {
            return WaitOutcome::Cancelled;
        }
        self.waits.push(duration);
        if self.cancel_after.is_some_and(|limit| self.waits.len() >= limit) {
            stop.stop();
            return WaitOutcome::Cancelled;
        }
        WaitOutcome::Elapsed
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use super::{FrameClock, StopHandle, ThreadClock, WaitOutcome};

    #[test]
    fn stop_interrupts_thread_clock_wait() {
        let stop = StopHandle::new();
        let remote = stop.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.stop();
        });

        let started = Instant::now();
        let outcome = ThreadClock.wait(Duration::from_secs(30), &stop);
        handle.join().expect("join stopper");

        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn thread_clock_elapses_without_stop() {
        let stop = StopHandle::new();
        let outcome = ThreadClock.wait(Duration::from_millis(1), &stop);
        assert_eq!(outcome, WaitOutcome::Elapsed);
        assert!(!stop.is_stopped());
    }
}
