//! Debounced redraw requests from background tasks.
//!
//! Background work never touches page state or the output buffer. All it
//! can do is call [`Notifier::notify`]; the driver polls
//! [`Notifier::should_refresh`] once per tick and redraws when a request
//! has been quiet for the debounce window. A burst of notifies inside one
//! window therefore yields exactly one redraw.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Clonable handle for requesting a redraw.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl Notifier {
    /// Create a notifier with no request recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a redraw request now.
    ///
    /// Each call restarts the quiet window. A task that notifies more often
    /// than once per window starves the driver of refreshes until it stops,
    /// so streaming producers should throttle to at most one notify per
    /// window.
    pub fn notify(&self) {
        self.notify_at(Instant::now());
    }

    /// Record a redraw request at `now`.
    pub fn notify_at(&self, now: Instant) {
        *self.lock() = Some(now);
    }

    /// Test-and-clear: `true` iff a request is recorded and at least
    /// `window` has passed since it. A `true` result clears the request.
    pub fn should_refresh(&self, window: Duration) -> bool {
        self.should_refresh_at(Instant::now(), window)
    }

    /// [`Notifier::should_refresh`] against an explicit clock reading.
    pub fn should_refresh_at(&self, now: Instant, window: Duration) -> bool {
        let mut last = self.lock();
        match *last {
            Some(at) if now.saturating_duration_since(at) >= window => {
                *last = None;
                true
            }
            _ => false,
        }
    }

    /// Whether a request is waiting.
    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        // A poisoned marker is still just a timestamp.
        self.last_request.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const WINDOW: Duration = Duration::from_millis(50);

    #[test]
    fn test_nothing_pending() {
        let notifier = Notifier::new();
        assert!(!notifier.should_refresh(Duration::ZERO));
    }

    #[test]
    fn test_burst_yields_one_refresh() {
        let notifier = Notifier::new();
        let start = Instant::now();
        for i in 0..10 {
            notifier.notify_at(start + Duration::from_millis(i));
        }

        // Still inside the window of the last request
        assert!(!notifier.should_refresh_at(start + Duration::from_millis(20), WINDOW));

        let later = start + Duration::from_millis(100);
        assert!(notifier.should_refresh_at(later, WINDOW));
        assert!(!notifier.should_refresh_at(later, WINDOW));
        assert!(!notifier.is_pending());
    }

    #[test]
    fn test_steady_stream_defers_refresh_until_quiet() {
        let notifier = Notifier::new();
        let start = Instant::now();
        for i in 0..20u64 {
            let now = start + Duration::from_millis(i * 10);
            notifier.notify_at(now);
            assert!(!notifier.should_refresh_at(now, WINDOW));
        }

        // Throttled to one per window, each notify gets its own refresh.
        let quiet = start + Duration::from_millis(190) + WINDOW;
        assert!(notifier.should_refresh_at(quiet, WINDOW));
        notifier.notify_at(quiet);
        assert!(notifier.should_refresh_at(quiet + WINDOW, WINDOW));
    }

    #[test]
    fn test_notify_from_threads() {
        let notifier = Notifier::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let n = notifier.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        n.notify();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let later = Instant::now() + WINDOW;
        assert!(notifier.should_refresh_at(later, WINDOW));
        assert!(!notifier.should_refresh_at(later, WINDOW));
    }
}
