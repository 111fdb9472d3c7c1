use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Length of the rolling window used by [`RateLimiter::per_minute`].
pub const MINUTE: Duration = Duration::from_secs(60);

/// A blocking rolling-window rate limiter.
///
/// At most `max_per_window` acquisitions are granted within any `window`-long span. Callers
/// are served strictly in arrival order: each caller takes a ticket and waits until every
/// earlier ticket has been granted and the window has room.
pub struct RateLimiter {
    max_per_window: usize,
    window: Duration,
    state: Mutex<WindowState>,
    cv: Condvar,
}

struct WindowState {
    /// Grant times still inside the window, oldest first.
    granted: VecDeque<Instant>,
    next_ticket: u64,
    now_serving: u64,
}

impl RateLimiter {
    /// Create a limiter granting `max_per_window` acquisitions per rolling `window`.
    ///
    /// A `max_per_window` of zero is treated as one.
    pub fn new(max_per_window: usize, window: Duration) -> Self {
        Self {
            max_per_window: max_per_window.max(1),
            window,
            state: Mutex::new(WindowState {
                granted: VecDeque::new(),
                next_ticket: 0,
                now_serving: 0,
            }),
            cv: Condvar::new(),
        }
    }

    /// Create a limiter granting `max_requests` acquisitions per rolling minute.
    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, MINUTE)
    }

    /// Configured ceiling per window.
    pub fn max_per_window(&self) -> usize {
        self.max_per_window
    }

    /// Acquire one slot, blocking until available.
    ///
    /// Returns the time spent waiting (zero if no wait was required).
    pub fn acquire(&self) -> Duration {
        let start = Instant::now();
        let mut waited = false;

        let mut g = self.lock();
        let ticket = g.next_ticket;
        g.next_ticket += 1;

        loop {
            if g.now_serving != ticket {
                waited = true;
                g = self.cv.wait(g).unwrap_or_else(PoisonError::into_inner);
                continue;
            }

            let now = Instant::now();
            while g
                .granted
                .front()
                .is_some_and(|&t| now.duration_since(t) >= self.window)
            {
                g.granted.pop_front();
            }

            if g.granted.len() < self.max_per_window {
                g.granted.push_back(now);
                g.now_serving += 1;
                self.cv.notify_all();
                break;
            }

            // Full: sleep until the oldest grant leaves the window.
            let oldest = g.granted.front().copied().unwrap_or(now);
            let until_free = (oldest + self.window).saturating_duration_since(now);
            waited = true;
            g = self
                .cv
                .wait_timeout(g, until_free)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        if waited { start.elapsed() } else { Duration::ZERO }
    }

    /// Number of grants currently inside the window.
    pub fn in_window(&self) -> usize {
        let mut g = self.lock();
        let now = Instant::now();
        while g
            .granted
            .front()
            .is_some_and(|&t| now.duration_since(t) >= self.window)
        {
            g.granted.pop_front();
        }
        g.granted.len()
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_per_window", &self.max_per_window)
            .field("window", &self.window)
            .finish()
    }
}
