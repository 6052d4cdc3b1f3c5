use std::time::{Duration, Instant};

/// Gates a repeated event (e.g. a malformed-input warning) to at most once
/// per `window`, folding however many occurrences were suppressed into the
/// count reported on the next allowed log.
#[derive(Debug, Clone)]
pub struct RateLimitedCounter {
    window: Duration,
    last_logged: Option<Instant>,
    since_last_log: u64,
    total: u64,
}

impl RateLimitedCounter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_logged: None,
            since_last_log: 0,
            total: 0,
        }
    }

    /// Records one occurrence at `now`. Returns the count accumulated since
    /// the last allowed log (including this one) if `window` has elapsed
    /// since then, `None` if this occurrence should stay silent.
    pub fn record(&mut self, now: Instant) -> Option<u64> {
        self.total += 1;
        self.since_last_log += 1;

        let should_log = match self.last_logged {
            None => true,
            Some(last) => now.duration_since(last) >= self.window,
        };
        if !should_log {
            return None;
        }
        self.last_logged = Some(now);
        Some(std::mem::take(&mut self.since_last_log))
    }

    /// Total occurrences recorded, logged or not.
    pub fn total(&self) -> u64 {
        self.total
    }
}
